//! Backref Scan - Incremental Reference Scanning
//!
//! Given a set of target objects, finds every asset file and live instance that
//! references one of them. The scan is cooperative: the host calls
//! [`ScanSession::tick`] from its own update loop and each call does at most one
//! frame budget of work.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌───────────────┐
//! │   Corpus    │     │  Scheduler  │     │    Probe    │     │  Aggregator   │
//! │ (assets +   │────▶│ (outer x    │────▶│ (asset deps │────▶│ (3 buckets,   │
//! │  live snap) │     │  inner loop)│     │  / fields)  │     │  dedup)       │
//! └─────────────┘     └─────────────┘     └─────────────┘     └───────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Host**: the object model being scanned, see [`host`]
//! - **Session**: one in-flight scan and its results, see [`ScanSession`]
//! - **Tick**: one host callback, bounded by `frame_budget_ms`

pub mod aggregator;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod error;
pub mod host;
pub mod memory;
pub mod probe;
pub mod scheduler;
pub mod session;
pub mod types;

// Re-exports for convenience
pub use aggregator::{RecordOutcome, ResultAggregator};
pub use config::ScanConfig;
pub use corpus::{AssetEnumeration, Corpus, WalkFailure};
pub use driver::{drive, CancelToken, DriveOutcome};
pub use error::{BackrefError, Result};
pub use host::{CorpusProvider, DependencyIntrospector, Host, ObjectModel};
pub use memory::{MemoryHost, ObjectId};
pub use scheduler::{ScanScheduler, ScanStats};
pub use session::{Resumable, ScanEvent, ScanSession, TickOutcome};
pub use types::{ObjectKind, ReferenceHit, ResultBucket, ScanPhase, ScanStatus};
