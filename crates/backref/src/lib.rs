//! Backref: find everything that references an asset in a text-serialized
//! game project.
//!
//! [`project::ProjectHost`] adapts a project on disk to the host traits of
//! `backref_scan`; [`runner`] wires a host into a time-sliced scan session and
//! [`report`] renders what it found.

pub mod error;
pub mod project;
pub mod report;
pub mod runner;

pub use error::{ProjectError, Result};
pub use project::{ObjectRef, ProjectHost};
pub use report::ScanReport;
pub use runner::{run_scan, start_session, ScanRequest};
