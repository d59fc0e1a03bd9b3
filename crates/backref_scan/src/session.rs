//! Scan session
//!
//! A [`ScanSession`] owns the host and at most one in-flight scan. The
//! presentation layer calls [`ScanSession::start_scan`] and then lets its own
//! update loop call [`ScanSession::tick`]; between ticks every observable
//! (progress, phase, buckets) can be read.
//!
//! Starting a new scan tears the previous one down first. Results of two scans
//! are never merged.

use crate::config::ScanConfig;
use crate::corpus::{Corpus, WalkFailure};
use crate::host::{Host, ObjectModel};
use crate::scheduler::{ScanScheduler, ScanStats};
use crate::types::{ReferenceHit, ResultBucket, ScanPhase, ScanStatus};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// A task that can be advanced in bounded slices
pub trait Resumable {
    /// Do at most `budget` worth of work (at least one step) and report
    /// whether more remains.
    fn advance(&mut self, budget: Duration) -> ScanStatus;
}

/// Notification pushed to the listener
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A tick ended with work remaining
    Progress {
        generation: u64,
        phase: ScanPhase,
        fraction: f32,
    },
    /// The scan finished; fired once, on the last tick
    Completed { generation: u64, hits: usize },
}

/// Result of one host tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No scan is registered for ticks
    Idle,
    Continuing,
    Completed,
}

type Listener = Box<dyn FnMut(&ScanEvent)>;

/// One reference scan and its observable state
pub struct ScanSession<H: Host> {
    host: H,
    config: ScanConfig,
    scheduler: Option<ScanScheduler<H::Handle>>,
    subscribed: bool,
    generation: u64,
    listener: Option<Listener>,
}

impl<H: Host> fmt::Debug for ScanSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("config", &self.config)
            .field("running", &self.subscribed)
            .field("generation", &self.generation)
            .field("progress", &self.progress())
            .finish()
    }
}

impl<H: Host> ScanSession<H> {
    pub fn new(host: H, config: ScanConfig) -> Self {
        Self {
            host,
            config,
            scheduler: None,
            subscribed: false,
            generation: 0,
            listener: None,
        }
    }

    /// Receive one event per tick
    pub fn set_listener(&mut self, listener: impl FnMut(&ScanEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Start looking for references to `targets`.
    ///
    /// Any scan in flight is torn down first. Both corpora are snapshotted
    /// here; instances created later are not seen by this scan.
    pub fn start_scan(&mut self, targets: Vec<H::Handle>) -> crate::Result<()> {
        if targets.is_empty() {
            return Err(crate::BackrefError::NoTargets);
        }

        if self.subscribed {
            info!(generation = self.generation, "Cancelling in-flight scan before restart");
            self.subscribed = false;
        }
        self.scheduler = None;

        let corpus = Corpus::snapshot(&self.host, &self.config);
        info!(
            targets = targets.len(),
            assets = corpus.assets.len(),
            live = corpus.live.len(),
            root = %self.config.root_dir.display(),
            "Starting reference scan"
        );

        self.scheduler = Some(ScanScheduler::new(targets, corpus)?);
        self.generation += 1;
        self.subscribed = true;
        Ok(())
    }

    /// Start a new scan whose only target is a previously found candidate
    pub fn rescan_from(&mut self, hit: &ReferenceHit<H::Handle>) -> crate::Result<()> {
        if !self.host.is_alive(&hit.handle) {
            return Err(crate::BackrefError::InvalidState(format!(
                "{} no longer exists",
                hit.name
            )));
        }
        self.start_scan(vec![hit.handle.clone()])
    }

    /// Stop ticking. Results found so far stay readable; no completion event
    /// is sent.
    pub fn cancel(&mut self) {
        if self.subscribed {
            debug!(generation = self.generation, progress = self.progress(), "Scan cancelled");
        }
        self.subscribed = false;
    }

    /// One host update: advance by the configured frame budget
    pub fn tick(&mut self) -> TickOutcome {
        if !self.subscribed {
            return TickOutcome::Idle;
        }
        match self.advance(self.config.frame_budget()) {
            ScanStatus::Continuing => TickOutcome::Continuing,
            ScanStatus::Done => TickOutcome::Completed,
        }
    }

    fn emit(&mut self, event: ScanEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }

    // === Observables ===

    pub fn is_running(&self) -> bool {
        self.subscribed
    }

    pub fn progress(&self) -> f32 {
        self.scheduler.as_ref().map_or(0.0, |s| s.progress())
    }

    pub fn phase(&self) -> Option<ScanPhase> {
        self.scheduler.as_ref().map(|s| s.phase())
    }

    /// Text for a progress bar, empty when no scan has run
    pub fn phase_description(&self) -> &'static str {
        self.phase().map_or("", |p| p.description())
    }

    /// Counter incremented by every `start_scan`
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn targets(&self) -> &[H::Handle] {
        self.scheduler.as_ref().map(|s| s.targets()).unwrap_or(&[])
    }

    pub fn bucket(&self, bucket: ResultBucket) -> &[ReferenceHit<H::Handle>] {
        self.scheduler
            .as_ref()
            .map(|s| s.results().bucket(bucket))
            .unwrap_or(&[])
    }

    pub fn prefabs(&self) -> &[ReferenceHit<H::Handle>] {
        self.bucket(ResultBucket::Prefabs)
    }

    pub fn data_assets(&self) -> &[ReferenceHit<H::Handle>] {
        self.bucket(ResultBucket::DataAssets)
    }

    pub fn scene_references(&self) -> &[ReferenceHit<H::Handle>] {
        self.bucket(ResultBucket::SceneReferences)
    }

    pub fn stats(&self) -> Option<&ScanStats> {
        self.scheduler.as_ref().map(|s| s.stats())
    }

    /// Directories the asset walk had to skip
    pub fn enumeration_failures(&self) -> &[WalkFailure] {
        self.scheduler.as_ref().map(|s| s.failures()).unwrap_or(&[])
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: Host> Resumable for ScanSession<H> {
    fn advance(&mut self, budget: Duration) -> ScanStatus {
        if !self.subscribed {
            return ScanStatus::Done;
        }
        let Some(scheduler) = self.scheduler.as_mut() else {
            self.subscribed = false;
            return ScanStatus::Done;
        };

        let status = scheduler.advance(&self.host, budget);
        let event = match status {
            ScanStatus::Continuing => ScanEvent::Progress {
                generation: self.generation,
                phase: scheduler.phase(),
                fraction: scheduler.progress(),
            },
            ScanStatus::Done => {
                self.subscribed = false;
                ScanEvent::Completed {
                    generation: self.generation,
                    hits: scheduler.results().total(),
                }
            }
        };
        self.emit(event);
        status
    }
}
