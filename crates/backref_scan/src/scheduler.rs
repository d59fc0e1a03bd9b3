//! Time-sliced scan scheduler
//!
//! Drives the nested candidate x target loop over both corpora, assets first,
//! then live instances. Each call to [`ScanScheduler::advance`] resumes at the
//! saved `(outer, inner)` cursor and runs until its budget has elapsed or the
//! whole scan is done. The budget is only checked between pairs, and every call
//! visits at least one pair, so any budget makes progress.
//!
//! # Design
//!
//! - Asset paths are loaded lazily when the outer cursor reaches them; the
//!   loaded dependency set is kept until the inner loop over targets finishes,
//!   even across calls.
//! - Moving from assets to live instances happens inside the same call.
//! - Results depend only on the targets and the corpus snapshot, never on the
//!   budget.

use crate::aggregator::{RecordOutcome, ResultAggregator};
use crate::corpus::{Corpus, WalkFailure};
use crate::host::Host;
use crate::probe::{probe_live, DependencySet};
use crate::types::{ScanPhase, ScanStatus};
use serde::Serialize;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Counters for one scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    /// Asset files in the snapshot
    pub assets_total: usize,
    /// Live instances in the snapshot
    pub live_total: usize,
    /// (candidate, target) pairs handed to a probe
    pub pairs_probed: u64,
    /// Candidates that failed to load or were destroyed before being probed
    pub candidates_skipped: u64,
    /// Distinct candidates recorded
    pub hits: u64,
    /// Hits dropped because their kind matches no bucket
    pub unrecognized: u64,
    /// Number of `advance` calls that did work
    pub advances: u64,
    /// Wall-clock time spent inside `advance`
    pub busy_time: Duration,
}

/// Loaded state of the asset under the outer cursor
#[derive(Debug)]
enum LoadedAsset<Handle> {
    Missing,
    Loaded(DependencySet<Handle>),
}

/// Resumable nested-loop scan over one corpus snapshot
#[derive(Debug)]
pub struct ScanScheduler<Handle> {
    targets: Vec<Handle>,
    corpus: Corpus<Handle>,
    phase: ScanPhase,
    outer: usize,
    inner: usize,
    current_asset: Option<LoadedAsset<Handle>>,
    results: ResultAggregator<Handle>,
    complete: bool,
    stats: ScanStats,
}

impl<Handle> ScanScheduler<Handle>
where
    Handle: Clone + Eq + Hash + std::fmt::Debug,
{
    /// Create a scheduler positioned at the first asset.
    ///
    /// Fails if `targets` is empty.
    pub fn new(targets: Vec<Handle>, corpus: Corpus<Handle>) -> crate::Result<Self> {
        if targets.is_empty() {
            return Err(crate::BackrefError::NoTargets);
        }
        let stats = ScanStats {
            assets_total: corpus.assets.len(),
            live_total: corpus.live.len(),
            ..Default::default()
        };
        Ok(Self {
            targets,
            corpus,
            phase: ScanPhase::ScanningAssets,
            outer: 0,
            inner: 0,
            current_asset: None,
            results: ResultAggregator::new(),
            complete: false,
            stats,
        })
    }

    /// Run the nested loop until `budget` has elapsed or the scan is done
    pub fn advance<H>(&mut self, host: &H, budget: Duration) -> ScanStatus
    where
        H: Host<Handle = Handle>,
    {
        if self.complete {
            return ScanStatus::Done;
        }

        let started = Instant::now();
        self.stats.advances += 1;
        let mut visited = false;

        let status = loop {
            if self.outer >= self.phase_len() {
                match self.phase {
                    ScanPhase::ScanningAssets => {
                        debug!(
                            assets = self.corpus.assets.len(),
                            hits = self.results.total(),
                            "Asset phase complete"
                        );
                        self.phase = ScanPhase::ScanningLive;
                        self.outer = 0;
                        self.inner = 0;
                        self.current_asset = None;
                        continue;
                    }
                    ScanPhase::ScanningLive => {
                        self.complete = true;
                        break ScanStatus::Done;
                    }
                }
            }

            if visited && started.elapsed() >= budget {
                break ScanStatus::Continuing;
            }

            self.step(host);
            visited = true;
        };

        self.stats.busy_time += started.elapsed();
        if status == ScanStatus::Done {
            info!(
                targets = self.targets.len(),
                assets = self.stats.assets_total,
                live = self.stats.live_total,
                pairs = self.stats.pairs_probed,
                hits = self.stats.hits,
                skipped = self.stats.candidates_skipped,
                advances = self.stats.advances,
                busy_ms = self.stats.busy_time.as_millis() as u64,
                "Reference scan complete"
            );
        }
        status
    }

    /// Visit the pair under the cursor and move the cursor forward
    fn step<H>(&mut self, host: &H)
    where
        H: Host<Handle = Handle>,
    {
        let hit = match self.phase {
            ScanPhase::ScanningAssets => {
                if self.current_asset.is_none() {
                    self.current_asset = Some(self.load_current_asset(host));
                }
                let loaded = match &self.current_asset {
                    Some(LoadedAsset::Loaded(set)) if host.is_alive(set.candidate()) => Some(set),
                    _ => None,
                };
                let Some(set) = loaded else {
                    self.stats.candidates_skipped += 1;
                    self.next_candidate();
                    return;
                };
                self.stats.pairs_probed += 1;
                let target = &self.targets[self.inner];
                set.references(host, target).then(|| set.candidate().clone())
            }
            ScanPhase::ScanningLive => {
                let candidate = &self.corpus.live[self.outer];
                if !host.is_alive(candidate) {
                    debug!(candidate = ?candidate, "Skipping destroyed live instance");
                    self.stats.candidates_skipped += 1;
                    self.next_candidate();
                    return;
                }
                self.stats.pairs_probed += 1;
                let target = &self.targets[self.inner];
                probe_live(host, candidate, target).then(|| candidate.clone())
            }
        };

        if let Some(candidate) = hit {
            match self.results.record(host, &candidate) {
                RecordOutcome::Added(_) => self.stats.hits += 1,
                RecordOutcome::Unrecognized(_) => self.stats.unrecognized += 1,
                RecordOutcome::Duplicate(_)
                | RecordOutcome::AlreadyDropped
                | RecordOutcome::Stale => {}
            }
        }

        self.inner += 1;
        if self.inner >= self.targets.len() {
            self.next_candidate();
        }
    }

    fn load_current_asset<H>(&self, host: &H) -> LoadedAsset<Handle>
    where
        H: Host<Handle = Handle>,
    {
        let path = &self.corpus.assets[self.outer];
        match host.load_asset(path) {
            Some(handle) => LoadedAsset::Loaded(DependencySet::collect(host, &handle)),
            None => {
                debug!(path = %path.display(), "Skipping asset that could not be loaded");
                LoadedAsset::Missing
            }
        }
    }

    fn next_candidate(&mut self) {
        self.outer += 1;
        self.inner = 0;
        self.current_asset = None;
    }

    fn phase_len(&self) -> usize {
        match self.phase {
            ScanPhase::ScanningAssets => self.corpus.assets.len(),
            ScanPhase::ScanningLive => self.corpus.live.len(),
        }
    }

    /// Fraction done in `[0, 1]`; assets fill the first half, live instances
    /// the second. Reaches 1.0 only once the scan is complete.
    pub fn progress(&self) -> f32 {
        if self.complete {
            return 1.0;
        }
        let len = self.phase_len();
        let fraction = if len == 0 {
            0.0
        } else {
            self.outer as f32 / len as f32
        };
        let value = match self.phase {
            ScanPhase::ScanningAssets => fraction * 0.5,
            ScanPhase::ScanningLive => 0.5 + fraction * 0.5,
        };
        value.min(1.0 - f32::EPSILON)
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Current `(outer, inner)` position within the phase
    pub fn cursor(&self) -> (usize, usize) {
        (self.outer, self.inner)
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn targets(&self) -> &[Handle] {
        &self.targets
    }

    pub fn results(&self) -> &ResultAggregator<Handle> {
        &self.results
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn failures(&self) -> &[WalkFailure] {
        &self.corpus.failures
    }
}
