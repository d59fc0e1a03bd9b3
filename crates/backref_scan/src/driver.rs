//! Self-driven tick loop
//!
//! Hosts without their own update loop (command-line tools, tests) can hand a
//! session to [`drive`], which ticks it on the calling thread with a pause of
//! `tick_interval_ms` between ticks.

use crate::host::Host;
use crate::session::{ScanSession, TickOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, checked between ticks
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// How [`drive`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    Completed,
    Cancelled,
    /// The session had no scan registered
    NotRunning,
}

/// Tick `session` until its scan completes or `cancel` is set
pub fn drive<H: Host>(session: &mut ScanSession<H>, cancel: &CancelToken) -> DriveOutcome {
    let interval = session.config().tick_interval();
    loop {
        if cancel.is_cancelled() {
            session.cancel();
            return DriveOutcome::Cancelled;
        }
        match session.tick() {
            TickOutcome::Idle => return DriveOutcome::NotRunning,
            TickOutcome::Completed => return DriveOutcome::Completed,
            TickOutcome::Continuing => {
                if !interval.is_zero() {
                    std::thread::sleep(interval);
                }
            }
        }
    }
}
