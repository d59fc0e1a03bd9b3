//! Scan orchestration for a project on disk

use crate::error::Result;
use crate::project::ProjectHost;
use crate::report::ScanReport;
use backref_scan::{drive, CancelToken, DriveOutcome, ScanConfig, ScanEvent, ScanSession};
use std::path::PathBuf;
use tracing::{info, warn};

/// What to scan for and where
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub config: ScanConfig,
    /// Scenes whose components are probed as live instances
    pub scenes: Vec<PathBuf>,
    /// Asset paths or `SCENE#FILE_ID` specs
    pub targets: Vec<String>,
}

/// Open the project, load scenes, resolve targets and register the scan
pub fn start_session(request: &ScanRequest) -> Result<ScanSession<ProjectHost>> {
    request.config.validate()?;

    let mut host = ProjectHost::open(&request.config.root_dir)?;
    for scene in &request.scenes {
        host.open_scene(scene)?;
    }

    let targets = request
        .targets
        .iter()
        .map(|t| host.resolve_target(t))
        .collect::<Result<Vec<_>>>()?;

    let mut session = ScanSession::new(host, request.config.clone());
    session.start_scan(targets)?;
    Ok(session)
}

/// Run a scan to completion or cancellation on the calling thread
pub fn run_scan(
    request: &ScanRequest,
    cancel: &CancelToken,
    listener: Option<Box<dyn FnMut(&ScanEvent)>>,
) -> Result<ScanReport> {
    let mut session = start_session(request)?;
    if let Some(listener) = listener {
        session.set_listener(listener);
    }

    let outcome = drive(&mut session, cancel);
    let cancelled = match outcome {
        DriveOutcome::Completed => false,
        DriveOutcome::Cancelled => {
            warn!("Scan cancelled before completion");
            true
        }
        DriveOutcome::NotRunning => {
            warn!("Scan was not running");
            false
        }
    };

    let report = ScanReport::from_session(&session, cancelled);
    info!(
        hits = report.total(),
        cancelled = report.cancelled,
        "Scan finished"
    );
    Ok(report)
}
