//! Corpus enumeration
//!
//! Builds the two candidate sequences of a session: asset files under the
//! configured root and a snapshot of the host's live instances. Both are taken
//! once at `start_scan` and never refreshed while the scan runs.

use crate::config::ScanConfig;
use crate::host::CorpusProvider;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A directory or file the asset walk could not read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkFailure {
    pub path: String,
    pub message: String,
}

/// Result of walking the asset root
#[derive(Debug, Default)]
pub struct AssetEnumeration {
    /// Matching files, each exactly once
    pub paths: Vec<PathBuf>,
    /// Subtrees that were skipped
    pub failures: Vec<WalkFailure>,
}

/// Walk `root` recursively and collect every file whose name ends with one of
/// `extensions`.
///
/// Unreadable directories are logged and skipped; the walk continues with the
/// rest of the tree.
pub fn enumerate_asset_candidates(
    root: &Path,
    extensions: &[String],
    follow_symlinks: bool,
) -> AssetEnumeration {
    let mut result = AssetEnumeration::default();

    let walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                warn!(path = %path, error = %e, "Skipping unreadable directory");
                result.failures.push(WalkFailure {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            result.paths.push(entry.into_path());
        }
    }

    debug!(
        root = %root.display(),
        files = result.paths.len(),
        failures = result.failures.len(),
        "Asset enumeration complete"
    );
    result
}

/// Point-in-time snapshot of the host's live instances
pub fn enumerate_live_candidates<H: CorpusProvider>(host: &H) -> Vec<H::Handle> {
    host.live_instances()
}

/// Both candidate sequences of one session
#[derive(Debug)]
pub struct Corpus<Handle> {
    pub assets: Vec<PathBuf>,
    pub live: Vec<Handle>,
    pub failures: Vec<WalkFailure>,
}

impl<Handle> Default for Corpus<Handle> {
    fn default() -> Self {
        Self {
            assets: Vec::new(),
            live: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<Handle> Corpus<Handle> {
    /// Enumerate both corpora for a new session
    pub fn snapshot<H>(host: &H, config: &ScanConfig) -> Self
    where
        H: CorpusProvider<Handle = Handle>,
    {
        let assets =
            enumerate_asset_candidates(&config.root_dir, &config.extensions, config.follow_symlinks);
        let live = enumerate_live_candidates(host);
        Self {
            assets: assets.paths,
            live,
            failures: assets.failures,
        }
    }
}
