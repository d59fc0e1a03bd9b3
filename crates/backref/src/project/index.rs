//! GUID index built from `.meta` sidecar files
//!
//! Every importable file `X` in a project has a sibling `X.meta` whose
//! `guid:` line is the identity other files use to reference `X`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

static META_GUID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^guid: ([0-9a-fA-F]{32})\s*$").expect("valid guid regex"));

const META_SUFFIX: &str = ".meta";

/// Bidirectional map between asset paths and GUIDs
#[derive(Debug, Default)]
pub struct GuidIndex {
    by_guid: HashMap<String, PathBuf>,
    by_path: HashMap<PathBuf, String>,
}

impl GuidIndex {
    /// Walk `root` and read every `.meta` file.
    ///
    /// Unreadable directories and malformed meta files are logged and skipped.
    pub fn build(root: &Path) -> Self {
        let mut index = Self::default();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable path while indexing");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let Some(stem) = name.strip_suffix(META_SUFFIX) else {
                continue;
            };
            let asset_path = entry.path().with_file_name(stem);

            let content = match std::fs::read_to_string(entry.path()) {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Failed to read meta file");
                    continue;
                }
            };
            match parse_meta_guid(&content) {
                Some(guid) => index.insert(asset_path, guid),
                None => debug!(path = %entry.path().display(), "Meta file without guid"),
            }
        }

        debug!(root = %root.display(), entries = index.len(), "GUID index built");
        index
    }

    pub fn insert(&mut self, path: PathBuf, guid: String) {
        if let Some(previous) = self.by_guid.get(&guid) {
            warn!(
                guid = %guid,
                first = %previous.display(),
                second = %path.display(),
                "Duplicate guid, keeping the later file"
            );
        }
        self.by_path.insert(path.clone(), guid.clone());
        self.by_guid.insert(guid, path);
    }

    pub fn path_of(&self, guid: &str) -> Option<&Path> {
        self.by_guid.get(guid).map(|p| p.as_path())
    }

    pub fn guid_of(&self, path: &Path) -> Option<&str> {
        self.by_path.get(path).map(|g| g.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_guid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_guid.is_empty()
    }
}

/// Extract the guid from the contents of a `.meta` file
pub fn parse_meta_guid(content: &str) -> Option<String> {
    META_GUID
        .captures(content)
        .map(|caps| caps[1].to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GUID_A: &str = "0123456789abcdef0123456789abcdef";
    const GUID_B: &str = "fedcba9876543210fedcba9876543210";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_meta_guid() {
        let meta = format!("fileFormatVersion: 2\nguid: {}\nNativeFormatImporter:\n", GUID_A.to_uppercase());
        assert_eq!(parse_meta_guid(&meta).as_deref(), Some(GUID_A));
        assert_eq!(parse_meta_guid("fileFormatVersion: 2\n"), None);
    }

    #[test]
    fn test_build_index() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "Player.prefab", "");
        write(root, "Player.prefab.meta", &format!("guid: {GUID_A}\n"));
        write(root, "Data/Sword.asset", "");
        write(root, "Data/Sword.asset.meta", &format!("guid: {GUID_B}\n"));
        write(root, "Data/Broken.asset.meta", "nothing here\n");

        let index = GuidIndex::build(root);
        assert_eq!(index.len(), 2);
        assert_eq!(index.path_of(GUID_A), Some(root.join("Player.prefab").as_path()));
        assert_eq!(index.guid_of(&root.join("Data/Sword.asset")), Some(GUID_B));
        assert_eq!(index.guid_of(&root.join("Data/Broken.asset")), None);
    }
}
