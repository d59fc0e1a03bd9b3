//! Configuration for reference scans

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for a scan session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory walked for asset candidates
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// File name suffixes that make a file an asset candidate
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Wall-clock work allowed per tick, in milliseconds
    #[serde(default = "default_frame_budget_ms")]
    pub frame_budget_ms: u64,

    /// Pause between ticks when the session drives itself
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Whether the asset walk follows symlinks
    #[serde(default)]
    pub follow_symlinks: bool,
}

/// Default asset suffixes: structural assets and data assets
pub const DEFAULT_EXTENSIONS: &[&str] = &[".prefab", ".asset"];

fn default_root_dir() -> PathBuf {
    PathBuf::from("Assets")
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_frame_budget_ms() -> u64 {
    50
}

fn default_tick_interval_ms() -> u64 {
    10
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            extensions: default_extensions(),
            frame_budget_ms: default_frame_budget_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            follow_symlinks: false,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ScanConfig = toml::from_str(&content)
            .map_err(|e| crate::BackrefError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::BackrefError::Config(e.to_string()))
    }

    /// Reject configurations that would make every scan empty
    pub fn validate(&self) -> crate::Result<()> {
        if self.extensions.is_empty() {
            return Err(crate::BackrefError::Config(
                "extensions must not be empty".to_string(),
            ));
        }
        if let Some(ext) = self.extensions.iter().find(|e| e.is_empty()) {
            return Err(crate::BackrefError::Config(format!(
                "invalid extension filter '{}'",
                ext
            )));
        }
        Ok(())
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
