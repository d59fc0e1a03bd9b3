//! Shared logging utilities for Backref binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "backref=info,backref_scan=info";

/// Logging configuration shared by Backref binaries.
#[derive(Debug, Clone)]
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the full filter to stderr instead of warnings only
    pub verbose: bool,
    /// Directory for the daily log file; `None` disables file logging
    pub log_dir: Option<PathBuf>,
}

/// Keeps the background log writer alive; drop it last.
#[derive(Debug, Default)]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize tracing with an optional daily file writer and stderr output.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogGuard> {
    let filter = base_filter();

    let mut guard = LogGuard::default();
    let file_layer = match &config.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
            let appender =
                tracing_appender::rolling::daily(dir, format!("{}.log", sanitize_name(config.app_name)));
            let (writer, file_guard) = tracing_appender::non_blocking(appender);
            guard._file = Some(file_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(filter.clone()),
            )
        }
        None => None,
    };

    let console_filter = if config.verbose {
        filter
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn base_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Get the Backref home directory: ~/.backref
pub fn backref_home() -> Option<PathBuf> {
    if let Ok(override_path) = std::env::var("BACKREF_HOME") {
        return Some(PathBuf::from(override_path));
    }
    dirs::home_dir().map(|h| h.join(".backref"))
}

/// Get the logs directory: ~/.backref/logs
pub fn logs_dir() -> Option<PathBuf> {
    backref_home().map(|h| h.join("logs"))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
