//! Error types for the scan engine

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Backref error type
#[derive(Error, Debug)]
pub enum BackrefError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("A scan needs at least one target")]
    NoTargets,

    #[error("Corpus root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BackrefError>;
