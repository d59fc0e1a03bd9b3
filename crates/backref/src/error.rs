//! Error types for the project host

use backref_scan::BackrefError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error(transparent)]
    Scan(#[from] BackrefError),

    #[error("Not a text-serialized file: {}", .0.display())]
    NotTextSerialized(PathBuf),

    #[error("No asset with a .meta guid at {}", .0.display())]
    UnknownAsset(PathBuf),

    #[error("Scene is not open: {}", .0.display())]
    SceneNotOpen(PathBuf),

    #[error("No object &{file_id} in scene {}", .scene.display())]
    UnknownObject { scene: PathBuf, file_id: i64 },

    #[error("Invalid target '{0}': expected PATH or SCENE#FILE_ID")]
    InvalidTarget(String),
}

pub type Result<T> = std::result::Result<T, ProjectError>;
