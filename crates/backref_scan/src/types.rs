//! Core types shared by the scan engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Object kinds
// ============================================================================

/// Runtime kind of a candidate, as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type_name", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Structural asset (prefab / game object hierarchy)
    Prefab,
    /// Data asset (scriptable object)
    DataAsset,
    /// Component living in an open scene
    SceneComponent,
    /// Anything else; carries the host's type name for diagnostics
    Other(String),
}

impl ObjectKind {
    /// Bucket a hit of this kind is recorded into, if any
    pub fn bucket(&self) -> Option<ResultBucket> {
        match self {
            ObjectKind::Prefab => Some(ResultBucket::Prefabs),
            ObjectKind::DataAsset => Some(ResultBucket::DataAssets),
            ObjectKind::SceneComponent => Some(ResultBucket::SceneReferences),
            ObjectKind::Other(_) => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Prefab => write!(f, "Prefab"),
            ObjectKind::DataAsset => write!(f, "DataAsset"),
            ObjectKind::SceneComponent => write!(f, "SceneComponent"),
            ObjectKind::Other(name) => write!(f, "{}", name),
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Result category of a confirmed reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultBucket {
    Prefabs,
    DataAssets,
    SceneReferences,
}

impl ResultBucket {
    pub const ALL: [ResultBucket; 3] = [
        ResultBucket::Prefabs,
        ResultBucket::DataAssets,
        ResultBucket::SceneReferences,
    ];

    /// Heading used by presentation layers
    pub fn title(self) -> &'static str {
        match self {
            ResultBucket::Prefabs => "Prefab References",
            ResultBucket::DataAssets => "Scriptable Object References",
            ResultBucket::SceneReferences => "Scene References",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ResultBucket::Prefabs => 0,
            ResultBucket::DataAssets => 1,
            ResultBucket::SceneReferences => 2,
        }
    }
}

/// A candidate found to reference at least one target
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceHit<H> {
    pub handle: H,
    pub name: String,
    pub kind: ObjectKind,
    pub discovered_at: DateTime<Utc>,
}

// ============================================================================
// Scheduling
// ============================================================================

/// Which corpus the scheduler is walking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanPhase {
    ScanningAssets,
    ScanningLive,
}

impl ScanPhase {
    pub fn description(self) -> &'static str {
        match self {
            ScanPhase::ScanningAssets => "Finding Asset References...",
            ScanPhase::ScanningLive => "Finding Scene References...",
        }
    }
}

/// Outcome of one `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Budget ran out; call again to resume
    Continuing,
    /// Both phases are exhausted
    Done,
}
