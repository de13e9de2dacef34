//! Types describing one self-update of the server binary.

use serde::{Deserialize, Serialize};

/// The build chosen for an update. Lives for one update operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateArtifact {
    /// Game version the build targets, e.g. `1.21.1`.
    pub version: String,
    pub build: u32,
    /// File name the registry serves the binary under.
    pub filename: String,
    /// Expected SHA-256 of the binary, lowercase hex.
    pub sha256: String,
}

/// Successful outcome of an update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// The active binary already matches the latest build.
    UpToDate { build: u32 },
    /// The binary was replaced and the server restarted.
    Updated { build: u32, filename: String },
}
