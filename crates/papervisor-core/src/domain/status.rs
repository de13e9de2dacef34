//! Lifecycle status of the supervised server process.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of the supervised server.
///
/// `Starting` only exists while a spawn is being wired up; callers of the
/// supervisor observe `Stopped` or `Running` once a call returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerStatus {
    /// No process is running.
    #[default]
    Stopped,
    /// Process spawned, pipes being attached.
    Starting,
    /// Process is running and accepting console commands.
    Running,
}

impl ServerStatus {
    /// Whether the process is up and its pipes are attached.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Stable string name, also used for serialization.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Starting => "Starting",
            Self::Running => "Running",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
