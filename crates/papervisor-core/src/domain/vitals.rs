//! Point-in-time resource usage of the supervised server.

use super::{OnlinePlayer, ServerStatus};
use serde::{Deserialize, Serialize};

/// Resource snapshot returned by the vitals monitor.
///
/// Always constructible: when the server is down CPU and memory are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub status: ServerStatus,
    /// CPU usage since the previous sample, in percent of one core.
    pub cpu: f32,
    /// Resident memory in bytes.
    pub ram: u64,
    /// Configured heap ceiling as passed to the JVM, e.g. `2048M`.
    pub total_memory: String,
    pub players: usize,
    pub player_list: Vec<OnlinePlayer>,
}

impl Vitals {
    /// A record with zeroed usage for the given status and roster.
    pub fn idle(
        status: ServerStatus,
        total_memory: impl Into<String>,
        player_list: Vec<OnlinePlayer>,
    ) -> Self {
        Self {
            status,
            cpu: 0.0,
            ram: 0,
            total_memory: total_memory.into(),
            players: player_list.len(),
            player_list,
        }
    }
}
