//! Controller contract for the supervised server.
//!
//! The production implementation is the runtime supervisor; tests use the
//! mock generated behind `test-utils`. Nothing outside the supervisor may
//! touch the process handle or its pipes directly.

use async_trait::async_trait;

use super::ServerError;
use crate::domain::ServerStatus;

/// Capability set over the supervised server process.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ServerController: Send + Sync {
    /// Spawn the server.
    ///
    /// Returns `Err(ServerError::AlreadyRunning)` if it is already up.
    async fn start(&self) -> Result<(), ServerError>;

    /// Send the shutdown command and wait for the process to exit.
    ///
    /// Returns `Err(ServerError::AlreadyStopped)` if nothing is running.
    /// The state is `Stopped` after this returns, even on error.
    async fn stop(&self) -> Result<(), ServerError>;

    /// Write one console command followed by a newline.
    async fn send_command(&self, command: &str) -> Result<(), ServerError>;

    /// Current lifecycle status. Never waits on the child process.
    async fn status(&self) -> ServerStatus;
}
