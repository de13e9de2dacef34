//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx`, `reqwest` or process types in any signature
//! - Traits are minimal and intent-based
//! - Every async port is mockable behind the `test-utils` feature

pub mod build_metadata;
pub mod console_sink;
pub mod identity;
pub mod rejected_players;
pub mod server_controller;

use thiserror::Error;

pub use build_metadata::{BinaryFetcher, BuildMetadataSource};
pub use console_sink::ConsoleSink;
pub use identity::IdentityResolver;
pub use rejected_players::RejectedPlayerRepository;
pub use server_controller::ServerController;

#[cfg(any(test, feature = "test-utils"))]
pub use build_metadata::{MockBinaryFetcher, MockBuildMetadataSource};
#[cfg(any(test, feature = "test-utils"))]
pub use identity::MockIdentityResolver;
#[cfg(any(test, feature = "test-utils"))]
pub use rejected_players::MockRejectedPlayerRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use server_controller::MockServerController;

/// Errors raised by the process supervisor.
///
/// The state errors (`AlreadyRunning`, `AlreadyStopped`, `NotRunning`) are
/// recoverable and meant to be shown to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    #[error("Server is already running")]
    AlreadyRunning,

    #[error("Server is already stopped")]
    AlreadyStopped,

    #[error("Server is not running")]
    NotRunning,

    #[error("Input pipe is not attached")]
    NoInputPipe,

    /// The process could not be spawned.
    #[error("Failed to spawn server process: {0}")]
    Spawn(String),

    /// The child was spawned without one of its pipes.
    #[error("Failed to attach {0} pipe")]
    PipeUnavailable(&'static str),

    /// Writing to the console pipe failed.
    #[error("Console I/O error: {0}")]
    Io(String),

    /// The console write did not complete in time.
    #[error("Console write timed out after {0}s")]
    CommandTimedOut(u64),

    /// Waiting for the process to exit failed or it exited unsuccessfully.
    #[error("Server exited abnormally: {0}")]
    Wait(String),

    /// The process ignored the stop command and was killed.
    #[error("Server did not stop within {0}s and was killed")]
    StopTimedOut(u64),
}

/// Errors from persistent stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors from upstream lookups (identity services, build metadata).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The upstream service has no such entry.
    #[error("{0} not found")]
    NotFound(String),

    /// The upstream service could not be reached or answered non-OK.
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// The upstream answered with a body we could not understand.
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

/// Errors from downloading a server binary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Download request failed: {0}")]
    Request(String),

    #[error("Download failed with HTTP status {0}")]
    Status(u16),

    #[error("Failed to write download: {0}")]
    Io(String),
}
