//! CLI error type and exit codes.

use papervisor_core::{PlayerError, ServerError, SettingsError, UpdateError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Core(String),

    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Process error: {0}")]
    Process(String),

    /// Another update holds the lock.
    #[error("{0}")]
    Busy(String),
}

impl CliError {
    /// Exit code following sysexits.h where a category fits.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Database(_) => 73, // EX_CANTCREAT
            Self::Process(_) => 71,  // EX_OSERR
            Self::Busy(_) => 75,     // EX_TEMPFAIL
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<ServerError> for CliError {
    fn from(err: ServerError) -> Self {
        Self::Process(err.to_string())
    }
}

impl From<UpdateError> for CliError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::InProgress => Self::Busy(err.to_string()),
            UpdateError::Server(e) => e.into(),
            UpdateError::Io(_) | UpdateError::Hash(_) => Self::Io(err.to_string()),
            other => Self::Core(other.to_string()),
        }
    }
}

impl From<PlayerError> for CliError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::InvalidName(_) => Self::Arguments(err.to_string()),
            PlayerError::Server(e) => e.into(),
            PlayerError::Repository(e) => Self::Database(e.to_string()),
            PlayerError::Io { .. } => Self::Io(err.to_string()),
            other => Self::Core(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
