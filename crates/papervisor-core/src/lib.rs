//! Core of papervisor: domain types, console log parsing, the ports the
//! runtime and adapters implement, and the update and player services.
//!
//! This crate has no process, database or HTTP code.

pub mod domain;
pub mod log_parser;
pub mod ports;
pub mod services;
pub mod settings;
pub mod utils;

// Re-export commonly used types for convenience
pub use domain::{
    HEADLESS_FLAG, LaunchSpec, OnlinePlayer, PlayerFileEntry, PlayerList, RejectedPlayer,
    ServerStatus, UpdateArtifact, UpdateOutcome, Vitals,
};
pub use log_parser::{LogEvent, parse_line, strip_control_sequences};
pub use ports::{
    BinaryFetcher, BuildMetadataSource, ConsoleSink, FetchError, IdentityResolver, LookupError,
    RejectedPlayerRepository, RepositoryError, ServerController, ServerError,
};
pub use services::{PlayerError, PlayerService, UpdateError, UpdatePipeline, Whitelisted};
pub use settings::{Settings, SettingsError, validate_settings};
pub use utils::file_sha256;

