//! Operator CLI for papervisor.
//!
//! `papervisor run` supervises the server in the foreground and relays the
//! operator's terminal to its console; lines starting with `!` are handled
//! by the supervisor itself (see [`console_commands`]). The remaining
//! subcommands are one-shot maintenance tasks.

#![deny(unsafe_code)]

// Used by the binary target.
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod console_commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliContext, bootstrap};
pub use commands::{Commands, ListKind, RejectedCommand};
pub use error::CliError;
pub use parser::Cli;
