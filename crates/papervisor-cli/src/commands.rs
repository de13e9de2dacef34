//! Subcommands.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use papervisor_core::PlayerList;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server in the foreground and relay the console
    Run {
        /// Do not start the server until `!start` is entered
        #[arg(long)]
        no_start: bool,
    },

    /// Print the SHA-256 of a file
    Hash {
        file: PathBuf,
    },

    /// Show one of the server's player files
    List {
        #[arg(value_enum)]
        kind: ListKind,
    },

    /// Inspect connections refused by the whitelist
    Rejected {
        #[command(subcommand)]
        command: RejectedCommand,
    },

    /// Print the resolved settings
    Settings,
}

#[derive(Subcommand)]
pub enum RejectedCommand {
    /// List the most recent rejected players
    List,
    /// Forget a rejected player
    Delete { username: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    Whitelist,
    Banned,
    Ops,
}

impl From<ListKind> for PlayerList {
    fn from(kind: ListKind) -> Self {
        match kind {
            ListKind::Whitelist => Self::Whitelist,
            ListKind::Banned => Self::Banned,
            ListKind::Ops => Self::Ops,
        }
    }
}
