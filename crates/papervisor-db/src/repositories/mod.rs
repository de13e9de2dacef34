//! Repository implementations using `SQLite`.
//!
//! The `SqlitePool` is confined to this module and never exposed through
//! the port trait signatures.

mod sqlite_rejected_player_repository;

pub use sqlite_rejected_player_repository::{REJECTED_LIST_LIMIT, SqliteRejectedPlayerRepository};
