//! `SQLite` persistence for papervisor.

pub mod repositories;
pub mod setup;

pub use repositories::{REJECTED_LIST_LIMIT, SqliteRejectedPlayerRepository};

// Re-export setup functions for convenient access
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;

// Linked for its bundled SQLite build.
use libsqlite3_sys as _;
