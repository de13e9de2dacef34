//! Command handlers.
//!
//! Handlers are thin: parse CLI input, call the composed services, format
//! output for the terminal. Business logic lives in papervisor-core.

pub mod hash;
pub mod list;
pub mod rejected;
pub mod run;
pub mod settings;
