//! Core services orchestrating the ports.
//!
//! Services here are pure orchestrators - they don't know about concrete
//! implementations.

mod players;
mod updater;

pub use players::{DEFAULT_BAN_REASON, PlayerError, PlayerService, Whitelisted};
pub use updater::{SHUTDOWN_NOTICE, UpdateError, UpdatePipeline};
