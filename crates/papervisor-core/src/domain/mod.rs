//! Domain types shared by every papervisor crate.

mod launch;
mod player;
mod status;
mod update;
mod vitals;

pub use launch::{HEADLESS_FLAG, LaunchSpec};
pub use player::{OnlinePlayer, PlayerFileEntry, PlayerList, RejectedPlayer};
pub use status::ServerStatus;
pub use update::{UpdateArtifact, UpdateOutcome};
pub use vitals::Vitals;
