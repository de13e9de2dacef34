//! Runtime side of papervisor: the process supervisor, the console
//! fan-out, session tracking and resource sampling.

pub mod console;
pub mod process;
pub mod sessions;
pub mod vitals;

pub use console::{Console, HISTORY_CAPACITY, LogHistory};
pub use process::{STOP_COMMAND, Supervisor, SupervisorConfig};
pub use sessions::{Roster, SessionEvent, SessionTracker};
pub use vitals::VitalsMonitor;
