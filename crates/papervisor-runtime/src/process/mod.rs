//! Supervised server process: spawning, console I/O, output streaming and
//! shutdown.

mod pipeline;
mod shutdown;
mod stream;
mod supervisor;

pub use pipeline::{STDERR_PREFIX, STDOUT_PREFIX, spawn_log_pipeline, spawn_stderr_drain};
pub use shutdown::kill_and_reap;
pub use stream::spawn_line_reader;
pub use supervisor::{STOP_COMMAND, Supervisor, SupervisorConfig};
