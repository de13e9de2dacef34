//! Per-run handling of the server's output streams.

use std::sync::Arc;

use papervisor_core::parse_line;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;

use super::stream::spawn_line_reader;
use crate::console::Console;
use crate::sessions::SessionTracker;

/// Prefix of server stdout lines in the console stream.
pub const STDOUT_PREFIX: &str = "[MC] ";
/// Prefix of server stderr lines in the console stream.
pub const STDERR_PREFIX: &str = "[MC-ERR] ";

/// Publish every stdout line and feed session events for `run` to the
/// tracker, in line order.
pub fn spawn_log_pipeline(
    stdout: impl AsyncRead + Unpin + Send + 'static,
    run: u64,
    console: Arc<Console>,
    sessions: SessionTracker,
) -> JoinHandle<()> {
    spawn_line_reader(stdout, "stdout", move |line| {
        console.broadcast(format!("{STDOUT_PREFIX}{line}"));
        sessions.record(run, parse_line(&line));
    })
}

/// Publish stderr lines so the pipe never fills up. They are not parsed.
pub fn spawn_stderr_drain(
    stderr: impl AsyncRead + Unpin + Send + 'static,
    console: Arc<Console>,
) -> JoinHandle<()> {
    spawn_line_reader(stderr, "stderr", move |line| {
        console.broadcast(format!("{STDERR_PREFIX}{line}"));
    })
}
