//! Async stream line readers (non-UTF8-safe).
//!
//! The server and its plugins can emit non-UTF8 bytes. `BufReader::lines()`
//! would end the reader on the first invalid byte, so lines are read as
//! bytes and decoded lossily.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

/// Read `stream` line by line until EOF, handing each line to `on_line`.
///
/// Trailing `\n` and `\r\n` are removed. A read error ends the task like EOF.
pub fn spawn_line_reader<F>(
    stream: impl AsyncRead + Unpin + Send + 'static,
    stream_type: &'static str,
    mut on_line: F,
) -> JoinHandle<()>
where
    F: FnMut(String) + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }
                    on_line(String::from_utf8_lossy(&buf).into_owned());
                }
                Err(e) => {
                    debug!(%stream_type, error = %e, "stream reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(%stream_type, "stream reader task exiting");
    })
}
