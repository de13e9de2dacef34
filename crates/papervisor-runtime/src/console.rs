//! Console fan-out.
//!
//! Every message shown to operators (server output and supervisor status
//! lines) goes through [`Console::broadcast`]: it is kept in a bounded
//! history, offered to live subscribers and optionally echoed to stdout.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use papervisor_core::ConsoleSink;
use tokio::sync::broadcast;

/// Lines kept for late joiners.
pub const HISTORY_CAPACITY: usize = 100;

/// Broadcast channel capacity; slower subscribers lose the oldest lines.
const CHANNEL_CAPACITY: usize = 256;

/// Ring buffer of the most recent console lines.
#[derive(Debug)]
pub struct LogHistory {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a line, removing the oldest if at capacity.
    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Lines oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for LogHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

/// History plus live fan-out for console lines.
pub struct Console {
    history: Mutex<LogHistory>,
    sender: broadcast::Sender<String>,
    mirror_stdout: bool,
}

impl Console {
    /// A console that also echoes every line to stdout.
    pub fn new() -> Self {
        Self::with_mirror(true)
    }

    /// A console that only records and fans out.
    pub fn quiet() -> Self {
        Self::with_mirror(false)
    }

    fn with_mirror(mirror_stdout: bool) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            history: Mutex::new(LogHistory::default()),
            sender,
            mirror_stdout,
        }
    }

    /// Publish one line. Never waits on subscribers.
    pub fn broadcast(&self, message: String) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());

        if self.mirror_stdout {
            println!("{message}");
        }

        // No subscribers is fine; the line is still in history.
        let _ = self.sender.send(message);
    }

    /// Attach a live subscriber. Lines published before this call are only
    /// available through [`Console::history`].
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    /// The last [`HISTORY_CAPACITY`] lines, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink for Console {
    fn broadcast(&self, message: String) {
        Self::broadcast(self, message);
    }
}
