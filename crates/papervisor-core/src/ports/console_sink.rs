//! Console sink port for operator-visible status lines.

/// Destination for messages that should appear in the server console
/// stream next to the process's own output.
///
/// Implementations must never block on slow or absent readers.
pub trait ConsoleSink: Send + Sync {
    /// Publish one message to history and live subscribers.
    fn broadcast(&self, message: String);
}
