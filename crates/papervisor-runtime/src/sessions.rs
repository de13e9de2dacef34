//! Online player tracking fed by parsed console events.
//!
//! Parsed events are queued to a single worker task, which owns every
//! mutation of the roster and of the pending identifier cache. Readers get
//! a snapshot through a short lock. Each server run has its own number;
//! events from a finished run are dropped so a late line cannot resurrect a
//! player after the roster was cleared.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use papervisor_core::{ConsoleSink, LogEvent, OnlinePlayer, RejectedPlayerRepository};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Message consumed by the session worker.
#[derive(Debug)]
pub enum SessionEvent {
    /// A new run began; clear everything and accept its events.
    Begin { run: u64 },
    /// `run` ended; clear everything unless a newer run already began.
    End { run: u64 },
    /// A classified console line from `run`.
    Parsed { run: u64, event: LogEvent },
    /// Acknowledged once every earlier message has been applied.
    Flush(oneshot::Sender<()>),
}

/// Players believed online plus identifiers resolved ahead of a join.
#[derive(Debug, Default)]
pub struct Roster {
    online: HashMap<String, String>,
    pending: HashMap<String, String>,
}

impl Roster {
    /// Apply one parsed event. Returns the username of a whitelist rejection,
    /// which the caller records elsewhere.
    pub fn apply(&mut self, event: LogEvent) -> Option<String> {
        match event {
            LogEvent::IdentifierResolved {
                username,
                identifier,
            } => {
                self.pending.insert(username, identifier);
            }
            LogEvent::Joined { username } => {
                let identifier = self.pending.remove(&username).unwrap_or_default();
                self.online.insert(username, identifier);
            }
            LogEvent::Left { username } => {
                self.online.remove(&username);
            }
            LogEvent::WhitelistRejected { username } => return Some(username),
            LogEvent::Plain => {}
        }
        None
    }

    pub fn clear(&mut self) {
        self.online.clear();
        self.pending.clear();
    }

    /// Online players sorted by name.
    pub fn players(&self) -> Vec<OnlinePlayer> {
        let mut players: Vec<OnlinePlayer> = self
            .online
            .iter()
            .map(|(name, id)| OnlinePlayer::new(name.clone(), id.clone()))
            .collect();
        players.sort_by(|a, b| a.username.cmp(&b.username));
        players
    }

    pub fn len(&self) -> usize {
        self.online.len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }

    /// Identifier waiting for `username` to join.
    pub fn pending_identifier(&self, username: &str) -> Option<&str> {
        self.pending.get(username).map(String::as_str)
    }
}

/// Handle to the session worker.
#[derive(Clone)]
pub struct SessionTracker {
    roster: Arc<Mutex<Roster>>,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionTracker {
    /// Start the worker. Must be called inside a tokio runtime.
    pub fn spawn(
        rejected: Arc<dyn RejectedPlayerRepository>,
        console: Arc<dyn ConsoleSink>,
    ) -> Self {
        let roster = Arc::new(Mutex::new(Roster::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx, roster.clone(), rejected, console));
        Self { roster, tx }
    }

    pub fn begin(&self, run: u64) {
        self.send(SessionEvent::Begin { run });
    }

    pub fn end(&self, run: u64) {
        self.send(SessionEvent::End { run });
    }

    /// Queue a parsed event. Plain lines are ignored.
    pub fn record(&self, run: u64, event: LogEvent) {
        if event.is_session_event() {
            self.send(SessionEvent::Parsed { run, event });
        }
    }

    /// Wait until everything queued so far has been applied.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        self.send(SessionEvent::Flush(ack));
        let _ = done.await;
    }

    /// Snapshot of the online players, sorted by name.
    pub fn players(&self) -> Vec<OnlinePlayer> {
        self.lock().players()
    }

    pub fn player_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Roster> {
        self.roster.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            warn!("Session worker has stopped; dropping event");
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
    roster: Arc<Mutex<Roster>>,
    rejected: Arc<dyn RejectedPlayerRepository>,
    console: Arc<dyn ConsoleSink>,
) {
    let mut active_run = None;

    while let Some(message) = rx.recv().await {
        match message {
            SessionEvent::Begin { run } => {
                active_run = Some(run);
                roster.lock().unwrap_or_else(PoisonError::into_inner).clear();
            }
            SessionEvent::End { run } => {
                if active_run != Some(run) {
                    debug!(run, "Ignoring end of a superseded run");
                    continue;
                }
                active_run = None;
                roster.lock().unwrap_or_else(PoisonError::into_inner).clear();
            }
            SessionEvent::Parsed { run, event } => {
                if active_run != Some(run) {
                    debug!(run, ?event, "Dropping event from a finished run");
                    continue;
                }
                let rejected_name = roster
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .apply(event);
                if let Some(username) = rejected_name {
                    record_rejection(rejected.as_ref(), console.as_ref(), &username).await;
                }
            }
            SessionEvent::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!("Session worker exiting");
}

async fn record_rejection(
    rejected: &dyn RejectedPlayerRepository,
    console: &dyn ConsoleSink,
    username: &str,
) {
    debug!(username, "Recording rejected connection");
    if let Err(e) = rejected.upsert(username).await {
        warn!(username, error = %e, "Failed to record rejected connection");
        console.broadcast(format!(
            "[System] Failed to record rejected player {username}: {e}"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papervisor_core::RepositoryError;
    use papervisor_core::ports::MockRejectedPlayerRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullConsole;

    impl ConsoleSink for NullConsole {
        fn broadcast(&self, _message: String) {}
    }

    fn joined(name: &str) -> LogEvent {
        LogEvent::Joined {
            username: name.into(),
        }
    }

    #[test]
    fn test_join_uses_pending_identifier() {
        let mut roster = Roster::default();
        roster.apply(LogEvent::IdentifierResolved {
            username: "Steve".into(),
            identifier: "uuid-1".into(),
        });
        assert_eq!(roster.pending_identifier("Steve"), Some("uuid-1"));

        roster.apply(joined("Steve"));
        assert_eq!(roster.players(), vec![OnlinePlayer::new("Steve", "uuid-1")]);
        assert_eq!(roster.pending_identifier("Steve"), None);
    }

    #[test]
    fn test_join_without_identifier() {
        let mut roster = Roster::default();
        roster.apply(joined("Alex"));
        assert_eq!(roster.players(), vec![OnlinePlayer::new("Alex", "")]);
    }

    #[test]
    fn test_leave_of_unknown_player_is_ignored() {
        let mut roster = Roster::default();
        roster.apply(joined("Alex"));
        roster.apply(LogEvent::Left {
            username: "Ghost".into(),
        });
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_rejection_is_returned() {
        let mut roster = Roster::default();
        let name = roster.apply(LogEvent::WhitelistRejected {
            username: "Bob".into(),
        });
        assert_eq!(name.as_deref(), Some("Bob"));
        assert!(roster.is_empty());
    }

    #[tokio::test]
    async fn test_events_from_finished_run_are_dropped() {
        let mut repo = MockRejectedPlayerRepository::new();
        repo.expect_upsert().times(0);
        let tracker = SessionTracker::spawn(Arc::new(repo), Arc::new(NullConsole));

        tracker.begin(1);
        tracker.record(1, joined("Steve"));
        tracker.end(1);
        tracker.record(1, joined("Alex"));
        tracker.flush().await;
        assert!(tracker.players().is_empty());

        tracker.begin(2);
        tracker.record(2, joined("Alex"));
        tracker.flush().await;
        assert_eq!(tracker.player_count(), 1);
    }

    #[tokio::test]
    async fn test_late_end_of_previous_run_keeps_new_roster() {
        let mut repo = MockRejectedPlayerRepository::new();
        repo.expect_upsert().times(0);
        let tracker = SessionTracker::spawn(Arc::new(repo), Arc::new(NullConsole));

        tracker.begin(1);
        tracker.begin(2);
        tracker.end(1);
        tracker.record(2, joined("Steve"));
        tracker.flush().await;
        assert_eq!(tracker.players(), vec![OnlinePlayer::new("Steve", "")]);

        tracker.end(2);
        tracker.flush().await;
        assert!(tracker.players().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_upserts_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut repo = MockRejectedPlayerRepository::new();
        repo.expect_upsert()
            .withf(|name| name == "Bob")
            .returning(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        let tracker = SessionTracker::spawn(Arc::new(repo), Arc::new(NullConsole));

        tracker.begin(1);
        tracker.record(
            1,
            LogEvent::WhitelistRejected {
                username: "Bob".into(),
            },
        );
        tracker.record(1, LogEvent::Plain);
        tracker.flush().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_worker_alive() {
        let mut repo = MockRejectedPlayerRepository::new();
        repo.expect_upsert()
            .returning(|_| Err(RepositoryError::Storage("disk full".into())));
        let tracker = SessionTracker::spawn(Arc::new(repo), Arc::new(NullConsole));

        tracker.begin(1);
        tracker.record(
            1,
            LogEvent::WhitelistRejected {
                username: "Bob".into(),
            },
        );
        tracker.record(1, joined("Steve"));
        tracker.flush().await;
        assert_eq!(tracker.players(), vec![OnlinePlayer::new("Steve", "")]);
    }
}
