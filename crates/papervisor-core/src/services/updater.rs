//! Self-update of the server binary.
//!
//! The pipeline resolves the newest build, compares checksums, downloads and
//! verifies the new binary, then swaps it in while the server is stopped.
//! A failed swap restores the previous binary and restarts it; if even that
//! is impossible the pipeline reports [`UpdateError::Unrecoverable`] and
//! leaves the server down.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{UpdateArtifact, UpdateOutcome};
use crate::ports::{
    BinaryFetcher, BuildMetadataSource, ConsoleSink, FetchError, LookupError, ServerController,
    ServerError,
};
use crate::settings::BACKUP_SUFFIX;
use crate::utils::{file_sha256, is_plain_file_name};

/// Console command sent to players before the server goes down.
pub const SHUTDOWN_NOTICE: &str = "say Server is restarting for an update";

/// Errors from an update request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// Another update holds the single-flight guard.
    #[error("An update is already in progress")]
    InProgress,

    #[error("Could not resolve the latest build: {0}")]
    Metadata(#[from] LookupError),

    /// The registry returned an artifact that cannot be installed safely.
    #[error("Refusing to install artifact: {0}")]
    InvalidArtifact(String),

    #[error("Failed to hash the server binary: {0}")]
    Hash(String),

    #[error(transparent)]
    Download(#[from] FetchError),

    /// The downloaded file does not match the registry checksum. It has been
    /// deleted and the server was not touched.
    #[error("Checksum mismatch for download: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Filesystem error: {0}")]
    Io(String),

    /// Installing the new binary failed; the previous binary was restored
    /// and restarted.
    #[error("Binary swap failed and was rolled back: {0}")]
    SwapFailed(String),

    /// No runnable binary is left at the active path. Operator action is
    /// required; the server has not been restarted.
    #[error("Update left no usable server binary: {0}")]
    Unrecoverable(String),
}

impl UpdateError {
    /// Whether the request lost a race with another update.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

/// Single-flight updater for the supervised server binary.
pub struct UpdatePipeline {
    server: Arc<dyn ServerController>,
    metadata: Arc<dyn BuildMetadataSource>,
    fetcher: Arc<dyn BinaryFetcher>,
    console: Arc<dyn ConsoleSink>,
    work_dir: PathBuf,
    jar_file: String,
    in_flight: Mutex<()>,
}

impl UpdatePipeline {
    pub fn new(
        server: Arc<dyn ServerController>,
        metadata: Arc<dyn BuildMetadataSource>,
        fetcher: Arc<dyn BinaryFetcher>,
        console: Arc<dyn ConsoleSink>,
        work_dir: impl Into<PathBuf>,
        jar_file: impl Into<String>,
    ) -> Self {
        Self {
            server,
            metadata,
            fetcher,
            console,
            work_dir: work_dir.into(),
            jar_file: jar_file.into(),
            in_flight: Mutex::new(()),
        }
    }

    /// Whether an update is currently running.
    pub fn is_updating(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Update the server to the newest build of `version`.
    ///
    /// Fails immediately with [`UpdateError::InProgress`] if another update
    /// is running.
    pub async fn update(&self, version: &str) -> Result<UpdateOutcome, UpdateError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!(version, "Rejected concurrent update request");
            return Err(UpdateError::InProgress);
        };

        tracing::info!(version, "Starting server update");
        self.say(format!("[System] Checking for updates to {version}..."));

        let result = self.run(version).await;
        match &result {
            Ok(outcome) => tracing::info!(?outcome, "Update finished"),
            Err(e) => {
                tracing::error!(error = %e, "Update failed");
                self.say(format!("[System] Update failed: {e}"));
            }
        }
        result
    }

    async fn run(&self, version: &str) -> Result<UpdateOutcome, UpdateError> {
        let artifact = self.metadata.resolve_latest(version).await?;
        self.say(format!(
            "[System] Latest build for {}: #{} ({})",
            artifact.version, artifact.build, artifact.filename
        ));
        self.check_artifact(&artifact)?;

        let jar_path = self.jar_path();
        let current = file_sha256(&jar_path)
            .await
            .map_err(|e| UpdateError::Hash(e.to_string()))?;
        if !current.is_empty() && current.eq_ignore_ascii_case(&artifact.sha256) {
            self.say(format!(
                "[System] Server is already up to date (build #{})",
                artifact.build
            ));
            return Ok(UpdateOutcome::UpToDate {
                build: artifact.build,
            });
        }

        self.say(format!("[System] Downloading {}...", artifact.filename));
        let download = self
            .fetcher
            .fetch(
                &artifact.version,
                artifact.build,
                &artifact.filename,
                &self.work_dir,
            )
            .await?;
        self.verify_download(&download, &artifact.sha256).await?;
        self.say("[System] Download verified".to_string());

        self.shut_down_server().await?;

        let backup_path = self.backup_path();
        let backed_up = self.back_up(&jar_path, &backup_path).await?;

        if let Err(e) = tokio::fs::rename(&download, &jar_path).await {
            return Err(self.roll_back(&jar_path, &backup_path, backed_up, &e).await);
        }
        if !tokio::fs::try_exists(&jar_path).await.unwrap_or(false) {
            return Err(UpdateError::Unrecoverable(format!(
                "{} is missing after the swap",
                jar_path.display()
            )));
        }

        self.say("[System] Starting updated server...".to_string());
        self.server.start().await?;
        self.say(format!(
            "[System] Update to build #{} complete",
            artifact.build
        ));

        Ok(UpdateOutcome::Updated {
            build: artifact.build,
            filename: artifact.filename,
        })
    }

    /// The download lands next to the active binary, so its name must not
    /// collide with either the binary or its backup.
    fn check_artifact(&self, artifact: &UpdateArtifact) -> Result<(), UpdateError> {
        let name = artifact.filename.as_str();
        if !is_plain_file_name(name) {
            return Err(UpdateError::InvalidArtifact(format!(
                "{name:?} is not a plain file name"
            )));
        }
        if name == self.jar_file || name == self.backup_name() {
            return Err(UpdateError::InvalidArtifact(format!(
                "{name:?} collides with the active binary"
            )));
        }
        if artifact.sha256.is_empty() {
            return Err(UpdateError::InvalidArtifact(format!(
                "{name:?} has no checksum"
            )));
        }
        Ok(())
    }

    async fn verify_download(&self, path: &Path, expected: &str) -> Result<(), UpdateError> {
        let actual = file_sha256(path)
            .await
            .map_err(|e| UpdateError::Hash(e.to_string()))?;
        if actual.eq_ignore_ascii_case(expected) {
            return Ok(());
        }
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete corrupt download");
        }
        Err(UpdateError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }

    /// Warn players and stop the server. A server that is already down is
    /// fine here.
    async fn shut_down_server(&self) -> Result<(), UpdateError> {
        self.say("[System] Stopping server for update...".to_string());
        if let Err(e) = self.server.send_command(SHUTDOWN_NOTICE).await {
            tracing::debug!(error = %e, "Shutdown notice not delivered");
        }
        match self.server.stop().await {
            Ok(()) | Err(ServerError::AlreadyStopped) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Move the active binary aside. Returns `false` when there was nothing
    /// to back up.
    async fn back_up(&self, jar_path: &Path, backup_path: &Path) -> Result<bool, UpdateError> {
        if !tokio::fs::try_exists(jar_path).await.unwrap_or(false) {
            tracing::info!(path = %jar_path.display(), "No active binary to back up");
            return Ok(false);
        }
        match tokio::fs::rename(jar_path, backup_path).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // The binary is untouched, bring the old server back.
                self.restart_previous().await;
                Err(UpdateError::Io(format!(
                    "failed to back up {}: {e}",
                    jar_path.display()
                )))
            }
        }
    }

    async fn roll_back(
        &self,
        jar_path: &Path,
        backup_path: &Path,
        backed_up: bool,
        cause: &std::io::Error,
    ) -> UpdateError {
        tracing::error!(error = %cause, "Failed to install new binary, rolling back");
        if !backed_up {
            return UpdateError::Unrecoverable(format!(
                "installing the new binary failed ({cause}) and there is no backup"
            ));
        }
        if let Err(e) = tokio::fs::rename(backup_path, jar_path).await {
            return UpdateError::Unrecoverable(format!(
                "installing the new binary failed ({cause}) and restoring the backup failed ({e})"
            ));
        }
        if !tokio::fs::try_exists(jar_path).await.unwrap_or(false) {
            return UpdateError::Unrecoverable(format!(
                "{} is missing after restoring the backup",
                jar_path.display()
            ));
        }
        self.say("[System] Restored previous server binary".to_string());
        self.restart_previous().await;
        UpdateError::SwapFailed(cause.to_string())
    }

    async fn restart_previous(&self) {
        self.say("[System] Restarting previous server...".to_string());
        if let Err(e) = self.server.start().await {
            tracing::error!(error = %e, "Failed to restart previous server");
            self.say(format!("[System] Failed to restart server: {e}"));
        }
    }

    fn say(&self, message: String) {
        self.console.broadcast(message);
    }

    fn jar_path(&self) -> PathBuf {
        self.work_dir.join(&self.jar_file)
    }

    fn backup_name(&self) -> String {
        format!("{}{BACKUP_SUFFIX}", self.jar_file)
    }

    fn backup_path(&self) -> PathBuf {
        self.work_dir.join(self.backup_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockBinaryFetcher, MockBuildMetadataSource, MockServerController};
    use crate::utils::file_sha256_blocking;
    use mockall::Sequence;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::{TempDir, tempdir};

    const NEW_BUILD: &[u8] = b"new build";
    const OLD_BUILD: &[u8] = b"old build";

    #[derive(Default)]
    struct RecordingConsole {
        lines: StdMutex<Vec<String>>,
    }

    impl RecordingConsole {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl ConsoleSink for RecordingConsole {
        fn broadcast(&self, message: String) {
            self.lines.lock().unwrap().push(message);
        }
    }

    fn sha_of(bytes: &[u8]) -> String {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample");
        std::fs::write(&path, bytes).unwrap();
        file_sha256_blocking(&path).unwrap()
    }

    fn artifact(filename: &str, sha256: String) -> UpdateArtifact {
        UpdateArtifact {
            version: "1.21.1".into(),
            build: 119,
            filename: filename.into(),
            sha256,
        }
    }

    fn metadata_returning(artifact: UpdateArtifact) -> MockBuildMetadataSource {
        let mut metadata = MockBuildMetadataSource::new();
        metadata
            .expect_resolve_latest()
            .returning(move |_| Ok(artifact.clone()));
        metadata
    }

    fn fetcher_writing(bytes: &'static [u8]) -> MockBinaryFetcher {
        let mut fetcher = MockBinaryFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(move |_, _, filename, dir| {
                let path = dir.join(filename);
                std::fs::write(&path, bytes).unwrap();
                Ok(path)
            });
        fetcher
    }

    fn pipeline(
        dir: &TempDir,
        server: MockServerController,
        metadata: MockBuildMetadataSource,
        fetcher: MockBinaryFetcher,
    ) -> (UpdatePipeline, Arc<RecordingConsole>) {
        let console = Arc::new(RecordingConsole::default());
        let pipeline = UpdatePipeline::new(
            Arc::new(server),
            Arc::new(metadata),
            Arc::new(fetcher),
            console.clone(),
            dir.path(),
            "server.jar",
        );
        (pipeline, console)
    }

    #[tokio::test]
    async fn test_up_to_date_does_not_touch_server() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("server.jar"), b"test data").unwrap();
        let artifact = artifact(
            "paper-1.21.1-119.jar",
            "916F0027A575074CE72A331777C3478D6513F786A591BD892DA1A577BF2335F9".into(),
        );

        let mut fetcher = MockBinaryFetcher::new();
        fetcher.expect_fetch().times(0);
        let (pipeline, console) = pipeline(
            &dir,
            MockServerController::new(),
            metadata_returning(artifact),
            fetcher,
        );

        let outcome = pipeline.update("1.21.1").await.unwrap();
        assert_eq!(outcome, UpdateOutcome::UpToDate { build: 119 });
        assert!(console.lines().iter().any(|l| l.contains("already up to date")));
    }

    #[tokio::test]
    async fn test_successful_update_swaps_and_restarts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("server.jar"), OLD_BUILD).unwrap();

        let stopped = Arc::new(AtomicBool::new(false));
        let mut seq = Sequence::new();
        let mut server = MockServerController::new();
        server
            .expect_send_command()
            .withf(|cmd| cmd.starts_with("say "))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let flag = stopped.clone();
        server
            .expect_stop()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            });
        let work_dir = dir.path().to_path_buf();
        server
            .expect_start()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || {
                // Restart only happens once the swap is complete.
                assert_eq!(std::fs::read(work_dir.join("server.jar")).unwrap(), NEW_BUILD);
                assert_eq!(
                    std::fs::read(work_dir.join("server.jar.tmp")).unwrap(),
                    OLD_BUILD
                );
                Ok(())
            });

        let mut fetcher = MockBinaryFetcher::new();
        let flag = stopped.clone();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(move |_, _, filename, dir| {
                assert!(!flag.load(Ordering::SeqCst), "downloaded after stop");
                let path = dir.join(filename);
                std::fs::write(&path, NEW_BUILD).unwrap();
                Ok(path)
            });

        let (pipeline, console) = pipeline(
            &dir,
            server,
            metadata_returning(artifact("paper-1.21.1-119.jar", sha_of(NEW_BUILD))),
            fetcher,
        );

        let outcome = pipeline.update("1.21.1").await.unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Updated {
                build: 119,
                filename: "paper-1.21.1-119.jar".into()
            }
        );
        assert_eq!(std::fs::read(dir.path().join("server.jar")).unwrap(), NEW_BUILD);
        assert_eq!(
            std::fs::read(dir.path().join("server.jar.tmp")).unwrap(),
            OLD_BUILD
        );
        assert!(!dir.path().join("paper-1.21.1-119.jar").exists());
        assert!(console.lines().iter().all(|l| l.starts_with("[System]")));
    }

    #[tokio::test]
    async fn test_update_tolerates_stopped_server_and_missing_binary() {
        let dir = tempdir().unwrap();

        let mut server = MockServerController::new();
        server
            .expect_send_command()
            .returning(|_| Err(ServerError::NotRunning));
        server
            .expect_stop()
            .times(1)
            .returning(|| Err(ServerError::AlreadyStopped));
        server.expect_start().times(1).returning(|| Ok(()));

        let (pipeline, _console) = pipeline(
            &dir,
            server,
            metadata_returning(artifact("paper-1.21.1-119.jar", sha_of(NEW_BUILD))),
            fetcher_writing(NEW_BUILD),
        );

        let outcome = pipeline.update("1.21.1").await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated { build: 119, .. }));
        assert_eq!(std::fs::read(dir.path().join("server.jar")).unwrap(), NEW_BUILD);
        assert!(!dir.path().join("server.jar.tmp").exists());
    }

    #[tokio::test]
    async fn test_checksum_mismatch_aborts_before_stop() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("server.jar"), OLD_BUILD).unwrap();

        let mut server = MockServerController::new();
        server.expect_send_command().times(0);
        server.expect_stop().times(0);
        server.expect_start().times(0);

        let (pipeline, console) = pipeline(
            &dir,
            server,
            metadata_returning(artifact("paper-1.21.1-119.jar", sha_of(b"something else"))),
            fetcher_writing(NEW_BUILD),
        );

        let err = pipeline.update("1.21.1").await.unwrap_err();
        assert!(matches!(err, UpdateError::ChecksumMismatch { .. }));
        assert!(!dir.path().join("paper-1.21.1-119.jar").exists());
        assert_eq!(std::fs::read(dir.path().join("server.jar")).unwrap(), OLD_BUILD);
        assert!(console.lines().iter().any(|l| l.starts_with("[System] Update failed")));
    }

    #[tokio::test]
    async fn test_invalid_artifact_names_are_rejected() {
        for name in ["../escape.jar", "server.jar", "server.jar.tmp", ""] {
            let dir = tempdir().unwrap();
            let mut fetcher = MockBinaryFetcher::new();
            fetcher.expect_fetch().times(0);
            let (pipeline, _console) = pipeline(
                &dir,
                MockServerController::new(),
                metadata_returning(artifact(name, sha_of(NEW_BUILD))),
                fetcher,
            );

            let err = pipeline.update("1.21.1").await.unwrap_err();
            assert!(matches!(err, UpdateError::InvalidArtifact(_)), "{name:?}");
        }
    }

    #[tokio::test]
    async fn test_metadata_failure_is_reported() {
        let dir = tempdir().unwrap();
        let mut metadata = MockBuildMetadataSource::new();
        metadata
            .expect_resolve_latest()
            .returning(|v| Err(LookupError::NotFound(format!("builds for {v}"))));
        let (pipeline, _console) = pipeline(
            &dir,
            MockServerController::new(),
            metadata,
            MockBinaryFetcher::new(),
        );

        let err = pipeline.update("9.9.9").await.unwrap_err();
        assert_eq!(
            err,
            UpdateError::Metadata(LookupError::NotFound("builds for 9.9.9".into()))
        );
    }

    #[tokio::test]
    async fn test_concurrent_update_is_rejected() {
        let dir = tempdir().unwrap();
        let mut metadata = MockBuildMetadataSource::new();
        metadata.expect_resolve_latest().times(0);
        let (pipeline, _console) = pipeline(
            &dir,
            MockServerController::new(),
            metadata,
            MockBinaryFetcher::new(),
        );

        let _held = pipeline.in_flight.lock().await;
        assert!(pipeline.is_updating());
        let err = pipeline.update("1.21.1").await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_failed_swap_rolls_back_and_restarts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("server.jar"), OLD_BUILD).unwrap();
        let download = dir.path().join("paper-1.21.1-119.jar");

        let mut server = MockServerController::new();
        server.expect_send_command().returning(|_| Ok(()));
        // The download disappears while the server is going down.
        let vanishing = download.clone();
        server.expect_stop().times(1).returning(move || {
            std::fs::remove_file(&vanishing).unwrap();
            Ok(())
        });
        server.expect_start().times(1).returning(|| Ok(()));

        let (pipeline, _console) = pipeline(
            &dir,
            server,
            metadata_returning(artifact("paper-1.21.1-119.jar", sha_of(NEW_BUILD))),
            fetcher_writing(NEW_BUILD),
        );

        let err = pipeline.update("1.21.1").await.unwrap_err();
        assert!(matches!(err, UpdateError::SwapFailed(_)));
        assert_eq!(std::fs::read(dir.path().join("server.jar")).unwrap(), OLD_BUILD);
        assert!(!dir.path().join("server.jar.tmp").exists());
    }

    #[tokio::test]
    async fn test_swap_without_backup_is_unrecoverable() {
        let dir = tempdir().unwrap();
        let download = dir.path().join("paper-1.21.1-119.jar");

        let mut server = MockServerController::new();
        server.expect_send_command().returning(|_| Ok(()));
        let vanishing = download.clone();
        server.expect_stop().times(1).returning(move || {
            std::fs::remove_file(&vanishing).unwrap();
            Ok(())
        });
        server.expect_start().times(0);

        let (pipeline, _console) = pipeline(
            &dir,
            server,
            metadata_returning(artifact("paper-1.21.1-119.jar", sha_of(NEW_BUILD))),
            fetcher_writing(NEW_BUILD),
        );

        let err = pipeline.update("1.21.1").await.unwrap_err();
        assert!(matches!(err, UpdateError::Unrecoverable(_)));
        assert!(!pipeline.is_updating());
    }

    #[tokio::test]
    async fn test_stop_failure_aborts_update() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("server.jar"), OLD_BUILD).unwrap();

        let mut server = MockServerController::new();
        server.expect_send_command().returning(|_| Ok(()));
        server
            .expect_stop()
            .returning(|| Err(ServerError::Wait("exit status: 1".into())));
        server.expect_start().times(0);

        let (pipeline, _console) = pipeline(
            &dir,
            server,
            metadata_returning(artifact("paper-1.21.1-119.jar", sha_of(NEW_BUILD))),
            fetcher_writing(NEW_BUILD),
        );

        let err = pipeline.update("1.21.1").await.unwrap_err();
        assert!(matches!(err, UpdateError::Server(ServerError::Wait(_))));
        assert_eq!(std::fs::read(dir.path().join("server.jar")).unwrap(), OLD_BUILD);
    }
}
