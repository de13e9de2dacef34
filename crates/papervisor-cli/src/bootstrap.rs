//! CLI bootstrap, the composition root.
//!
//! This is the only place where infrastructure is wired together:
//! - `SQLite` rejected-player store (papervisor-db)
//! - Console, session tracker, supervisor and vitals (papervisor-runtime)
//! - Build registry and identity clients (papervisor-paper)
//! - Update pipeline and player service (papervisor-core)

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use papervisor_core::ports::{ConsoleSink, RejectedPlayerRepository, ServerController};
use papervisor_core::{PlayerService, Settings, UpdatePipeline, validate_settings};
use papervisor_db::{SqliteRejectedPlayerRepository, setup_database};
use papervisor_paper::{IdentityClient, PaperClient, PaperClientConfig};
use papervisor_runtime::{Console, SessionTracker, Supervisor, SupervisorConfig, VitalsMonitor};

use crate::error::CliError;

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub settings: Settings,
    pub console: Arc<Console>,
    pub supervisor: Supervisor,
    pub vitals: VitalsMonitor,
    pub updater: Arc<UpdatePipeline>,
    pub players: Arc<PlayerService>,
}

/// Build every service from validated settings.
///
/// Must run inside the tokio runtime: the session tracker spawns its worker
/// here.
pub async fn bootstrap(settings: Settings) -> Result<CliContext> {
    validate_settings(&settings).map_err(CliError::from)?;

    // 1. Rejected connection store
    let pool = setup_database(Path::new(&settings.db_name)).await?;
    let rejected: Arc<dyn RejectedPlayerRepository> =
        Arc::new(SqliteRejectedPlayerRepository::new(pool));

    // 2. Console fan-out and session tracking
    let console = Arc::new(Console::new());
    let sink: Arc<dyn ConsoleSink> = console.clone();
    let sessions = SessionTracker::spawn(rejected.clone(), sink.clone());

    // 3. Supervisor and vitals
    let supervisor = Supervisor::new(
        SupervisorConfig::from_settings(&settings),
        console.clone(),
        sessions,
    );
    let server: Arc<dyn ServerController> = Arc::new(supervisor.clone());
    let vitals = VitalsMonitor::new(supervisor.clone(), settings.heap_size.clone());

    // 4. Upstream clients
    let client_config =
        PaperClientConfig::new(&settings.paper_api_url, settings.paper_project.clone())?;
    let paper = Arc::new(PaperClient::new(client_config.clone())?);
    let identities = Arc::new(IdentityClient::new(client_config)?);

    // 5. Core services
    let updater = Arc::new(UpdatePipeline::new(
        server.clone(),
        paper.clone(),
        paper,
        sink.clone(),
        settings.work_dir.clone(),
        settings.jar_file.clone(),
    ));
    let players = Arc::new(PlayerService::new(
        server,
        identities,
        rejected,
        sink,
        settings.work_dir.clone(),
        settings.floodgate_prefix.clone(),
    ));

    tracing::debug!(
        work_dir = %settings.work_dir.display(),
        jar = %settings.jar_file,
        db = %settings.db_name,
        "CLI context ready"
    );

    Ok(CliContext {
        settings,
        console,
        supervisor,
        vitals,
        updater,
        players,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use papervisor_core::ServerStatus;

    #[tokio::test]
    async fn test_bootstrap_wires_services() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            work_dir: dir.path().join("server"),
            db_name: dir.path().join("state.db").display().to_string(),
            ..Settings::default()
        };

        let ctx = bootstrap(settings).await.unwrap();
        assert_eq!(ctx.supervisor.status().await, ServerStatus::Stopped);
        assert!(!ctx.updater.is_updating());
        assert!(ctx.players.rejected().await.unwrap().is_empty());
        assert!(dir.path().join("state.db").exists());
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_invalid_settings() {
        let settings = Settings {
            heap_size: "lots".to_string(),
            ..Settings::default()
        };
        let err = bootstrap(settings).await.err().unwrap();
        assert!(err.downcast_ref::<CliError>().is_some());
    }
}
