//! Player administration on top of the server console.
//!
//! Every mutation is a console command sent through the supervisor; reads
//! come from the JSON files the server maintains in its working directory.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::{PlayerFileEntry, PlayerList, RejectedPlayer};
use crate::ports::{
    ConsoleSink, IdentityResolver, RejectedPlayerRepository, RepositoryError, ServerController,
    ServerError,
};

/// Reason recorded when a ban is issued without one.
pub const DEFAULT_BAN_REASON: &str = "Banned by Operator";

/// Errors from player administration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// Neither the Java nor the Bedrock lookup knows the name.
    #[error("Player {0} was not found as a Java or Bedrock account")]
    PlayerNotFound(String),

    /// The name would break out of a single console command.
    #[error("Invalid player name: {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Failed to read {file}: {message}")]
    Io { file: &'static str, message: String },

    #[error("Failed to parse {file}: {message}")]
    Parse { file: &'static str, message: String },
}

/// How a whitelisted name was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Whitelisted {
    Java { uuid: String },
    /// `name` carries the Floodgate prefix used on the server.
    Bedrock { name: String, xuid: String },
}

/// Player administration service.
pub struct PlayerService {
    server: Arc<dyn ServerController>,
    identities: Arc<dyn IdentityResolver>,
    rejected: Arc<dyn RejectedPlayerRepository>,
    console: Arc<dyn ConsoleSink>,
    work_dir: PathBuf,
    floodgate_prefix: String,
}

impl PlayerService {
    pub fn new(
        server: Arc<dyn ServerController>,
        identities: Arc<dyn IdentityResolver>,
        rejected: Arc<dyn RejectedPlayerRepository>,
        console: Arc<dyn ConsoleSink>,
        work_dir: impl Into<PathBuf>,
        floodgate_prefix: impl Into<String>,
    ) -> Self {
        Self {
            server,
            identities,
            rejected,
            console,
            work_dir: work_dir.into(),
            floodgate_prefix: floodgate_prefix.into(),
        }
    }

    /// Whitelist `name`, trying a Java account first and a Bedrock account
    /// through Floodgate second.
    pub async fn whitelist(&self, name: &str) -> Result<Whitelisted, PlayerError> {
        check_name(name)?;

        let java_err = match self.identities.java_uuid(name).await {
            Ok(uuid) => {
                self.console
                    .broadcast(format!("[System] Whitelisting Java player {name} ({uuid})"));
                self.server.send_command(&format!("whitelist add {name}")).await?;
                self.forget_after_whitelist(&[name]).await;
                return Ok(Whitelisted::Java { uuid });
            }
            Err(e) => e,
        };
        tracing::debug!(name, error = %java_err, "Java lookup failed, trying Bedrock");

        let gamertag = name.trim_start_matches(['.', '*']);
        match self.identities.bedrock_xuid(gamertag).await {
            Ok(xuid) => {
                let prefixed = format!("{}{gamertag}", self.floodgate_prefix);
                self.console.broadcast(format!(
                    "[System] Whitelisting Bedrock player {prefixed} ({xuid})"
                ));
                self.server
                    .send_command(&format!("fwhitelist add {prefixed}"))
                    .await?;
                self.forget_after_whitelist(&[name, &prefixed]).await;
                Ok(Whitelisted::Bedrock {
                    name: prefixed,
                    xuid,
                })
            }
            Err(bedrock_err) => {
                tracing::warn!(
                    name,
                    java = %java_err,
                    bedrock = %bedrock_err,
                    "Player lookup failed"
                );
                self.console.broadcast(format!(
                    "[System] Could not find {name} as a Java or Bedrock player"
                ));
                Err(PlayerError::PlayerNotFound(name.to_string()))
            }
        }
    }

    pub async fn remove_from_whitelist(&self, name: &str) -> Result<(), PlayerError> {
        self.command("whitelist remove", name).await
    }

    /// Ban `name`, with [`DEFAULT_BAN_REASON`] when no reason is given.
    pub async fn ban(&self, name: &str, reason: Option<&str>) -> Result<(), PlayerError> {
        check_name(name)?;
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_BAN_REASON);
        if reason.contains(['\n', '\r']) {
            return Err(PlayerError::InvalidName(reason.to_string()));
        }
        self.server
            .send_command(&format!("ban {name} {reason}"))
            .await?;
        Ok(())
    }

    pub async fn unban(&self, name: &str) -> Result<(), PlayerError> {
        self.command("pardon", name).await
    }

    pub async fn op(&self, name: &str) -> Result<(), PlayerError> {
        self.command("op", name).await
    }

    pub async fn deop(&self, name: &str) -> Result<(), PlayerError> {
        self.command("deop", name).await
    }

    /// Read one of the server's player files. A missing file is empty.
    pub async fn entries(&self, list: PlayerList) -> Result<Vec<PlayerFileEntry>, PlayerError> {
        let file = list.file_name();
        let path = self.work_dir.join(file);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PlayerError::Io {
                    file,
                    message: e.to_string(),
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| PlayerError::Parse {
            file,
            message: e.to_string(),
        })
    }

    pub async fn whitelist_entries(&self) -> Result<Vec<PlayerFileEntry>, PlayerError> {
        self.entries(PlayerList::Whitelist).await
    }

    pub async fn banned_entries(&self) -> Result<Vec<PlayerFileEntry>, PlayerError> {
        self.entries(PlayerList::Banned).await
    }

    pub async fn op_entries(&self) -> Result<Vec<PlayerFileEntry>, PlayerError> {
        self.entries(PlayerList::Ops).await
    }

    /// Recently rejected connection attempts, newest first.
    pub async fn rejected(&self) -> Result<Vec<RejectedPlayer>, PlayerError> {
        Ok(self.rejected.list().await?)
    }

    pub async fn forget_rejected(&self, name: &str) -> Result<(), PlayerError> {
        Ok(self.rejected.delete(name).await?)
    }

    async fn command(&self, verb: &str, name: &str) -> Result<(), PlayerError> {
        check_name(name)?;
        self.server.send_command(&format!("{verb} {name}")).await?;
        Ok(())
    }

    async fn forget_after_whitelist(&self, names: &[&str]) {
        for name in names {
            if let Err(e) = self.rejected.delete(name).await {
                tracing::warn!(name, error = %e, "Failed to clear rejected entry");
            }
        }
    }
}

fn check_name(name: &str) -> Result<(), PlayerError> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(PlayerError::InvalidName(name.to_string()));
    }
    Ok(())
}
