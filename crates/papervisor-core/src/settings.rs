//! Supervisor settings and validation.
//!
//! Settings are read from the process environment (the CLI loads `.env`
//! first). Every key has a default so an empty environment yields a usable
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::LaunchSpec;
use crate::utils::is_plain_file_name;

pub const DEFAULT_WORK_DIR: &str = "./paperMC";
pub const DEFAULT_JAR_FILE: &str = "server.jar";
pub const DEFAULT_HEAP_SIZE: &str = "2048M";
pub const DEFAULT_JAVA_BIN: &str = "java";
pub const DEFAULT_DB_NAME: &str = "papervisor.db";
pub const DEFAULT_PAPER_PROJECT: &str = "paper";
pub const DEFAULT_PAPER_API_URL: &str = "https://api.papermc.io";
pub const DEFAULT_FLOODGATE_PREFIX: &str = ".";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 5;

/// Suffix of the backup kept while the binary is swapped.
pub const BACKUP_SUFFIX: &str = ".tmp";

/// Resolved supervisor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Server working directory; holds the jar and the player files.
    pub work_dir: PathBuf,
    /// Active server binary, relative to `work_dir`.
    pub jar_file: String,
    /// JVM heap size used for both `-Xmx` and `-Xms`.
    pub heap_size: String,
    pub java_bin: PathBuf,
    /// Extra arguments appended after `nogui`.
    pub extra_args: Vec<String>,
    /// SQLite file for the rejected connection store.
    pub db_name: String,
    pub paper_project: String,
    pub paper_api_url: String,
    /// Prefix Floodgate puts in front of Bedrock names.
    pub floodgate_prefix: String,
    /// How long `stop` waits before killing the server. `None` waits forever.
    pub stop_timeout: Option<Duration>,
    /// Upper bound on a single console write.
    pub command_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            jar_file: DEFAULT_JAR_FILE.to_string(),
            heap_size: DEFAULT_HEAP_SIZE.to_string(),
            java_bin: PathBuf::from(DEFAULT_JAVA_BIN),
            extra_args: Vec::new(),
            db_name: DEFAULT_DB_NAME.to_string(),
            paper_project: DEFAULT_PAPER_PROJECT.to_string(),
            paper_api_url: DEFAULT_PAPER_API_URL.to_string(),
            floodgate_prefix: DEFAULT_FLOODGATE_PREFIX.to_string(),
            stop_timeout: None,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let stop_timeout = get("STOP_TIMEOUT_SECS")
            .map(|v| parse_secs("STOP_TIMEOUT_SECS", &v))
            .transpose()?;
        let command_timeout = get("COMMAND_TIMEOUT_SECS")
            .map(|v| parse_secs("COMMAND_TIMEOUT_SECS", &v))
            .transpose()?
            .unwrap_or(defaults.command_timeout);

        Ok(Self {
            work_dir: get("MC_WORKDIR").map_or(defaults.work_dir, PathBuf::from),
            jar_file: get("JAR_FILE").unwrap_or(defaults.jar_file),
            heap_size: get("RAM").unwrap_or(defaults.heap_size),
            java_bin: get("JAVA_BIN").map_or(defaults.java_bin, PathBuf::from),
            extra_args: get("MC_EXTRA_ARGS")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            db_name: get("DB_NAME").unwrap_or(defaults.db_name),
            paper_project: get("PAPER_PROJECT").unwrap_or(defaults.paper_project),
            paper_api_url: get("PAPER_API_URL").unwrap_or(defaults.paper_api_url),
            floodgate_prefix: get("FLOODGATE_PREFIX").unwrap_or(defaults.floodgate_prefix),
            stop_timeout,
            command_timeout,
        })
    }

    /// Absolute-or-relative path of the active binary.
    pub fn jar_path(&self) -> PathBuf {
        self.work_dir.join(&self.jar_file)
    }

    /// Where the active binary is parked during a swap.
    pub fn backup_path(&self) -> PathBuf {
        self.work_dir.join(format!("{}{BACKUP_SUFFIX}", self.jar_file))
    }

    /// How to launch the configured server.
    pub fn launch_spec(&self) -> LaunchSpec {
        LaunchSpec::paper(
            self.java_bin.clone(),
            self.work_dir.clone(),
            &self.heap_size,
            &self.jar_file,
            &self.extra_args,
        )
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<Duration, SettingsError> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| SettingsError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{key} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("Jar file name cannot be empty")]
    EmptyJarFile,

    #[error("Jar file must be a plain file name inside the working directory, got {0:?}")]
    InvalidJarFile(String),

    #[error("Heap size must be digits with an optional K, M or G suffix, got {0:?}")]
    InvalidHeapSize(String),

    #[error("Floodgate prefix cannot contain whitespace")]
    InvalidFloodgatePrefix,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.jar_file.is_empty() {
        return Err(SettingsError::EmptyJarFile);
    }
    if !is_plain_file_name(&settings.jar_file) {
        return Err(SettingsError::InvalidJarFile(settings.jar_file.clone()));
    }
    if !is_valid_heap_size(&settings.heap_size) {
        return Err(SettingsError::InvalidHeapSize(settings.heap_size.clone()));
    }
    if settings.floodgate_prefix.chars().any(char::is_whitespace) {
        return Err(SettingsError::InvalidFloodgatePrefix);
    }
    Ok(())
}

/// `2048M`, `4G`, `524288K` or plain bytes.
fn is_valid_heap_size(heap: &str) -> bool {
    let digits = heap
        .strip_suffix(['K', 'k', 'M', 'm', 'G', 'g'])
        .unwrap_or(heap);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
