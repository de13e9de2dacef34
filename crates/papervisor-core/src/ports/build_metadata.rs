//! Ports for the remote build registry.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{FetchError, LookupError};
use crate::domain::UpdateArtifact;

/// Looks up the newest build of a game version.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait BuildMetadataSource: Send + Sync {
    /// Resolve the latest build for `version`.
    ///
    /// Fails with `LookupError::NotFound` when the version has no builds and
    /// `LookupError::Unavailable` when the registry cannot be reached.
    async fn resolve_latest(&self, version: &str) -> Result<UpdateArtifact, LookupError>;
}

/// Downloads a server binary.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait BinaryFetcher: Send + Sync {
    /// Download `filename` of `version`/`build` into `dest_dir`.
    ///
    /// Returns the path of the written file, `dest_dir/filename`.
    async fn fetch(
        &self,
        version: &str,
        build: u32,
        filename: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, FetchError>;
}
