//! Core port implementations for the registry and identity clients.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use papervisor_core::ports::{
    BinaryFetcher, BuildMetadataSource, FetchError, IdentityResolver, LookupError,
};
use papervisor_core::UpdateArtifact;

use crate::client::PaperClient;
use crate::error::PaperError;
use crate::http::HttpBackend;
use crate::identity::IdentityClient;

/// Convert an internal error to a lookup failure about `subject`.
fn map_lookup_error(err: PaperError, subject: &str) -> LookupError {
    if err.is_not_found() {
        return LookupError::NotFound(subject.to_string());
    }
    match err {
        PaperError::InvalidResponse { message } => LookupError::InvalidResponse(message),
        PaperError::JsonParse(e) => LookupError::InvalidResponse(e.to_string()),
        other => LookupError::Unavailable(other.to_string()),
    }
}

fn map_fetch_error(err: PaperError) -> FetchError {
    match err {
        PaperError::Status { status, .. } => FetchError::Status(status),
        PaperError::Io(e) => FetchError::Io(e.to_string()),
        other => FetchError::Request(other.to_string()),
    }
}

#[async_trait]
impl<B: HttpBackend> BuildMetadataSource for PaperClient<B> {
    async fn resolve_latest(&self, version: &str) -> Result<UpdateArtifact, LookupError> {
        self.latest_build(version)
            .await
            .map_err(|e| map_lookup_error(e, &format!("Version {version}")))
    }
}

#[async_trait]
impl<B: HttpBackend> BinaryFetcher for PaperClient<B> {
    async fn fetch(
        &self,
        version: &str,
        build: u32,
        filename: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        self.download(version, build, filename, dest_dir)
            .await
            .map_err(map_fetch_error)
    }
}

#[async_trait]
impl<B: HttpBackend> IdentityResolver for IdentityClient<B> {
    async fn java_uuid(&self, username: &str) -> Result<String, LookupError> {
        self.profile_id(username)
            .await
            .map_err(|e| map_lookup_error(e, &format!("Player {username}")))
    }

    async fn bedrock_xuid(&self, gamertag: &str) -> Result<String, LookupError> {
        self.xuid(gamertag)
            .await
            .map_err(|e| map_lookup_error(e, &format!("Bedrock player {gamertag}")))
    }
}
