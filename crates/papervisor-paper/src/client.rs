//! Build registry client.

use std::path::{Path, PathBuf};

use papervisor_core::UpdateArtifact;

use crate::config::PaperClientConfig;
use crate::error::{PaperError, PaperResult};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::BuildsResponse;
use crate::url::{build_builds_url, build_download_url};

/// Suffix of the in-progress download file.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Client for the PaperMC build registry.
pub struct PaperClient<B: HttpBackend = ReqwestBackend> {
    backend: B,
    config: PaperClientConfig,
}

pub type DefaultPaperClient = PaperClient<ReqwestBackend>;

impl PaperClient<ReqwestBackend> {
    pub fn new(config: PaperClientConfig) -> PaperResult<Self> {
        let backend = ReqwestBackend::new(&config)?;
        Ok(Self { backend, config })
    }
}

impl<B: HttpBackend> PaperClient<B> {
    pub const fn with_backend(backend: B, config: PaperClientConfig) -> Self {
        Self { backend, config }
    }

    pub const fn config(&self) -> &PaperClientConfig {
        &self.config
    }

    /// Latest build of `version` that ships a server jar.
    pub async fn latest_build(&self, version: &str) -> PaperResult<UpdateArtifact> {
        let url = build_builds_url(&self.config, version)?;
        tracing::debug!(%url, "Fetching build list");

        let response: BuildsResponse = self.backend.get_json(&url).await?;
        let (build, download) = response.latest().ok_or_else(|| PaperError::Status {
            status: 404,
            url: url.to_string(),
        })?;

        tracing::debug!(
            version,
            build = build.build,
            channel = build.channel.as_deref().unwrap_or("unknown"),
            "Resolved latest build"
        );

        Ok(UpdateArtifact {
            version: version.to_string(),
            build: build.build,
            filename: download.name.clone(),
            sha256: download.sha256.to_ascii_lowercase(),
        })
    }

    /// Download a build's jar into `dest_dir/filename`.
    ///
    /// The body is streamed into `filename.part` and renamed once complete,
    /// so a failed transfer never leaves a file under the final name.
    pub async fn download(
        &self,
        version: &str,
        build: u32,
        filename: &str,
        dest_dir: &Path,
    ) -> PaperResult<PathBuf> {
        if !papervisor_core::utils::is_plain_file_name(filename) {
            return Err(PaperError::InvalidResponse {
                message: format!("refusing to download to '{filename}'"),
            });
        }

        let url = build_download_url(&self.config, version, build, filename)?;
        let dest = dest_dir.join(filename);
        let partial = dest_dir.join(format!("{filename}{PARTIAL_SUFFIX}"));

        tracing::info!(%url, dest = %dest.display(), "Downloading server binary");

        match self.backend.download_to(&url, &partial).await {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::rename(&partial, &dest).await {
                    remove_partial(&partial).await;
                    return Err(e.into());
                }
                tracing::info!(bytes, dest = %dest.display(), "Download complete");
                Ok(dest)
            }
            Err(e) => {
                remove_partial(&partial).await;
                Err(e)
            }
        }
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial download");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PAPER_API_URL;
    use crate::http::testing::{CannedResponse, FakeBackend};
    use serde_json::json;

    fn client(backend: FakeBackend) -> PaperClient<FakeBackend> {
        let config = PaperClientConfig::new(DEFAULT_PAPER_API_URL, "paper").unwrap();
        PaperClient::with_backend(backend, config)
    }

    fn builds() -> serde_json::Value {
        json!({
            "project_id": "paper",
            "version": "1.21.1",
            "builds": [
                {"build": 40, "channel": "default",
                 "downloads": {"application": {"name": "paper-1.21.1-40.jar", "sha256": "AB12"}}},
                {"build": 7, "channel": "default",
                 "downloads": {"application": {"name": "paper-1.21.1-7.jar", "sha256": "cd34"}}}
            ]
        })
    }

    #[tokio::test]
    async fn test_latest_build_picks_highest_number() {
        let backend = FakeBackend::new()
            .with_response("/versions/1.21.1/builds", CannedResponse::Json(builds()));
        let client = client(backend);

        let artifact = client.latest_build("1.21.1").await.unwrap();
        assert_eq!(
            artifact,
            UpdateArtifact {
                version: "1.21.1".to_string(),
                build: 40,
                filename: "paper-1.21.1-40.jar".to_string(),
                sha256: "ab12".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_latest_build_without_builds_is_not_found() {
        let backend = FakeBackend::new().with_response(
            "/builds",
            CannedResponse::Json(json!({"project_id": "paper", "version": "1.8", "builds": []})),
        );
        let err = client(backend).latest_build("1.8").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_latest_build_unknown_version() {
        let backend = FakeBackend::new();
        let err = client(backend).latest_build("0.0.1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_download_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::new().with_response(
            "/builds/40/downloads/paper-1.21.1-40.jar",
            CannedResponse::Bytes(b"jar bytes".to_vec()),
        );
        let client = client(backend);

        let path = client
            .download("1.21.1", 40, "paper-1.21.1-40.jar", dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("paper-1.21.1-40.jar"));
        assert_eq!(std::fs::read(&path).unwrap(), b"jar bytes");
        assert!(!dir.path().join("paper-1.21.1-40.jar.part").exists());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::new().with_response("/downloads/", CannedResponse::Status(500));
        let client = client(backend);

        let err = client
            .download("1.21.1", 40, "paper-1.21.1-40.jar", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, PaperError::Status { status: 500, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_download_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::new();
        let client = client(backend);

        let err = client
            .download("1.21.1", 40, "../escape.jar", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PaperError::InvalidResponse { .. }));
    }
}
