//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{PaperError, PaperResult};

pub const DEFAULT_PAPER_API_URL: &str = "https://api.papermc.io";
pub const DEFAULT_MOJANG_API_URL: &str = "https://api.mojang.com";
pub const DEFAULT_GEYSER_API_URL: &str = "https://api.geysermc.org";

/// Endpoints and transport limits for the HTTP clients.
#[derive(Debug, Clone)]
pub struct PaperClientConfig {
    /// Root of the build registry, without the `/v2` part.
    pub paper_api: Url,
    /// Registry project, `paper` for Paper servers.
    pub project: String,
    pub mojang_api: Url,
    pub geyser_api: Url,
    /// Timeout for metadata and identity requests.
    pub request_timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u8,
    /// Base delay in milliseconds for exponential backoff.
    pub retry_base_delay_ms: u64,
    pub user_agent: String,
}

impl PaperClientConfig {
    /// Configuration for a registry at `paper_api` and the given project.
    pub fn new(paper_api: &str, project: impl Into<String>) -> PaperResult<Self> {
        Ok(Self {
            paper_api: base_url(paper_api)?,
            project: project.into(),
            mojang_api: base_url(DEFAULT_MOJANG_API_URL)?,
            geyser_api: base_url(DEFAULT_GEYSER_API_URL)?,
            request_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay_ms: 500,
            user_agent: concat!("papervisor/", env!("CARGO_PKG_VERSION")).to_string(),
        })
    }

    /// Override the identity endpoints, for tests and mirrors.
    pub fn with_identity_apis(mut self, mojang: &str, geyser: &str) -> PaperResult<Self> {
        self.mojang_api = base_url(mojang)?;
        self.geyser_api = base_url(geyser)?;
        Ok(self)
    }
}

fn base_url(raw: &str) -> PaperResult<Url> {
    let url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(PaperError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}
