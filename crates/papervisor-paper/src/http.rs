//! HTTP backend abstraction.
//!
//! The production backend uses reqwest and retries transient failures with
//! exponential backoff. Tests swap in [`testing::FakeBackend`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::config::PaperClientConfig;
use crate::error::{PaperError, PaperResult};

/// Minimal transport the clients need.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch JSON from a URL and deserialize it.
    ///
    /// A 204 response is reported as `PaperError::Status` since there is no
    /// body to decode.
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> PaperResult<T>;

    /// Stream the body of `url` into a new file at `dest`.
    ///
    /// Returns the number of bytes written.
    async fn download_to(&self, url: &Url, dest: &Path) -> PaperResult<u64>;
}

/// Production backend.
pub struct ReqwestBackend {
    /// Client for small JSON requests, with a total request timeout.
    client: reqwest::Client,
    /// Client for binary downloads. Only connecting is time-limited.
    download_client: reqwest::Client,
    max_retries: u8,
    retry_base_delay_ms: u64,
}

impl ReqwestBackend {
    pub fn new(config: &PaperClientConfig) -> PaperResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        let download_client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            download_client,
            max_retries: config.max_retries,
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
    }

    /// Fetch a URL with automatic retry for transient errors.
    async fn fetch_with_retry(
        &self,
        client: &reqwest::Client,
        url: &Url,
    ) -> PaperResult<reqwest::Response> {
        let mut last_error: Option<PaperError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(
                    self.retry_base_delay_ms * 2u64.pow(u32::from(attempt) - 1),
                );
                tracing::debug!(%url, attempt, ?delay, "Retrying request");
                tokio::time::sleep(delay).await;
            }

            match client.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let error = PaperError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    };
                    // 5xx and rate limiting are worth another try
                    let retryable = status.is_server_error() || status.as_u16() == 429;
                    if retryable && attempt < self.max_retries {
                        last_error = Some(error);
                        continue;
                    }
                    return Err(error);
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        last_error = Some(e.into());
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PaperError::InvalidResponse {
            message: "Unknown error during fetch".to_string(),
        }))
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> PaperResult<T> {
        let response = self.fetch_with_retry(&self.client, url).await?;
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Err(PaperError::Status {
                status: 204,
                url: url.to_string(),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn download_to(&self, url: &Url, dest: &Path) -> PaperResult<u64> {
        let response = self.fetch_with_retry(&self.download_client, url).await?;
        let total = response.content_length();

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;

        if let Some(total) = total {
            if written != total {
                return Err(PaperError::InvalidResponse {
                    message: format!("download truncated: {written} of {total} bytes"),
                });
            }
        }
        Ok(written)
    }
}
