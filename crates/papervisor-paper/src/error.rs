//! Internal error types for registry and identity requests.
//!
//! These errors stay inside `papervisor-paper` and are mapped to core port
//! errors at the boundary.

use thiserror::Error;

/// Result type alias for client operations.
pub type PaperResult<T> = Result<T, PaperError>;

#[derive(Debug, Error)]
pub enum PaperError {
    /// The server answered with a non-success status (or 204 where a body
    /// was expected).
    #[error("Request failed with status {status}: {url}")]
    Status { status: u16, url: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// A base URL cannot have path segments appended.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaperError {
    /// 404 and 204 both mean "no such entry" for the upstream APIs.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404 | 204, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let error = PaperError::Status {
            status: 503,
            url: "https://api.papermc.io/v2/projects/paper".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("api.papermc.io"));
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_not_found_statuses() {
        for status in [404, 204] {
            let error = PaperError::Status {
                status,
                url: String::new(),
            };
            assert!(error.is_not_found());
        }
    }
}
