//! Rejected connection store port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::RejectedPlayer;

/// Advisory list of usernames that were refused for not being whitelisted.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait RejectedPlayerRepository: Send + Sync {
    /// Insert `username` with a count of one, or bump its count and
    /// last-seen time.
    async fn upsert(&self, username: &str) -> Result<(), RepositoryError>;

    /// Most recently seen entries first.
    async fn list(&self) -> Result<Vec<RejectedPlayer>, RepositoryError>;

    /// Forget `username`. Deleting an unknown name is not an error.
    async fn delete(&self, username: &str) -> Result<(), RepositoryError>;
}
