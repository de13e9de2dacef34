//! Player identity lookup port.

use async_trait::async_trait;

use super::LookupError;

/// Resolves player names to platform identifiers.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Java edition UUID for a username.
    async fn java_uuid(&self, username: &str) -> Result<String, LookupError>;

    /// Xbox XUID for a Bedrock gamertag.
    ///
    /// Implementations strip leading `.` and `*` added by Floodgate or by
    /// operators before querying.
    async fn bedrock_xuid(&self, gamertag: &str) -> Result<String, LookupError>;
}
