//! Player identity lookups against Mojang and the Geyser global API.

use crate::config::PaperClientConfig;
use crate::error::{PaperError, PaperResult};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::{MojangProfile, XuidResponse};
use crate::url::{build_geyser_xuid_url, build_mojang_profile_url};

/// Resolves Java usernames to UUIDs and Bedrock gamertags to XUIDs.
pub struct IdentityClient<B: HttpBackend = ReqwestBackend> {
    backend: B,
    config: PaperClientConfig,
}

pub type DefaultIdentityClient = IdentityClient<ReqwestBackend>;

impl IdentityClient<ReqwestBackend> {
    pub fn new(config: PaperClientConfig) -> PaperResult<Self> {
        let backend = ReqwestBackend::new(&config)?;
        Ok(Self { backend, config })
    }
}

impl<B: HttpBackend> IdentityClient<B> {
    pub const fn with_backend(backend: B, config: PaperClientConfig) -> Self {
        Self { backend, config }
    }

    /// Mojang UUID of a Java player, undashed as the API returns it.
    pub async fn profile_id(&self, username: &str) -> PaperResult<String> {
        let url = build_mojang_profile_url(&self.config, username)?;
        let profile: MojangProfile = self.backend.get_json(&url).await?;
        if profile.id.is_empty() {
            return Err(PaperError::InvalidResponse {
                message: format!("profile for {username} has no id"),
            });
        }
        Ok(profile.id)
    }

    /// XUID of a Bedrock gamertag as a decimal string.
    pub async fn xuid(&self, gamertag: &str) -> PaperResult<String> {
        let gamertag = bare_gamertag(gamertag);
        let url = build_geyser_xuid_url(&self.config, gamertag)?;
        let response: XuidResponse = self.backend.get_json(&url).await?;
        response
            .xuid
            .map(|xuid| xuid.to_string())
            .ok_or_else(|| PaperError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

/// Strip the `.`/`*` markers Floodgate and operators put in front of
/// Bedrock names.
pub fn bare_gamertag(gamertag: &str) -> &str {
    gamertag.trim_start_matches(['.', '*'])
}
