//! URL construction helpers.
//!
//! Every user-supplied piece (version, file name, player name) is appended
//! as a single encoded path segment.

use url::Url;

use crate::config::PaperClientConfig;
use crate::error::{PaperError, PaperResult};

fn with_segments(base: &Url, segments: &[&str]) -> PaperResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| PaperError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `/v2/projects/<project>/versions/<version>/builds`
pub fn build_builds_url(config: &PaperClientConfig, version: &str) -> PaperResult<Url> {
    with_segments(
        &config.paper_api,
        &["v2", "projects", &config.project, "versions", version, "builds"],
    )
}

/// `/v2/projects/<project>/versions/<version>/builds/<build>/downloads/<file>`
pub fn build_download_url(
    config: &PaperClientConfig,
    version: &str,
    build: u32,
    filename: &str,
) -> PaperResult<Url> {
    let build = build.to_string();
    with_segments(
        &config.paper_api,
        &[
            "v2",
            "projects",
            &config.project,
            "versions",
            version,
            "builds",
            &build,
            "downloads",
            filename,
        ],
    )
}

/// `/users/profiles/minecraft/<name>`
pub fn build_mojang_profile_url(config: &PaperClientConfig, name: &str) -> PaperResult<Url> {
    with_segments(
        &config.mojang_api,
        &["users", "profiles", "minecraft", name],
    )
}

/// `/v2/xbox/xuid/<gamertag>`
pub fn build_geyser_xuid_url(config: &PaperClientConfig, gamertag: &str) -> PaperResult<Url> {
    with_segments(&config.geyser_api, &["v2", "xbox", "xuid", gamertag])
}
