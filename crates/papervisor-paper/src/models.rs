//! Wire types for the build registry and identity APIs.
//!
//! Only the fields papervisor reads are declared; everything else in the
//! responses is ignored by serde.

use serde::Deserialize;

/// Response of `GET /v2/projects/<project>/versions/<version>/builds`.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildsResponse {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub builds: Vec<Build>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Build {
    pub build: u32,
    /// `default` or `experimental`.
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub downloads: Downloads,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Downloads {
    /// The server jar. Absent on broken or partial builds.
    #[serde(default)]
    pub application: Option<Download>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Download {
    pub name: String,
    pub sha256: String,
}

impl BuildsResponse {
    /// The highest-numbered build that ships a server jar.
    pub fn latest(&self) -> Option<(&Build, &Download)> {
        self.builds
            .iter()
            .filter_map(|build| build.downloads.application.as_ref().map(|app| (build, app)))
            .max_by_key(|(build, _)| build.build)
    }
}

/// Response of `GET /users/profiles/minecraft/<name>`.
#[derive(Debug, Clone, Deserialize)]
pub struct MojangProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Response of `GET /v2/xbox/xuid/<gamertag>`.
#[derive(Debug, Clone, Deserialize)]
pub struct XuidResponse {
    #[serde(default)]
    pub xuid: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILDS: &str = r#"{
        "project_id": "paper",
        "project_name": "Paper",
        "version": "1.21.1",
        "builds": [
            {"build": 118, "time": "2024-09-20T10:00:00Z", "channel": "default", "promoted": false,
             "changes": [], "downloads": {"application": {"name": "paper-1.21.1-118.jar", "sha256": "aa"}}},
            {"build": 121, "time": "2024-09-25T10:00:00Z", "channel": "experimental", "promoted": false,
             "changes": [], "downloads": {}},
            {"build": 119, "time": "2024-09-22T10:00:00Z", "channel": "default", "promoted": false,
             "changes": [{"commit": "abc", "summary": "Fix", "message": "Fix"}],
             "downloads": {"application": {"name": "paper-1.21.1-119.jar", "sha256": "bb"},
                           "mojang-mappings": {"name": "x.jar", "sha256": "cc"}}}
        ]
    }"#;

    #[test]
    fn test_latest_skips_builds_without_jar() {
        let response: BuildsResponse = serde_json::from_str(BUILDS).unwrap();
        assert_eq!(response.builds.len(), 3);

        let (build, download) = response.latest().unwrap();
        assert_eq!(build.build, 119);
        assert_eq!(download.name, "paper-1.21.1-119.jar");
        assert_eq!(download.sha256, "bb");
    }

    #[test]
    fn test_latest_of_empty_list() {
        let response: BuildsResponse =
            serde_json::from_str(r#"{"project_id": "paper", "version": "9.9", "builds": []}"#)
                .unwrap();
        assert!(response.latest().is_none());
    }

    #[test]
    fn test_identity_payloads() {
        let profile: MojangProfile =
            serde_json::from_str(r#"{"id": "069a79f444e94726a5befca90e38aaf5", "name": "Notch"}"#)
                .unwrap();
        assert_eq!(profile.id, "069a79f444e94726a5befca90e38aaf5");

        let xuid: XuidResponse = serde_json::from_str(r#"{"xuid": 2535405290209063}"#).unwrap();
        assert_eq!(xuid.xuid, Some(2_535_405_290_209_063));

        let empty: XuidResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.xuid.is_none());
    }
}
