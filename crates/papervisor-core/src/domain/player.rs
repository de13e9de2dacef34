//! Player records: the live roster, the server's JSON player files and
//! rejected connection attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A player currently believed to be connected, derived from log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlinePlayer {
    /// Username exactly as printed by the server.
    pub username: String,
    /// Java UUID or Bedrock XUID resolved before the join, empty if unknown.
    pub identifier: String,
}

impl OnlinePlayer {
    pub fn new(username: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            identifier: identifier.into(),
        }
    }
}

/// One entry of `whitelist.json`, `banned-players.json` or `ops.json`.
///
/// Banned and op entries carry extra fields; they are optional so one type
/// reads all three files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFileEntry {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

/// Which of the server's player files to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerList {
    Whitelist,
    Banned,
    Ops,
}

impl PlayerList {
    /// File name inside the server working directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist.json",
            Self::Banned => "banned-players.json",
            Self::Ops => "ops.json",
        }
    }
}

/// A username that tried to join while not whitelisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedPlayer {
    pub username: String,
    /// Number of rejected attempts seen so far.
    pub count: i64,
    pub last_seen: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banned_entry_deserializes_optional_fields() {
        let json = r#"[{
            "uuid": "8667ba71-b85a-4004-af54-457a9734eed7",
            "name": "Steve",
            "created": "2024-01-01 10:00:00 +0000",
            "source": "Server",
            "expires": "forever",
            "reason": "griefing"
        }]"#;
        let entries: Vec<PlayerFileEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reason.as_deref(), Some("griefing"));
        assert_eq!(entries[0].level, None);
    }

    #[test]
    fn test_whitelist_entry_serializes_without_empty_fields() {
        let entry = PlayerFileEntry {
            uuid: "abc".into(),
            name: "Alex".into(),
            created: None,
            source: None,
            expires: None,
            reason: None,
            level: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"uuid":"abc","name":"Alex"}"#);
    }

    #[test]
    fn test_player_list_file_names() {
        assert_eq!(PlayerList::Whitelist.file_name(), "whitelist.json");
        assert_eq!(PlayerList::Banned.file_name(), "banned-players.json");
        assert_eq!(PlayerList::Ops.file_name(), "ops.json");
    }
}
