//! Classification of raw server console lines.
//!
//! Everything here is pure. A line that does not match one of the known
//! shapes exactly is [`LogEvent::Plain`]; nothing in this module fails.

mod ansi;

pub use ansi::strip_control_sequences;

/// Trailer printed when a non-whitelisted player is disconnected.
pub const WHITELIST_REJECTION_MARKER: &str = "): You are not whitelisted on this server!";

/// Separator between the log prefix and the message body.
const BODY_SEPARATOR: &str = "]: ";

/// Structured meaning of one console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// Nothing the session tracker cares about.
    Plain,
    /// The server resolved a player's UUID (Java) or XUID-derived UUID
    /// (Floodgate) ahead of the join.
    IdentifierResolved {
        username: String,
        identifier: String,
    },
    Joined {
        username: String,
    },
    Left {
        username: String,
    },
    /// A connection was refused because the player is not whitelisted.
    WhitelistRejected {
        username: String,
    },
}

impl LogEvent {
    /// Whether the event changes session state.
    pub const fn is_session_event(&self) -> bool {
        !matches!(self, Self::Plain)
    }
}

/// Strip control sequences from `raw` and classify the result.
pub fn parse_line(raw: &str) -> LogEvent {
    classify(&strip_control_sequences(raw))
}

/// Classify an already stripped line.
pub fn classify(line: &str) -> LogEvent {
    if let Some(username) = rejected_username(line) {
        return LogEvent::WhitelistRejected { username };
    }

    let tokens: Vec<&str> = message_body(line).split_whitespace().collect();
    match tokens.as_slice() {
        [user, "joined", "the", "game"] => LogEvent::Joined {
            username: (*user).to_string(),
        },
        [user, "left", "the", "game"] => LogEvent::Left {
            username: (*user).to_string(),
        },
        ["UUID", "of", "player", user, "is", id] => LogEvent::IdentifierResolved {
            username: (*user).to_string(),
            identifier: (*id).to_string(),
        },
        _ => floodgate_login(&tokens).unwrap_or(LogEvent::Plain),
    }
}

/// The message part of a console line.
///
/// Text after the first `]: `; failing that, text after the last `] `;
/// failing that, the whole line.
pub fn message_body(line: &str) -> &str {
    if let Some(idx) = line.find(BODY_SEPARATOR) {
        return &line[idx + BODY_SEPARATOR.len()..];
    }
    line.rfind("] ").map_or(line, |idx| &line[idx + 2..])
}

/// Username of a whitelist rejection line, if `line` is one.
///
/// The part before `): ` holds `Disconnecting <name> (/<address>`; the
/// name is the second token of its body.
pub fn rejected_username(line: &str) -> Option<String> {
    if !line.contains(WHITELIST_REJECTION_MARKER) {
        return None;
    }
    let (head, _) = line.split_once("): ")?;
    let token = message_body(head).split_whitespace().nth(1)?;
    Some(profile_name(token).to_string())
}

/// Older servers print the whole `GameProfile[...,name=<n>,...]` in place of
/// the name.
fn profile_name(token: &str) -> &str {
    token
        .split_once("name=")
        .map_or(token, |(_, rest)| rest.split([',', ']']).next().unwrap_or(rest))
}

/// `[floodgate] Floodgate player logged in as <user> joined (UUID: <id>)`
fn floodgate_login(tokens: &[&str]) -> Option<LogEvent> {
    let tokens = match tokens.first() {
        Some(tag) if tag.starts_with('[') && tag.ends_with(']') => &tokens[1..],
        _ => tokens,
    };
    match tokens {
        ["Floodgate", "player", "logged", "in", "as", user, "joined", "(UUID:", id] => {
            let identifier = id.trim_end_matches(')');
            (!identifier.is_empty()).then(|| LogEvent::IdentifierResolved {
                username: (*user).to_string(),
                identifier: identifier.to_string(),
            })
        }
        _ => None,
    }
}
