//! Operator input in `papervisor run`.
//!
//! Lines starting with `!` are supervisor meta-commands; anything else is
//! forwarded to the server console unchanged.

use std::fmt;

/// Prefix that marks a meta-command.
pub const META_PREFIX: char = '!';

/// Default number of lines shown by `!history`.
pub const DEFAULT_HISTORY_LINES: usize = 20;

/// One parsed line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorInput {
    /// Nothing to do (blank line).
    Empty,
    /// Forward to the server console.
    Console(String),
    Meta(MetaCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Help,
    Start,
    Stop,
    Restart,
    Status,
    Vitals,
    Players,
    History(usize),
    Update(String),
    Whitelist(String),
    Unwhitelist(String),
    Ban { name: String, reason: Option<String> },
    Unban(String),
    Op(String),
    Deop(String),
    Whitelisted,
    Banned,
    Ops,
    Rejected,
    Forget(String),
    Quit,
}

/// Why a meta-command could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Unknown(String),
    MissingArgument { command: &'static str, argument: &'static str },
    InvalidArgument { command: &'static str, value: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "Unknown command '!{name}', try !help"),
            Self::MissingArgument { command, argument } => {
                write!(f, "Usage: !{command} <{argument}>")
            }
            Self::InvalidArgument { command, value } => {
                write!(f, "Invalid argument for !{command}: {value}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Classify one line typed by the operator.
pub fn parse_input(line: &str) -> Result<OperatorInput, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(OperatorInput::Empty);
    }
    match line.strip_prefix(META_PREFIX) {
        Some(meta) => parse_meta(meta).map(OperatorInput::Meta),
        None => Ok(OperatorInput::Console(line.to_string())),
    }
}

fn parse_meta(input: &str) -> Result<MetaCommand, ParseError> {
    let mut words = input.split_whitespace();
    let name = words.next().unwrap_or_default().to_ascii_lowercase();

    let command = match name.as_str() {
        "help" | "?" => MetaCommand::Help,
        "start" => MetaCommand::Start,
        "stop" => MetaCommand::Stop,
        "restart" => MetaCommand::Restart,
        "status" => MetaCommand::Status,
        "vitals" => MetaCommand::Vitals,
        "players" => MetaCommand::Players,
        "history" => match words.next() {
            None => MetaCommand::History(DEFAULT_HISTORY_LINES),
            Some(count) => MetaCommand::History(count.parse().map_err(|_| {
                ParseError::InvalidArgument {
                    command: "history",
                    value: count.to_string(),
                }
            })?),
        },
        "update" => MetaCommand::Update(required(&mut words, "update", "version")?),
        "whitelist" => MetaCommand::Whitelist(required(&mut words, "whitelist", "player")?),
        "unwhitelist" => MetaCommand::Unwhitelist(required(&mut words, "unwhitelist", "player")?),
        "ban" => {
            let name = required(&mut words, "ban", "player")?;
            let reason = words.collect::<Vec<_>>().join(" ");
            MetaCommand::Ban {
                name,
                reason: (!reason.is_empty()).then_some(reason),
            }
        }
        "unban" => MetaCommand::Unban(required(&mut words, "unban", "player")?),
        "op" => MetaCommand::Op(required(&mut words, "op", "player")?),
        "deop" => MetaCommand::Deop(required(&mut words, "deop", "player")?),
        "whitelisted" => MetaCommand::Whitelisted,
        "banned" => MetaCommand::Banned,
        "ops" => MetaCommand::Ops,
        "rejected" => MetaCommand::Rejected,
        "forget" => MetaCommand::Forget(required(&mut words, "forget", "player")?),
        "quit" | "exit" => MetaCommand::Quit,
        _ => return Err(ParseError::Unknown(name)),
    };
    Ok(command)
}

fn required<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<String, ParseError> {
    words
        .next()
        .map(str::to_string)
        .ok_or(ParseError::MissingArgument { command, argument })
}

pub const HELP: &str = "\
Supervisor commands (anything else goes to the server console):
  !start | !stop | !restart | !status
  !vitals                 CPU, memory and players
  !players                players currently online
  !history [n]            last n console lines
  !update <version>       install the latest build of <version>
  !whitelist <player>     whitelist a Java or Bedrock player
  !unwhitelist <player>
  !ban <player> [reason]  | !unban <player>
  !op <player>            | !deop <player>
  !whitelisted | !banned | !ops   show the server's player files
  !rejected               players refused by the whitelist
  !forget <player>        drop a rejected player
  !quit                   stop the server and exit";
