//! Terminal control sequence stripping.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// CSI and OSC escapes, two-byte escapes, Minecraft `§` color codes and the
/// remaining C0 controls (tab is kept).
static CONTROL_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]|§[0-9a-fk-orA-FK-OR]|[\x00-\x08\x0b-\x1f\x7f]",
    )
    .expect("control sequence pattern is valid")
});

/// Remove color and cursor control sequences from a console line.
///
/// Borrows the input when there is nothing to strip.
pub fn strip_control_sequences(line: &str) -> Cow<'_, str> {
    CONTROL_SEQUENCE.replace_all(line, "")
}
