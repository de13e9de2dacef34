//! File name checks for names that come from configuration or from remote
//! registries.

use std::path::{Component, Path};

/// Whether `name` is a single, non-empty path component.
///
/// Rejects separators, `.`, `..` and absolute paths so the name can be
/// joined onto a working directory without escaping it.
pub fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
