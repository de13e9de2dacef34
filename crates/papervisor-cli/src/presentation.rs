//! Terminal formatting helpers. Format-only, no domain logic.

use papervisor_core::{OnlinePlayer, PlayerFileEntry, RejectedPlayer, Vitals};

/// Truncates a string to at most `max_len` characters, adding "..." if needed.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Human readable byte count using binary units.
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub fn format_vitals(vitals: &Vitals) -> String {
    format!(
        "{} | CPU {:.1}% | RAM {} (heap {}) | {} player(s) online",
        vitals.status,
        vitals.cpu,
        format_bytes(vitals.ram),
        vitals.total_memory,
        vitals.players
    )
}

pub fn format_players(players: &[OnlinePlayer]) -> String {
    if players.is_empty() {
        return "No players online".to_string();
    }
    let names: Vec<&str> = players.iter().map(|p| p.username.as_str()).collect();
    format!("Online ({}): {}", players.len(), names.join(", "))
}

pub fn print_entries(entries: &[PlayerFileEntry]) {
    if entries.is_empty() {
        println!("No entries.");
        return;
    }
    println!("{:<17} {:<37} Details", "Name", "UUID");
    print_separator(80);
    for entry in entries {
        let details = entry
            .reason
            .as_deref()
            .map(|reason| format!("reason: {reason}"))
            .or_else(|| entry.level.map(|level| format!("level {level}")))
            .unwrap_or_default();
        println!(
            "{:<17} {:<37} {}",
            truncate_string(&entry.name, 16),
            entry.uuid,
            details
        );
    }
}

pub fn print_rejected(players: &[RejectedPlayer]) {
    if players.is_empty() {
        println!("No rejected connections recorded.");
        return;
    }
    println!("{:<17} {:>6}  Last seen", "Name", "Count");
    print_separator(50);
    for player in players {
        println!(
            "{:<17} {:>6}  {}",
            truncate_string(&player.username, 16),
            player.count,
            player.last_seen.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papervisor_core::ServerStatus;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Steve", 10), "Steve");
        assert_eq!(truncate_string("VeryLongPlayerName", 8), "VeryL...");
        assert_eq!(truncate_string("ÄÖÜäöüßéè", 5), "ÄÖ...");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }

    #[test]
    fn test_format_vitals_and_players() {
        let players = vec![OnlinePlayer::new("Steve", "")];
        let vitals = Vitals::idle(ServerStatus::Stopped, "2048M", players.clone());
        assert_eq!(
            format_vitals(&vitals),
            "Stopped | CPU 0.0% | RAM 0 B (heap 2048M) | 1 player(s) online"
        );
        assert_eq!(format_players(&players), "Online (1): Steve");
        assert_eq!(format_players(&[]), "No players online");
    }
}
