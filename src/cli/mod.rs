//! CLI command implementations

pub mod achievements;
pub mod content;
pub mod init;
pub mod points;
pub mod progress;
pub mod quiz;
pub mod serve;
pub mod user;

use anyhow::{Context, Result};
use serde::Serialize;

use edoquest::{Config, GamificationEngine};

/// Open the engine on the configured database
pub fn open_engine(config: &Config) -> Result<GamificationEngine> {
    let path = config.db_path();
    GamificationEngine::open(config)
        .with_context(|| format!("Failed to open database at {}", path.display()))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Truncate on a char boundary, marking the cut with "..."
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub(crate) fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
