//! Reading progress commands

use anyhow::Result;

use edoquest::{ChapterId, GamificationEngine, ProgressPatch, UserId};

use super::{format_timestamp, print_json};
use crate::cli::achievements::print_unlocked;

pub fn show(engine: &GamificationEngine, user_id: UserId, json: bool) -> Result<()> {
    let records = engine.get_progress(user_id)?;
    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No progress recorded.");
        return Ok(());
    }

    println!(
        "{:<8} {:<10} {:<10} {:<8} {:<18}",
        "CHAPTER", "COMPLETED", "READ (s)", "SCORE", "LAST READ"
    );
    println!("{}", "-".repeat(58));
    for r in records {
        println!(
            "{:<8} {:<10} {:<10} {:<8} {:<18}",
            r.chapter_id,
            if r.is_completed { "yes" } else { "no" },
            r.reading_time_seconds.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
            r.quiz_score.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
            format_timestamp(r.last_read_at),
        );
    }
    Ok(())
}

pub fn update(
    engine: &GamificationEngine,
    user_id: UserId,
    chapter_id: ChapterId,
    patch: ProgressPatch,
    json: bool,
) -> Result<()> {
    if patch.is_empty() {
        tracing::info!("No fields given, only touching the last-read time");
    }
    let update = engine.upsert_progress(user_id, chapter_id, &patch)?;
    if json {
        return print_json(&update);
    }

    let r = &update.record;
    println!(
        "Chapter {}: {}, reading time {}, quiz score {}",
        r.chapter_id,
        if r.is_completed { "completed" } else { "in progress" },
        r.reading_time_seconds.map(|s| format!("{}s", s)).unwrap_or_else(|| "-".into()),
        r.quiz_score.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
    );
    if let Some(balance) = &update.balance {
        println!("+{} points (total {})", balance.points - balance.previous_points, balance.points);
        if let Some(up) = balance.level_up() {
            println!("Level up: {} -> {}", up.old_level, up.new_level);
        }
    }
    print_unlocked(&update.unlocked);
    Ok(())
}
