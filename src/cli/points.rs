//! Points, stats and reset commands

use anyhow::{Result, bail};

use edoquest::{GamificationEngine, UserId};

use super::print_json;
use crate::cli::achievements::print_unlocked;

pub fn credit(engine: &GamificationEngine, user_id: UserId, points: i64, json: bool) -> Result<()> {
    let outcome = engine.credit(user_id, points)?;
    if json {
        return print_json(&outcome);
    }

    let balance = &outcome.balance;
    println!("User #{}: {} -> {} points", user_id, balance.previous_points, balance.points);
    if let Some(up) = balance.level_up() {
        println!("Level up: {} -> {}", up.old_level, up.new_level);
    }
    print_unlocked(&outcome.unlocked);
    Ok(())
}

pub fn stats(engine: &GamificationEngine, user_id: UserId, json: bool) -> Result<()> {
    let stats = engine.stats(user_id)?;
    if json {
        return print_json(&stats);
    }

    println!("Chapters completed:    {}", stats.completed_chapters);
    println!("Quizzes completed:     {}", stats.completed_quizzes);
    println!("Quiz attempts:         {}", stats.quiz_attempts);
    println!("Points:                {}", stats.total_points);
    println!("Level:                 {}", stats.current_level);
    println!("Achievements:          {}", stats.achievements_unlocked);
    println!("Days since joined:     {}", stats.days_since_joined);
    Ok(())
}

pub fn reset(engine: &GamificationEngine, yes: bool) -> Result<()> {
    if !yes {
        bail!("This deletes all progress, quiz results and achievements. Re-run with --yes to confirm.");
    }
    engine.reset_activity()?;
    println!("All reader activity reset.");
    Ok(())
}
