//! Achievement commands

use anyhow::Result;

use edoquest::{ACHIEVEMENTS, GamificationEngine, UnlockedAchievement, UserId};

use super::{format_timestamp, print_json};

pub fn list(engine: &GamificationEngine, user_id: UserId, json: bool) -> Result<()> {
    let unlocked = engine.achievements(user_id)?;
    if json {
        return print_json(&unlocked);
    }

    println!("Achievements ({}/{}):\n", unlocked.len(), ACHIEVEMENTS.len());
    for a in ACHIEVEMENTS {
        match unlocked.iter().find(|u| u.achievement.id == a.id) {
            Some(u) => println!(
                "  [x] {:<22} {} ({})",
                a.name,
                a.description,
                format_timestamp(u.unlocked_at)
            ),
            None => println!("  [ ] {:<22} {}", a.name, a.description),
        }
    }
    Ok(())
}

pub fn refresh(engine: &GamificationEngine, user_id: UserId, json: bool) -> Result<()> {
    let unlocked = engine.refresh_achievements(user_id)?;
    if json {
        return print_json(&unlocked);
    }
    if unlocked.is_empty() {
        println!("Nothing new.");
    }
    print_unlocked(&unlocked);
    Ok(())
}

pub(crate) fn print_unlocked(unlocked: &[UnlockedAchievement]) {
    for u in unlocked {
        println!("Achievement unlocked: {}", u.achievement.name);
    }
}
