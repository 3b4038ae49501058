//! Reader account commands

use anyhow::Result;
use serde_json::json;

use edoquest::{GamificationEngine, UserId};

use super::{format_timestamp, print_json};

pub fn create(engine: &GamificationEngine, name: &str, json: bool) -> Result<()> {
    let user = engine.create_user(name)?;
    if json {
        return print_json(&user);
    }
    println!("Created user #{} ({})", user.id, user.display_name);
    Ok(())
}

pub fn show(engine: &GamificationEngine, user_id: UserId, json: bool) -> Result<()> {
    let user = engine.get_user(user_id)?;
    let level = engine.player_level(user_id)?;

    if json {
        return print_json(&json!({ "user": user, "level": level }));
    }

    println!("ID:            {}", user.id);
    println!("Name:          {}", user.display_name);
    println!("Points:        {}", user.points);
    println!("Level:         {} ({}/{})", level.label, level.rank, edoquest::Level::max_rank());
    if level.is_max_level() {
        println!("Next level:    - (highest level reached)");
    } else if let Some(missing) = level.points_to_next() {
        println!(
            "Next level:    {} points to go ({:.0}%)",
            missing,
            level.progress_to_next() * 100.0
        );
    }
    println!("Joined:        {}", format_timestamp(user.created_at));
    println!("Last active:   {}", format_timestamp(user.last_active_at));
    Ok(())
}
