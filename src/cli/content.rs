//! Content import and chapter listing

use std::path::Path;

use anyhow::{Context, Result};

use edoquest::GamificationEngine;

use super::{print_json, truncate};

pub fn import(engine: &GamificationEngine, file: &Path, json: bool) -> Result<()> {
    let summary = engine
        .import_file(file)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    if json {
        return print_json(&summary);
    }
    println!(
        "Imported {} chapter(s) and {} quiz(zes) from {}",
        summary.chapters,
        summary.quizzes,
        file.display()
    );
    Ok(())
}

pub fn chapters(engine: &GamificationEngine, json: bool) -> Result<()> {
    let chapters = engine.list_chapters()?;
    if json {
        return print_json(&chapters);
    }
    if chapters.is_empty() {
        println!("No chapters imported.");
        return Ok(());
    }

    println!("{:<6} {:<6} {:<50}", "ID", "NUM", "TITLE");
    println!("{}", "-".repeat(62));
    for c in chapters {
        println!("{:<6} {:<6} {:<50}", c.id, c.number, truncate(&c.title, 48));
    }
    Ok(())
}
