//! Quiz commands

use anyhow::Result;

use edoquest::{ChapterId, GamificationEngine, QuizId, UserId};

use super::{format_timestamp, print_json, truncate};
use crate::cli::achievements::print_unlocked;

pub fn list(engine: &GamificationEngine, chapter_id: ChapterId, json: bool) -> Result<()> {
    let quizzes = engine.get_quizzes_by_chapter(chapter_id)?;
    if json {
        return print_json(&quizzes);
    }
    if quizzes.is_empty() {
        println!("Chapter {} has no quizzes.", chapter_id);
        return Ok(());
    }

    for q in quizzes {
        println!("#{} ({} points) {}", q.id, q.points, q.question);
        for (idx, option) in q.options.iter().enumerate() {
            println!("    [{}] {}", idx, truncate(option, 70));
        }
    }
    Ok(())
}

pub fn submit(
    engine: &GamificationEngine,
    user_id: UserId,
    quiz_id: QuizId,
    option: usize,
    json: bool,
) -> Result<()> {
    let submission = engine.submit_answer(user_id, quiz_id, option)?;
    if json {
        return print_json(&submission);
    }

    let result = &submission.result;
    if !result.is_correct {
        println!("Wrong answer.");
        if let Some(explanation) = engine.get_quiz(quiz_id)?.explanation {
            println!("{}", explanation);
        }
    } else if result.credited {
        println!("Correct! +{} points", result.points_earned);
    } else {
        println!("Correct! (already credited, no points)");
    }

    if let Some(balance) = &submission.balance {
        println!("Total: {} points ({})", balance.points, balance.level);
        if let Some(up) = balance.level_up() {
            println!("Level up: {} -> {}", up.old_level, up.new_level);
        }
    }
    print_unlocked(&submission.unlocked);
    Ok(())
}

pub fn history(
    engine: &GamificationEngine,
    user_id: UserId,
    quiz_id: Option<QuizId>,
    json: bool,
) -> Result<()> {
    let results = engine.quiz_results(user_id, quiz_id)?;
    if json {
        return print_json(&results);
    }
    if results.is_empty() {
        println!("No quiz attempts.");
        return Ok(());
    }

    println!(
        "{:<6} {:<6} {:<8} {:<8} {:<8} {:<18}",
        "QUIZ", "OPTION", "CORRECT", "POINTS", "CREDITED", "WHEN"
    );
    println!("{}", "-".repeat(58));
    for r in results {
        println!(
            "{:<6} {:<6} {:<8} {:<8} {:<8} {:<18}",
            r.quiz_id,
            r.selected_option,
            if r.is_correct { "yes" } else { "no" },
            r.points_earned,
            if r.credited { "yes" } else { "no" },
            format_timestamp(r.created_at),
        );
    }
    Ok(())
}
