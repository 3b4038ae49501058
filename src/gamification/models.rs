//! Data models for progress and gamification tracking
//!
//! Timestamps are milliseconds since the Unix epoch, as everywhere else in
//! the database.

use serde::{Deserialize, Serialize};

use super::levels::Level;
use crate::error::{EngineError, EngineResult};

pub type UserId = i64;
pub type ChapterId = i64;
pub type QuizId = i64;

/// A reader account (owned by the account subsystem)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub points: i64,
    /// Cached image of `points` through the level table
    pub level: String,
    pub created_at: i64,
    pub last_active_at: i64,
}

/// A chapter of the serialized novel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: ChapterId,
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// A comprehension quiz attached to a chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    #[serde(alias = "chapter_id")]
    pub chapter_id: ChapterId,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    #[serde(alias = "correct_answer")]
    pub correct_answer: usize,
    #[serde(default = "default_quiz_points")]
    pub points: i64,
    #[serde(default)]
    pub explanation: Option<String>,
}

fn default_quiz_points() -> i64 {
    10
}

/// Durable per-(user, chapter) reading state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub chapter_id: ChapterId,
    pub is_completed: bool,
    pub reading_time_seconds: Option<i64>,
    /// 0-100
    pub quiz_score: Option<i64>,
    /// First time the chapter was marked completed
    pub completed_at: Option<i64>,
    pub last_read_at: i64,
}

/// Partial update for a progress record.
///
/// Every field is optional; an absent field leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default, alias = "readingTime")]
    pub reading_time_seconds: Option<i64>,
    #[serde(default)]
    pub quiz_score: Option<i64>,
}

impl ProgressPatch {
    pub fn completed() -> Self {
        Self {
            is_completed: Some(true),
            ..Self::default()
        }
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.is_completed = Some(completed);
        self
    }

    pub fn with_reading_time(mut self, seconds: i64) -> Self {
        self.reading_time_seconds = Some(seconds);
        self
    }

    pub fn with_quiz_score(mut self, score: i64) -> Self {
        self.quiz_score = Some(score);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.is_completed.is_none()
            && self.reading_time_seconds.is_none()
            && self.quiz_score.is_none()
    }

    pub fn validate(&self) -> EngineResult<()> {
        if let Some(seconds) = self.reading_time_seconds {
            if seconds < 0 {
                return Err(EngineError::invalid(format!(
                    "reading time must not be negative (got {seconds})"
                )));
            }
        }
        if let Some(score) = self.quiz_score {
            if !(0..=100).contains(&score) {
                return Err(EngineError::invalid(format!(
                    "quiz score must be within 0..=100 (got {score})"
                )));
            }
        }
        Ok(())
    }
}

/// One quiz attempt (append-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub selected_option: usize,
    pub is_correct: bool,
    /// `quiz.points` when correct, 0 otherwise
    pub points_earned: i64,
    /// Whether this attempt actually moved the user's point total
    pub credited: bool,
    pub created_at: i64,
}

/// User point state after a credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerBalance {
    pub user_id: UserId,
    pub points: i64,
    pub level: String,
    pub previous_points: i64,
    pub previous_level: String,
}

/// A level up event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUp {
    pub old_level: String,
    pub new_level: String,
}

impl LedgerBalance {
    pub fn level_up(&self) -> Option<LevelUp> {
        let old_rank = Level::rank_of(&self.previous_level).unwrap_or(0);
        let new_rank = Level::rank_of(&self.level).unwrap_or(0);
        (new_rank > old_rank).then(|| LevelUp {
            old_level: self.previous_level.clone(),
            new_level: self.level.clone(),
        })
    }
}

/// Aggregate reader statistics (dashboard)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: UserId,
    pub completed_chapters: u32,
    /// Distinct quizzes answered correctly at least once
    pub completed_quizzes: u32,
    pub quiz_attempts: u32,
    pub total_points: i64,
    pub current_level: String,
    pub achievements_unlocked: u32,
    pub days_since_joined: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_validation() {
        assert!(ProgressPatch::default().validate().is_ok());
        assert!(ProgressPatch::default().with_quiz_score(100).validate().is_ok());
        assert!(ProgressPatch::default().with_quiz_score(0).validate().is_ok());
        assert!(ProgressPatch::default().with_quiz_score(101).validate().is_err());
        assert!(ProgressPatch::default().with_quiz_score(-1).validate().is_err());
        assert!(ProgressPatch::default().with_reading_time(-5).validate().is_err());
    }

    #[test]
    fn test_patch_from_client_json() {
        let patch: ProgressPatch =
            serde_json::from_str(r#"{"isCompleted": true, "readingTime": 320}"#).unwrap();
        assert_eq!(patch.is_completed, Some(true));
        assert_eq!(patch.reading_time_seconds, Some(320));
        assert_eq!(patch.quiz_score, None);

        let patch: ProgressPatch = serde_json::from_str(r#"{"quizScore": null}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_level_up_detection() {
        let balance = LedgerBalance {
            user_id: 1,
            points: 510,
            level: "Apprendista".to_string(),
            previous_points: 490,
            previous_level: "Novizio".to_string(),
        };
        let up = balance.level_up().unwrap();
        assert_eq!(up.new_level, "Apprendista");

        let same = LedgerBalance {
            previous_points: 500,
            previous_level: "Apprendista".to_string(),
            ..balance
        };
        assert!(same.level_up().is_none());
    }
}
