//! edoquest - reading progress and gamification for the Edo reading platform
//!
//! Readers work through serialized chapters and answer comprehension quizzes.
//! This crate owns everything that turns that activity into durable state:
//!
//! 1. **Progress**: one record per (user, chapter), merged field by field so a
//!    later "chapter finished" never erases an earlier reading time or quiz score.
//! 2. **Quiz results**: every attempt is kept; only the first correct attempt per
//!    quiz credits points (configurable, see [`CreditPolicy`]).
//! 3. **Points & levels**: a per-user counter that only grows, with the level label
//!    always derived from the total through a fixed threshold table.
//! 4. **Achievements**: one-time milestones unlocked from aggregate counters.
//!
//! Content (chapters, quizzes) and accounts are collaborators; the engine reads
//! them and never edits content outside catalog import.

pub mod config;
pub mod error;
pub mod gamification;
pub mod http;

pub use config::Config;
pub use error::{EngineError, EngineResult};
pub use gamification::{
    ACHIEVEMENTS, Achievement, AchievementId, AchievementSnapshot, Chapter, ChapterId,
    ContentCatalog, CreditOutcome, CreditPolicy, GamificationEngine, ImportSummary, LedgerBalance, Level,
    LevelUp, PlayerLevel, ProgressPatch, ProgressRecord, ProgressUpdate, Quiz, QuizId,
    QuizResult, QuizSubmission, UnlockedAchievement, User, UserId, UserStats, level_for,
};
