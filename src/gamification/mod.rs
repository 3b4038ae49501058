//! Progress tracking and gamification engine
//!
//! ```text
//!   upsert_progress ──► ProgressStore ─┐
//!                                      ├─► PointsLedger ──► AchievementEvaluator
//!   submit_answer ──► QuizResultProcessor ┘        (levels)
//! ```
//!
//! Every mutating call runs as one immediate SQLite transaction: the record
//! write, any credit and the achievement evaluation that follows it commit
//! together or not at all.

mod achievements;
mod content;
mod db;
mod ledger;
mod levels;
mod models;
mod progress;
mod quiz;
mod stats;
mod users;

pub use achievements::{
    ACHIEVEMENTS, Achievement, AchievementId, AchievementSnapshot, UnlockCondition,
    UnlockedAchievement,
};
pub use content::{ContentCatalog, ImportSummary};
pub use db::GamificationDb;
pub use levels::{LEVELS, Level, PlayerLevel, level_for};
pub use models::{
    Chapter, ChapterId, LedgerBalance, LevelUp, ProgressPatch, ProgressRecord, Quiz, QuizId,
    QuizResult, User, UserId, UserStats,
};
pub use quiz::{CreditPolicy, QuizSubmission};

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use achievements::AchievementEvaluator;
use content::ContentStore;
use ledger::PointsLedger;
use progress::ProgressStore;
use quiz::{QuizResultProcessor, QuizResultStore};
use stats::StatsQuery;
use users::UserStore;

use crate::config::{Config, EngineSettings};
use crate::error::EngineResult;

/// Outcome of a progress upsert
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub record: ProgressRecord,
    /// Present when this call completed the chapter for the first time and
    /// the completion reward is enabled
    pub balance: Option<LedgerBalance>,
    pub unlocked: Vec<UnlockedAchievement>,
}

/// Outcome of a direct points credit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditOutcome {
    pub balance: LedgerBalance,
    pub unlocked: Vec<UnlockedAchievement>,
}

/// Facade over the stores; cheap to clone and share between threads
#[derive(Clone)]
pub struct GamificationEngine {
    db: GamificationDb,
    settings: EngineSettings,
}

impl GamificationEngine {
    /// Open the database named by the config
    pub fn open(config: &Config) -> EngineResult<Self> {
        let db = GamificationDb::open(&config.db_path(), config.storage.busy_timeout())?;
        Ok(Self::new(db, config.engine.clone()))
    }

    /// Engine over a private in-memory database
    pub fn in_memory(settings: EngineSettings) -> EngineResult<Self> {
        Ok(Self::new(GamificationDb::open_in_memory()?, settings))
    }

    pub fn new(db: GamificationDb, settings: EngineSettings) -> Self {
        Self { db, settings }
    }

    fn write<T, F>(&self, op: F) -> EngineResult<T>
    where
        F: FnMut(&rusqlite::Transaction<'_>) -> EngineResult<T>,
    {
        self.db.write(self.settings.max_conflict_retries, op)
    }

    // ---------------------------------------------------------------
    // Accounts and content
    // ---------------------------------------------------------------

    pub fn create_user(&self, display_name: &str) -> EngineResult<User> {
        let now = now_ms();
        self.write(|tx| UserStore::new(tx).create(display_name, now))
    }

    pub fn get_user(&self, user_id: UserId) -> EngineResult<User> {
        self.db.read(|conn| UserStore::new(conn).require(user_id))
    }

    pub fn list_chapters(&self) -> EngineResult<Vec<Chapter>> {
        self.db.read(|conn| ContentStore::new(conn).list_chapters())
    }

    pub fn get_chapter(&self, chapter_id: ChapterId) -> EngineResult<Chapter> {
        self.db.read(|conn| ContentStore::new(conn).require_chapter(chapter_id))
    }

    pub fn get_quiz(&self, quiz_id: QuizId) -> EngineResult<Quiz> {
        self.db.read(|conn| ContentStore::new(conn).require_quiz(quiz_id))
    }

    /// Quizzes of a chapter; an unknown chapter is `NotFound`, not empty
    pub fn get_quizzes_by_chapter(&self, chapter_id: ChapterId) -> EngineResult<Vec<Quiz>> {
        self.db.read(|conn| {
            let content = ContentStore::new(conn);
            content.require_chapter(chapter_id)?;
            content.get_quizzes_by_chapter(chapter_id)
        })
    }

    pub fn import_catalog(&self, catalog: &ContentCatalog) -> EngineResult<ImportSummary> {
        self.write(|tx| ContentStore::new(tx).import(catalog))
    }

    pub fn import_file(&self, path: &Path) -> EngineResult<ImportSummary> {
        let catalog = ContentCatalog::from_file(path)?;
        self.import_catalog(&catalog)
    }

    // ---------------------------------------------------------------
    // Progress
    // ---------------------------------------------------------------

    /// Merge `patch` into the (user, chapter) record.
    ///
    /// The first completion of a chapter credits the configured completion
    /// reward; achievements are evaluated against the post-write state.
    pub fn upsert_progress(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
        patch: &ProgressPatch,
    ) -> EngineResult<ProgressUpdate> {
        patch.validate()?;
        let now = now_ms();
        let reward = self.settings.chapter_completion_points;

        self.write(|tx| {
            UserStore::new(tx).require(user_id)?;
            ContentStore::new(tx).require_chapter(chapter_id)?;

            let progress = ProgressStore::new(tx);
            let completed_before = progress
                .get(user_id, chapter_id)?
                .is_some_and(|r| r.completed_at.is_some());
            let record = progress.upsert(user_id, chapter_id, patch, now)?;

            let first_completion = !completed_before && record.completed_at.is_some();
            let balance = if first_completion && reward > 0 {
                Some(PointsLedger::new(tx).credit(user_id, reward, now)?)
            } else {
                UserStore::new(tx).touch(user_id, now)?;
                None
            };

            let snapshot = StatsQuery::new(tx).snapshot(user_id)?;
            let unlocked = AchievementEvaluator::new(tx).evaluate(user_id, &snapshot, now)?;

            debug!(user_id, chapter_id, first_completion, "Progress updated");
            Ok(ProgressUpdate {
                record,
                balance,
                unlocked,
            })
        })
    }

    /// All progress records of a user, by chapter id
    pub fn get_progress(&self, user_id: UserId) -> EngineResult<Vec<ProgressRecord>> {
        self.db.read(|conn| {
            UserStore::new(conn).require(user_id)?;
            ProgressStore::new(conn).list_for_user(user_id)
        })
    }

    // ---------------------------------------------------------------
    // Quizzes, points, achievements
    // ---------------------------------------------------------------

    pub fn submit_answer(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
        selected_option: usize,
    ) -> EngineResult<QuizSubmission> {
        let now = now_ms();
        let policy = self.settings.credit_policy;
        self.write(|tx| QuizResultProcessor::new(tx, policy).submit(user_id, quiz_id, selected_option, now))
    }

    /// Attempts of a user, oldest first, optionally narrowed to one quiz
    pub fn quiz_results(&self, user_id: UserId, quiz_id: Option<QuizId>) -> EngineResult<Vec<QuizResult>> {
        self.db.read(|conn| {
            UserStore::new(conn).require(user_id)?;
            QuizResultStore::new(conn).list(user_id, quiz_id)
        })
    }

    /// Add `delta >= 0` points and unlock whatever the new total satisfies
    pub fn credit(&self, user_id: UserId, delta: i64) -> EngineResult<CreditOutcome> {
        let now = now_ms();
        self.write(|tx| {
            let balance = PointsLedger::new(tx).credit(user_id, delta, now)?;
            let snapshot = StatsQuery::new(tx).snapshot(user_id)?;
            let unlocked = AchievementEvaluator::new(tx).evaluate(user_id, &snapshot, now)?;
            Ok(CreditOutcome { balance, unlocked })
        })
    }

    /// Unlock what `snapshot` satisfies; returns the new unlocks only
    pub fn evaluate(
        &self,
        user_id: UserId,
        snapshot: &AchievementSnapshot,
    ) -> EngineResult<Vec<UnlockedAchievement>> {
        let now = now_ms();
        self.write(|tx| {
            UserStore::new(tx).require(user_id)?;
            AchievementEvaluator::new(tx).evaluate(user_id, snapshot, now)
        })
    }

    /// Evaluate against the stored state
    pub fn refresh_achievements(&self, user_id: UserId) -> EngineResult<Vec<UnlockedAchievement>> {
        let now = now_ms();
        self.write(|tx| {
            let snapshot = StatsQuery::new(tx).snapshot(user_id)?;
            AchievementEvaluator::new(tx).evaluate(user_id, &snapshot, now)
        })
    }

    /// Unlocked achievements, most recent first
    pub fn achievements(&self, user_id: UserId) -> EngineResult<Vec<UnlockedAchievement>> {
        self.db.read(|conn| {
            UserStore::new(conn).require(user_id)?;
            AchievementEvaluator::new(conn).list(user_id)
        })
    }

    pub fn stats(&self, user_id: UserId) -> EngineResult<UserStats> {
        let now = now_ms();
        self.db.read(|conn| StatsQuery::new(conn).user_stats(user_id, now))
    }

    pub fn player_level(&self, user_id: UserId) -> EngineResult<PlayerLevel> {
        Ok(PlayerLevel::new(self.get_user(user_id)?.points))
    }

    /// Wipe all per-user activity, keeping accounts and content
    pub fn reset_activity(&self) -> EngineResult<()> {
        self.db.reset_activity()
    }
}

/// Current time in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn engine_with(settings: EngineSettings) -> (GamificationEngine, UserId) {
        let engine = GamificationEngine::in_memory(settings).unwrap();
        let catalog: ContentCatalog = toml::from_str(
            r#"
[[chapter]]
id = 1
number = 1
title = "Quel ramo del lago di Como"

[[chapter]]
id = 2
number = 2
title = "Il matrimonio a monte"

[[quiz]]
id = 10
chapter_id = 1
question = "Dove inizia il romanzo?"
options = ["Lago di Como", "Milano"]
correct_answer = 0
points = 10
"#,
        )
        .unwrap();
        engine.import_catalog(&catalog).unwrap();
        let user = engine.create_user("Renzo").unwrap();
        (engine, user.id)
    }

    #[test]
    fn test_completion_then_score_merges() {
        let (engine, user) = engine_with(EngineSettings::default());

        engine.upsert_progress(user, 1, &ProgressPatch::completed()).unwrap();
        let update = engine
            .upsert_progress(user, 1, &ProgressPatch::default().with_quiz_score(90))
            .unwrap();

        assert!(update.record.is_completed);
        assert_eq!(update.record.quiz_score, Some(90));
        assert_eq!(engine.get_progress(user).unwrap().len(), 1);
    }

    #[test]
    fn test_completion_unlocks_first_chapter() {
        let (engine, user) = engine_with(EngineSettings::default());

        let update = engine.upsert_progress(user, 1, &ProgressPatch::completed()).unwrap();
        assert!(update.balance.is_none());
        let ids: Vec<_> = update.unlocked.iter().map(|u| u.achievement.id).collect();
        assert_eq!(ids, vec![AchievementId::FirstChapter]);

        let update = engine.upsert_progress(user, 2, &ProgressPatch::completed()).unwrap();
        assert_eq!(update.unlocked[0].achievement.id, AchievementId::SecondChapter);
        assert_eq!(engine.stats(user).unwrap().completed_chapters, 2);
    }

    #[test]
    fn test_completion_reward_is_credited_once() {
        let settings = EngineSettings {
            chapter_completion_points: 50,
            ..EngineSettings::default()
        };
        let (engine, user) = engine_with(settings);

        let first = engine.upsert_progress(user, 1, &ProgressPatch::completed()).unwrap();
        assert_eq!(first.balance.unwrap().points, 50);

        engine
            .upsert_progress(user, 1, &ProgressPatch::default().with_completed(false))
            .unwrap();
        let again = engine.upsert_progress(user, 1, &ProgressPatch::completed()).unwrap();
        assert!(again.balance.is_none());
        assert_eq!(engine.get_user(user).unwrap().points, 50);
    }

    #[test]
    fn test_upsert_validation_and_lookups() {
        let (engine, user) = engine_with(EngineSettings::default());

        assert!(matches!(
            engine.upsert_progress(user, 1, &ProgressPatch::default().with_quiz_score(101)),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.upsert_progress(user, 99, &ProgressPatch::completed()),
            Err(EngineError::NotFound { entity: "chapter", .. })
        ));
        assert!(matches!(
            engine.upsert_progress(user + 1, 1, &ProgressPatch::completed()),
            Err(EngineError::NotFound { entity: "user", .. })
        ));
        assert!(engine.get_progress(user).unwrap().is_empty());
    }

    #[test]
    fn test_submit_answer_scenario() {
        let (engine, user) = engine_with(EngineSettings::default());

        let submission = engine.submit_answer(user, 10, 0).unwrap();
        assert!(submission.result.is_correct);
        assert_eq!(submission.result.points_earned, 10);

        let user_row = engine.get_user(user).unwrap();
        assert_eq!(user_row.points, 10);
        assert_eq!(user_row.level, "Novizio");

        let level = engine.player_level(user).unwrap();
        assert_eq!(level.points_to_next(), Some(490));
    }

    #[test]
    fn test_credit_unlocks_point_achievements() {
        let (engine, user) = engine_with(EngineSettings::default());

        let outcome = engine.credit(user, 1_000).unwrap();
        assert_eq!(outcome.balance.level, "Apprendista");
        assert!(outcome.balance.level_up().is_some());
        let ids: Vec<_> = outcome.unlocked.iter().map(|u| u.achievement.id).collect();
        assert_eq!(ids, vec![AchievementId::HundredPoints, AchievementId::Scholar]);
        assert_eq!(engine.achievements(user).unwrap().len(), 2);

        assert!(engine.credit(user, 0).unwrap().unlocked.is_empty());
        assert!(engine.refresh_achievements(user).unwrap().is_empty());
    }

    #[test]
    fn test_rejected_credit_unlocks_nothing() {
        let (engine, user) = engine_with(EngineSettings::default());
        assert!(matches!(
            engine.credit(user, -5),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(engine.achievements(user).unwrap().is_empty());
    }

    #[test]
    fn test_quizzes_by_unknown_chapter() {
        let (engine, _) = engine_with(EngineSettings::default());
        assert_eq!(engine.get_quizzes_by_chapter(1).unwrap().len(), 1);
        assert!(engine.get_quizzes_by_chapter(2).unwrap().is_empty());
        assert!(matches!(
            engine.get_quizzes_by_chapter(3),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reset_activity() {
        let (engine, user) = engine_with(EngineSettings::default());
        engine.submit_answer(user, 10, 0).unwrap();
        engine.upsert_progress(user, 1, &ProgressPatch::completed()).unwrap();

        engine.reset_activity().unwrap();

        let stats = engine.stats(user).unwrap();
        assert_eq!(stats.total_points, 0);
        assert_eq!(stats.completed_chapters, 0);
        assert_eq!(stats.quiz_attempts, 0);
        assert_eq!(stats.achievements_unlocked, 0);
        assert_eq!(engine.list_chapters().unwrap().len(), 2);
    }
}
