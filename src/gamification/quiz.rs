//! Quiz submissions: grading, result history, and point crediting

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::achievements::{AchievementEvaluator, UnlockedAchievement};
use super::content::ContentStore;
use super::ledger::PointsLedger;
use super::models::{LedgerBalance, QuizId, QuizResult, UserId};
use super::stats::StatsQuery;
use super::users::UserStore;
use crate::error::{EngineError, EngineResult};

/// When a correct answer moves the point total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditPolicy {
    /// Only the first correct attempt per (user, quiz) credits points
    #[default]
    FirstCorrectOnly,
    /// Every correct attempt credits points (legacy behaviour, farmable)
    EveryCorrect,
}

/// Outcome of one submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub result: QuizResult,
    /// Present when the attempt credited points
    pub balance: Option<LedgerBalance>,
    pub unlocked: Vec<UnlockedAchievement>,
}

/// Append-only access to `quiz_results`
pub struct QuizResultStore<'c> {
    conn: &'c Connection,
}

impl<'c> QuizResultStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    #[allow(clippy::too_many_arguments)]
    fn insert(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
        selected_option: usize,
        is_correct: bool,
        points_earned: i64,
        credited: bool,
        now: i64,
    ) -> EngineResult<QuizResult> {
        let result = self.conn.query_row(
            r#"
            INSERT INTO quiz_results (user_id, quiz_id, selected_option, is_correct, points_earned, credited, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, user_id, quiz_id, selected_option, is_correct, points_earned, credited, created_at
            "#,
            params![
                user_id,
                quiz_id,
                selected_option as i64,
                is_correct,
                points_earned,
                credited,
                now
            ],
            map_result,
        )?;
        Ok(result)
    }

    /// Whether any earlier attempt already credited this quiz
    pub fn has_credited(&self, user_id: UserId, quiz_id: QuizId) -> EngineResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM quiz_results WHERE user_id = ?1 AND quiz_id = ?2 AND credited = 1)",
            params![user_id, quiz_id],
            |r| r.get(0),
        )?;
        Ok(exists)
    }

    /// Attempts of a user, oldest first, optionally for one quiz
    pub fn list(&self, user_id: UserId, quiz_id: Option<QuizId>) -> EngineResult<Vec<QuizResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, quiz_id, selected_option, is_correct, points_earned, credited, created_at
            FROM quiz_results
            WHERE user_id = ?1 AND (?2 IS NULL OR quiz_id = ?2)
            ORDER BY created_at, id
            "#,
        )?;
        let results = stmt
            .query_map(params![user_id, quiz_id], map_result)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(results)
    }

    /// Distinct quizzes answered correctly at least once
    pub fn completed_count(&self, user_id: UserId) -> EngineResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(DISTINCT quiz_id) FROM quiz_results WHERE user_id = ?1 AND is_correct = 1",
            params![user_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    pub fn attempt_count(&self, user_id: UserId) -> EngineResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM quiz_results WHERE user_id = ?1",
            params![user_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }
}

fn map_result(row: &Row<'_>) -> rusqlite::Result<QuizResult> {
    Ok(QuizResult {
        id: row.get(0)?,
        user_id: row.get(1)?,
        quiz_id: row.get(2)?,
        selected_option: row.get::<_, i64>(3)? as usize,
        is_correct: row.get(4)?,
        points_earned: row.get(5)?,
        credited: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Grades an answer, records the attempt, credits points and evaluates
/// achievements, all against the caller's transaction
pub struct QuizResultProcessor<'c> {
    conn: &'c Connection,
    policy: CreditPolicy,
}

impl<'c> QuizResultProcessor<'c> {
    pub fn new(conn: &'c Connection, policy: CreditPolicy) -> Self {
        Self { conn, policy }
    }

    pub fn submit(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
        selected_option: usize,
        now: i64,
    ) -> EngineResult<QuizSubmission> {
        let quiz = ContentStore::new(self.conn).require_quiz(quiz_id)?;
        UserStore::new(self.conn).require(user_id)?;

        if selected_option >= quiz.options.len() {
            return Err(EngineError::invalid(format!(
                "option {} is outside quiz {} ({} options)",
                selected_option,
                quiz_id,
                quiz.options.len()
            )));
        }

        let is_correct = selected_option == quiz.correct_answer;
        let points_earned = if is_correct { quiz.points } else { 0 };

        let results = QuizResultStore::new(self.conn);
        let credited = is_correct
            && match self.policy {
                CreditPolicy::FirstCorrectOnly => !results.has_credited(user_id, quiz_id)?,
                CreditPolicy::EveryCorrect => true,
            };

        let result = results.insert(
            user_id,
            quiz_id,
            selected_option,
            is_correct,
            points_earned,
            credited,
            now,
        )?;
        debug!(user_id, quiz_id, is_correct, credited, "Recorded quiz attempt");

        let balance = if credited {
            Some(PointsLedger::new(self.conn).credit(user_id, points_earned, now)?)
        } else {
            UserStore::new(self.conn).touch(user_id, now)?;
            None
        };

        let snapshot = StatsQuery::new(self.conn).snapshot(user_id)?;
        let unlocked = AchievementEvaluator::new(self.conn).evaluate(user_id, &snapshot, now)?;

        Ok(QuizSubmission {
            result,
            balance,
            unlocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::achievements::AchievementId;
    use crate::gamification::content::ContentCatalog;
    use crate::gamification::db::GamificationDb;
    use crate::gamification::models::{Chapter, Quiz};

    fn setup() -> (GamificationDb, UserId) {
        let db = GamificationDb::open_in_memory().unwrap();
        let user_id = {
            let conn = db.conn();
            let catalog = ContentCatalog {
                chapters: vec![Chapter {
                    id: 1,
                    number: 1,
                    title: "Capitolo 1".to_string(),
                    content: String::new(),
                }],
                quizzes: vec![
                    Quiz {
                        id: 7,
                        chapter_id: 1,
                        question: "Chi è l'autore?".to_string(),
                        options: vec!["Manzoni".into(), "Verga".into(), "Dante".into()],
                        correct_answer: 0,
                        points: 10,
                        explanation: None,
                    },
                    Quiz {
                        id: 8,
                        chapter_id: 1,
                        question: "In che lago?".to_string(),
                        options: vec!["Como".into(), "Garda".into()],
                        correct_answer: 0,
                        points: 15,
                        explanation: None,
                    },
                ],
            };
            ContentStore::new(&conn).import(&catalog).unwrap();
            UserStore::new(&conn).create("Renzo", 0).unwrap().id
        };
        (db, user_id)
    }

    #[test]
    fn test_correct_answer_credits_points() {
        let (db, user) = setup();
        let conn = db.conn();
        let processor = QuizResultProcessor::new(&conn, CreditPolicy::FirstCorrectOnly);

        let submission = processor.submit(user, 7, 0, 1_000).unwrap();
        assert!(submission.result.is_correct);
        assert_eq!(submission.result.points_earned, 10);
        assert!(submission.result.credited);

        let balance = submission.balance.unwrap();
        assert_eq!(balance.points, 10);
        assert_eq!(balance.level, "Novizio");

        let ids: Vec<_> = submission.unlocked.iter().map(|u| u.achievement.id).collect();
        assert_eq!(ids, vec![AchievementId::FirstQuiz]);
    }

    #[test]
    fn test_wrong_answer_is_recorded_without_credit() {
        let (db, user) = setup();
        let conn = db.conn();
        let processor = QuizResultProcessor::new(&conn, CreditPolicy::FirstCorrectOnly);

        let submission = processor.submit(user, 7, 2, 1_000).unwrap();
        assert!(!submission.result.is_correct);
        assert_eq!(submission.result.points_earned, 0);
        assert!(submission.balance.is_none());
        assert!(submission.unlocked.is_empty());
        assert_eq!(QuizResultStore::new(&conn).attempt_count(user).unwrap(), 1);
        assert_eq!(UserStore::new(&conn).require(user).unwrap().points, 0);
    }

    #[test]
    fn test_first_correct_only() {
        let (db, user) = setup();
        let conn = db.conn();
        let processor = QuizResultProcessor::new(&conn, CreditPolicy::FirstCorrectOnly);

        processor.submit(user, 7, 1, 1).unwrap(); // wrong
        let first = processor.submit(user, 7, 0, 2).unwrap();
        let again = processor.submit(user, 7, 0, 3).unwrap();
        processor.submit(user, 7, 2, 4).unwrap(); // wrong

        assert!(first.result.credited);
        assert!(again.result.is_correct);
        assert_eq!(again.result.points_earned, 10);
        assert!(!again.result.credited);
        assert!(again.balance.is_none());

        assert_eq!(UserStore::new(&conn).require(user).unwrap().points, 10);
        let history = QuizResultStore::new(&conn).list(user, Some(7)).unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history.iter().filter(|r| r.credited).count(), 1);
    }

    #[test]
    fn test_every_correct_policy() {
        let (db, user) = setup();
        let conn = db.conn();
        let processor = QuizResultProcessor::new(&conn, CreditPolicy::EveryCorrect);

        processor.submit(user, 8, 0, 1).unwrap();
        processor.submit(user, 8, 0, 2).unwrap();
        assert_eq!(UserStore::new(&conn).require(user).unwrap().points, 30);
        assert_eq!(QuizResultStore::new(&conn).completed_count(user).unwrap(), 1);
    }

    #[test]
    fn test_invalid_submissions() {
        let (db, user) = setup();
        let conn = db.conn();
        let processor = QuizResultProcessor::new(&conn, CreditPolicy::FirstCorrectOnly);

        assert!(matches!(
            processor.submit(user, 99, 0, 1),
            Err(EngineError::NotFound { entity: "quiz", .. })
        ));
        assert!(matches!(
            processor.submit(user + 1, 7, 0, 1),
            Err(EngineError::NotFound { entity: "user", .. })
        ));
        assert!(matches!(
            processor.submit(user, 8, 2, 1),
            Err(EngineError::InvalidInput(_))
        ));
        assert_eq!(QuizResultStore::new(&conn).attempt_count(user).unwrap(), 0);
    }

    #[test]
    fn test_history_filters() {
        let (db, user) = setup();
        let conn = db.conn();
        let processor = QuizResultProcessor::new(&conn, CreditPolicy::FirstCorrectOnly);
        processor.submit(user, 7, 0, 1).unwrap();
        processor.submit(user, 8, 1, 2).unwrap();

        let store = QuizResultStore::new(&conn);
        assert_eq!(store.list(user, None).unwrap().len(), 2);
        assert_eq!(store.list(user, Some(8)).unwrap()[0].selected_option, 1);
        assert_eq!(store.completed_count(user).unwrap(), 1);
    }
}
