//! Aggregate counters for achievements and the reader dashboard

use rusqlite::Connection;

use super::achievements::{AchievementEvaluator, AchievementSnapshot};
use super::models::{UserId, UserStats};
use super::progress::ProgressStore;
use super::quiz::QuizResultStore;
use super::users::UserStore;
use crate::error::EngineResult;

const MS_PER_DAY: i64 = 86_400_000;

pub struct StatsQuery<'c> {
    conn: &'c Connection,
}

impl<'c> StatsQuery<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Counters achievement conditions are tested against
    pub fn snapshot(&self, user_id: UserId) -> EngineResult<AchievementSnapshot> {
        let user = UserStore::new(self.conn).require(user_id)?;
        Ok(AchievementSnapshot {
            completed_chapters: ProgressStore::new(self.conn).completed_count(user_id)?,
            total_points: user.points,
            quizzes_completed: QuizResultStore::new(self.conn).completed_count(user_id)?,
        })
    }

    pub fn user_stats(&self, user_id: UserId, now: i64) -> EngineResult<UserStats> {
        let user = UserStore::new(self.conn).require(user_id)?;
        let results = QuizResultStore::new(self.conn);

        Ok(UserStats {
            user_id,
            completed_chapters: ProgressStore::new(self.conn).completed_count(user_id)?,
            completed_quizzes: results.completed_count(user_id)?,
            quiz_attempts: results.attempt_count(user_id)?,
            total_points: user.points,
            current_level: user.level,
            achievements_unlocked: AchievementEvaluator::new(self.conn).unlocked_count(user_id)?,
            days_since_joined: (now - user.created_at).max(0) / MS_PER_DAY,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::gamification::db::GamificationDb;
    use crate::gamification::ledger::PointsLedger;

    #[test]
    fn test_fresh_user_stats() {
        let db = GamificationDb::open_in_memory().unwrap();
        let conn = db.conn();
        let user = UserStore::new(&conn).create("Lucia", 0).unwrap();

        let stats = StatsQuery::new(&conn).user_stats(user.id, 3 * MS_PER_DAY + 5).unwrap();
        assert_eq!(stats.completed_chapters, 0);
        assert_eq!(stats.completed_quizzes, 0);
        assert_eq!(stats.total_points, 0);
        assert_eq!(stats.current_level, "Novizio");
        assert_eq!(stats.days_since_joined, 3);
    }

    #[test]
    fn test_snapshot_follows_points() {
        let db = GamificationDb::open_in_memory().unwrap();
        let conn = db.conn();
        let user = UserStore::new(&conn).create("Lucia", 0).unwrap();
        PointsLedger::new(&conn).credit(user.id, 120, 1).unwrap();

        let snapshot = StatsQuery::new(&conn).snapshot(user.id).unwrap();
        assert_eq!(snapshot.total_points, 120);
        assert_eq!(snapshot.completed_chapters, 0);
    }

    #[test]
    fn test_unknown_user() {
        let db = GamificationDb::open_in_memory().unwrap();
        let conn = db.conn();
        assert!(matches!(
            StatsQuery::new(&conn).user_stats(42, 0),
            Err(EngineError::NotFound { .. })
        ));
    }
}
