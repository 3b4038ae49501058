//! Achievement evaluation and unlock persistence

use std::collections::HashSet;

use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::{info, warn};

use super::definitions::{Achievement, AchievementId, AchievementSnapshot};
use crate::error::EngineResult;
use crate::gamification::models::UserId;

/// An achievement unlocked for a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub achievement: &'static Achievement,
    pub unlocked_at: i64,
}

pub struct AchievementEvaluator<'c> {
    conn: &'c Connection,
}

impl<'c> AchievementEvaluator<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Ids already unlocked by the user
    pub fn unlocked_ids(&self, user_id: UserId) -> EngineResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT achievement_id FROM user_achievements WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(ids)
    }

    /// Unlock every catalog achievement whose condition now holds and that
    /// the user does not have yet. Returns only the new unlocks; running it
    /// again on the same state returns nothing.
    pub fn evaluate(
        &self,
        user_id: UserId,
        snapshot: &AchievementSnapshot,
        now: i64,
    ) -> EngineResult<Vec<UnlockedAchievement>> {
        let unlocked = self.unlocked_ids(user_id)?;
        let mut newly_unlocked = Vec::new();

        for achievement in Achievement::satisfied_by(snapshot) {
            if unlocked.contains(achievement.id.as_str()) {
                continue;
            }
            // The primary key is the last word on uniqueness
            let inserted = self.conn.execute(
                "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id, unlocked_at) VALUES (?1, ?2, ?3)",
                params![user_id, achievement.id.as_str(), now],
            )?;
            if inserted == 1 {
                info!(user_id, achievement = achievement.id.as_str(), "Achievement unlocked");
                newly_unlocked.push(UnlockedAchievement {
                    achievement,
                    unlocked_at: now,
                });
            }
        }

        Ok(newly_unlocked)
    }

    /// Unlocked achievements, most recent first
    pub fn list(&self, user_id: UserId) -> EngineResult<Vec<UnlockedAchievement>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT achievement_id, unlocked_at FROM user_achievements
            WHERE user_id = ?1 ORDER BY unlocked_at DESC, achievement_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut achievements = Vec::with_capacity(rows.len());
        for (id, unlocked_at) in rows {
            match AchievementId::parse(&id) {
                Some(id) => achievements.push(UnlockedAchievement {
                    achievement: Achievement::get(id),
                    unlocked_at,
                }),
                // Retired catalog entries stay in the table but are not shown
                None => warn!(user_id, achievement = %id, "Unknown achievement id in store"),
            }
        }
        Ok(achievements)
    }

    pub fn unlocked_count(&self, user_id: UserId) -> EngineResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_achievements WHERE user_id = ?1",
            params![user_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::db::GamificationDb;
    use crate::gamification::users::UserStore;

    #[test]
    fn test_evaluate_is_idempotent() {
        let db = GamificationDb::open_in_memory().unwrap();
        let conn = db.conn();
        let user = UserStore::new(&conn).create("Agnese", 0).unwrap();
        let evaluator = AchievementEvaluator::new(&conn);

        let snapshot = AchievementSnapshot {
            completed_chapters: 1,
            total_points: 10,
            quizzes_completed: 1,
        };
        let first = evaluator.evaluate(user.id, &snapshot, 1_000).unwrap();
        let ids: Vec<_> = first.iter().map(|u| u.achievement.id).collect();
        assert_eq!(ids, vec![AchievementId::FirstChapter, AchievementId::FirstQuiz]);

        let second = evaluator.evaluate(user.id, &snapshot, 2_000).unwrap();
        assert!(second.is_empty());
        assert_eq!(evaluator.unlocked_count(user.id).unwrap(), 2);
    }

    #[test]
    fn test_evaluate_only_adds_new_unlocks() {
        let db = GamificationDb::open_in_memory().unwrap();
        let conn = db.conn();
        let user = UserStore::new(&conn).create("Agnese", 0).unwrap();
        let evaluator = AchievementEvaluator::new(&conn);

        let mut snapshot = AchievementSnapshot {
            completed_chapters: 1,
            ..Default::default()
        };
        evaluator.evaluate(user.id, &snapshot, 1_000).unwrap();

        snapshot.completed_chapters = 2;
        snapshot.total_points = 1_000;
        let new: Vec<_> = evaluator
            .evaluate(user.id, &snapshot, 2_000)
            .unwrap()
            .into_iter()
            .map(|u| u.achievement.id)
            .collect();
        assert_eq!(
            new,
            vec![
                AchievementId::SecondChapter,
                AchievementId::HundredPoints,
                AchievementId::Scholar,
            ]
        );

        let listed = evaluator.list(user.id).unwrap();
        assert_eq!(listed.len(), 4);
        assert_eq!(listed[0].unlocked_at, 2_000);
        assert_eq!(listed.last().unwrap().achievement.id, AchievementId::FirstChapter);
    }

    #[test]
    fn test_evaluator_never_revokes() {
        let db = GamificationDb::open_in_memory().unwrap();
        let conn = db.conn();
        let user = UserStore::new(&conn).create("Agnese", 0).unwrap();
        let evaluator = AchievementEvaluator::new(&conn);

        let snapshot = AchievementSnapshot {
            completed_chapters: 2,
            ..Default::default()
        };
        evaluator.evaluate(user.id, &snapshot, 1).unwrap();
        evaluator
            .evaluate(user.id, &AchievementSnapshot::default(), 2)
            .unwrap();
        assert_eq!(evaluator.unlocked_count(user.id).unwrap(), 2);
    }
}
