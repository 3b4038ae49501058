//! Per-(user, chapter) progress records
//!
//! A record is created on the first interaction with a chapter and merged in
//! place afterwards. The merge is field-wise: a field present in the patch
//! replaces the stored value, an absent field keeps it. `last_read_at` always
//! moves to the call time.

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use super::models::{ChapterId, ProgressPatch, ProgressRecord, UserId};
use crate::error::EngineResult;

const RECORD_COLUMNS: &str =
    "user_id, chapter_id, is_completed, reading_time_seconds, quiz_score, completed_at, last_read_at";

pub struct ProgressStore<'c> {
    conn: &'c Connection,
}

impl<'c> ProgressStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, user_id: UserId, chapter_id: ChapterId) -> EngineResult<Option<ProgressRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM user_progress WHERE user_id = ?1 AND chapter_id = ?2"
                ),
                params![user_id, chapter_id],
                map_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Insert-or-merge in one statement keyed by (user_id, chapter_id).
    ///
    /// The caller validates the patch and the ids.
    pub fn upsert(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
        patch: &ProgressPatch,
        now: i64,
    ) -> EngineResult<ProgressRecord> {
        let record = self.conn.query_row(
            &format!(
                r#"
                INSERT INTO user_progress
                    (user_id, chapter_id, is_completed, reading_time_seconds, quiz_score, completed_at, last_read_at)
                VALUES (?1, ?2, COALESCE(?3, 0), ?4, ?5, CASE WHEN ?3 = 1 THEN ?6 END, ?6)
                ON CONFLICT(user_id, chapter_id) DO UPDATE SET
                    is_completed = COALESCE(?3, user_progress.is_completed),
                    reading_time_seconds = COALESCE(?4, user_progress.reading_time_seconds),
                    quiz_score = COALESCE(?5, user_progress.quiz_score),
                    completed_at = COALESCE(user_progress.completed_at, CASE WHEN ?3 = 1 THEN ?6 END),
                    last_read_at = ?6
                RETURNING {RECORD_COLUMNS}
                "#
            ),
            params![
                user_id,
                chapter_id,
                patch.is_completed,
                patch.reading_time_seconds,
                patch.quiz_score,
                now,
            ],
            map_record,
        )?;

        debug!(user_id, chapter_id, ?patch, "Merged progress");
        Ok(record)
    }

    /// All records of a user, ordered by chapter id
    pub fn list_for_user(&self, user_id: UserId) -> EngineResult<Vec<ProgressRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM user_progress WHERE user_id = ?1 ORDER BY chapter_id"
        ))?;
        let records = stmt
            .query_map(params![user_id], map_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn completed_count(&self, user_id: UserId) -> EngineResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_progress WHERE user_id = ?1 AND is_completed = 1",
            params![user_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<ProgressRecord> {
    Ok(ProgressRecord {
        user_id: row.get(0)?,
        chapter_id: row.get(1)?,
        is_completed: row.get(2)?,
        reading_time_seconds: row.get(3)?,
        quiz_score: row.get(4)?,
        completed_at: row.get(5)?,
        last_read_at: row.get(6)?,
    })
}
