//! Account accessor used by the engine
//!
//! Accounts belong to the auth subsystem; the engine only creates bare
//! records, reads them, and writes points/level through the ledger.

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::levels::level_for;
use super::models::{User, UserId};
use crate::error::{EngineError, EngineResult};

pub struct UserStore<'c> {
    conn: &'c Connection,
}

impl<'c> UserStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, display_name: &str, now: i64) -> EngineResult<User> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(EngineError::invalid("display name must not be empty"));
        }

        let user = self.conn.query_row(
            r#"
            INSERT INTO users (display_name, points, level, created_at, last_active_at)
            VALUES (?1, 0, ?2, ?3, ?3)
            RETURNING id, display_name, points, level, created_at, last_active_at
            "#,
            params![name, level_for(0), now],
            map_user,
        )?;
        Ok(user)
    }

    pub fn get(&self, id: UserId) -> EngineResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, display_name, points, level, created_at, last_active_at FROM users WHERE id = ?1",
                params![id],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Like [`get`](Self::get) but unknown ids are an error
    pub fn require(&self, id: UserId) -> EngineResult<User> {
        self.get(id)?.ok_or_else(|| EngineError::not_found("user", id))
    }

    /// Advance the last-active timestamp
    pub fn touch(&self, id: UserId, now: i64) -> EngineResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET last_active_at = MAX(last_active_at, ?2) WHERE id = ?1",
            params![id, now],
        )?;
        if changed == 0 {
            return Err(EngineError::not_found("user", id));
        }
        Ok(())
    }

    /// Only the points ledger calls this; `level` must be `level_for(points)`
    pub(crate) fn set_points_and_level(
        &self,
        id: UserId,
        points: i64,
        level: &str,
    ) -> EngineResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET points = ?2, level = ?3 WHERE id = ?1",
            params![id, points, level],
        )?;
        if changed == 0 {
            return Err(EngineError::not_found("user", id));
        }
        Ok(())
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        display_name: row.get(1)?,
        points: row.get(2)?,
        level: row.get(3)?,
        created_at: row.get(4)?,
        last_active_at: row.get(5)?,
    })
}
