//! Points ledger: the only writer of a user's point total
//!
//! Credits are non-negative, so totals never decrease. The level is
//! recomputed from the new total on every credit and written together with
//! it. Callers run `credit` inside the engine's immediate transaction, which
//! serialises concurrent credits for the same user.

use rusqlite::Connection;
use tracing::info;

use super::levels::level_for;
use super::models::{LedgerBalance, UserId};
use super::users::UserStore;
use crate::error::{EngineError, EngineResult};

pub struct PointsLedger<'c> {
    conn: &'c Connection,
}

impl<'c> PointsLedger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn credit(&self, user_id: UserId, delta: i64, now: i64) -> EngineResult<LedgerBalance> {
        if delta < 0 {
            return Err(EngineError::invalid(format!(
                "credit must not be negative (got {delta})"
            )));
        }

        let users = UserStore::new(self.conn);
        let user = users.require(user_id)?;
        let points = user
            .points
            .checked_add(delta)
            .ok_or_else(|| EngineError::invalid("point total overflow"))?;
        let level = level_for(points);

        users.set_points_and_level(user_id, points, level)?;
        users.touch(user_id, now)?;

        let balance = LedgerBalance {
            user_id,
            points,
            level: level.to_string(),
            previous_points: user.points,
            previous_level: user.level,
        };

        if let Some(up) = balance.level_up() {
            info!(user_id, points, "Level up: {} -> {}", up.old_level, up.new_level);
        } else {
            info!(user_id, delta, points, "Credited points");
        }
        Ok(balance)
    }
}
