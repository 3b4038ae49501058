//! SQLite database connection and schema management
//!
//! Manages the `~/.edoquest/edoquest.db` database. All mutations go through
//! [`GamificationDb::write`], which runs the operation in a single
//! `BEGIN IMMEDIATE` transaction and retries it when SQLite reports the
//! database busy.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, warn};

use super::levels::level_for;
use crate::error::{EngineError, EngineResult};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Backoff unit between conflict retries (multiplied by the attempt number)
const RETRY_BACKOFF_MS: u64 = 15;

/// Database wrapper shared by every store
#[derive(Clone)]
pub struct GamificationDb {
    conn: Arc<Mutex<Connection>>,
}

impl GamificationDb {
    /// Open or create the database at a specific path
    pub fn open(path: &Path, busy_timeout: Duration) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Set first: the pragmas below may already contend with other writers
        conn.busy_timeout(busy_timeout)?;
        // WAL lets readers proceed while a writer holds the reserved lock
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Opened gamification db at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> EngineResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> EngineResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Lock the connection. A poisoned lock still holds a usable connection:
    /// any transaction open during the panic was rolled back on drop.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn init_schema(&self) -> EngineResult<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;

        let version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )?;
        if version < SCHEMA_VERSION {
            conn.execute(
                "INSERT OR REPLACE INTO schema_version VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
        }
        Ok(())
    }

    /// Run a read-only operation against the connection
    pub fn read<T>(&self, op: impl FnOnce(&Connection) -> EngineResult<T>) -> EngineResult<T> {
        let conn = self.conn();
        op(&conn)
    }

    /// Run `op` inside one immediate transaction.
    ///
    /// Either everything `op` wrote is committed or nothing is. Busy/locked
    /// failures re-run `op` from scratch up to `max_retries` more times.
    pub fn write<T, F>(&self, max_retries: u32, mut op: F) -> EngineResult<T>
    where
        F: FnMut(&Transaction<'_>) -> EngineResult<T>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_write(&mut op) {
                Err(err) if err.is_retryable() && attempt <= max_retries => {
                    warn!(attempt, "Write conflict, retrying: {}", err);
                    std::thread::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64));
                }
                Err(err) if err.is_retryable() => {
                    return Err(EngineError::ConflictRetryable { attempts: attempt });
                }
                other => return other,
            }
        }
    }

    fn try_write<T, F>(&self, op: &mut F) -> EngineResult<T>
    where
        F: FnMut(&Transaction<'_>) -> EngineResult<T>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Dropping `tx` on the error path rolls back
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Delete all per-user activity (progress, results, achievements) and zero
    /// every account. Content and accounts themselves are kept.
    pub fn reset_activity(&self) -> EngineResult<()> {
        self.write(0, |tx| {
            tx.execute_batch(
                r#"
                DELETE FROM user_achievements;
                DELETE FROM quiz_results;
                DELETE FROM user_progress;
                "#,
            )?;
            tx.execute("UPDATE users SET points = 0, level = ?1", [level_for(0)])?;
            Ok(())
        })
    }
}

/// SQL schema
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);

-- Accounts (credentials live elsewhere)
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    display_name TEXT NOT NULL,
    points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
    level TEXT NOT NULL DEFAULT 'Novizio',
    created_at INTEGER NOT NULL,
    last_active_at INTEGER NOT NULL
);

-- ============================================
-- CONTENT (read-only to the engine)
-- ============================================
CREATE TABLE IF NOT EXISTS chapters (
    id INTEGER PRIMARY KEY,
    number INTEGER NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_chapter_number ON chapters(number);

CREATE TABLE IF NOT EXISTS quizzes (
    id INTEGER PRIMARY KEY,
    chapter_id INTEGER NOT NULL REFERENCES chapters(id),
    question TEXT NOT NULL,
    options_json TEXT NOT NULL,              -- JSON array of answer labels
    correct_answer INTEGER NOT NULL,
    points INTEGER NOT NULL DEFAULT 10 CHECK (points >= 0),
    explanation TEXT
);
CREATE INDEX IF NOT EXISTS idx_quiz_chapter ON quizzes(chapter_id);

-- ============================================
-- PROGRESS & GAMIFICATION
-- ============================================
CREATE TABLE IF NOT EXISTS user_progress (
    user_id INTEGER NOT NULL REFERENCES users(id),
    chapter_id INTEGER NOT NULL REFERENCES chapters(id),
    is_completed INTEGER NOT NULL DEFAULT 0,
    reading_time_seconds INTEGER,
    quiz_score INTEGER CHECK (quiz_score BETWEEN 0 AND 100),
    completed_at INTEGER,
    last_read_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, chapter_id)
);

-- Every attempt is kept
CREATE TABLE IF NOT EXISTS quiz_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    quiz_id INTEGER NOT NULL REFERENCES quizzes(id),
    selected_option INTEGER NOT NULL,
    is_correct INTEGER NOT NULL,
    points_earned INTEGER NOT NULL DEFAULT 0,
    credited INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_quiz_results_user ON quiz_results(user_id, quiz_id);

CREATE TABLE IF NOT EXISTS user_achievements (
    user_id INTEGER NOT NULL REFERENCES users(id),
    achievement_id TEXT NOT NULL,
    unlocked_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, achievement_id)
);
"#;
