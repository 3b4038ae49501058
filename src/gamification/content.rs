//! Chapter and quiz accessors, plus catalog import
//!
//! The engine only reads content. Import is the admin-side seeding path: it
//! upserts chapters and quizzes by id from a TOML or JSON catalog file.

use std::collections::HashSet;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::models::{Chapter, ChapterId, Quiz, QuizId};
use crate::error::{EngineError, EngineResult};

/// A batch of chapters and quizzes to import
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentCatalog {
    #[serde(default, alias = "chapter")]
    pub chapters: Vec<Chapter>,
    #[serde(default, alias = "quiz")]
    pub quizzes: Vec<Quiz>,
}

/// Counts reported after an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub chapters: usize,
    pub quizzes: usize,
}

impl ContentCatalog {
    /// Load a catalog from a `.toml` or `.json` file
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// Check everything that can be checked without the store
    fn validate_shape(&self) -> EngineResult<()> {
        let mut chapter_ids = HashSet::new();
        for chapter in &self.chapters {
            if !chapter_ids.insert(chapter.id) {
                return Err(EngineError::invalid(format!(
                    "chapter {} appears twice in catalog",
                    chapter.id
                )));
            }
            if chapter.title.trim().is_empty() {
                return Err(EngineError::invalid(format!(
                    "chapter {} has an empty title",
                    chapter.id
                )));
            }
        }

        let mut quiz_ids = HashSet::new();
        for quiz in &self.quizzes {
            if !quiz_ids.insert(quiz.id) {
                return Err(EngineError::invalid(format!(
                    "quiz {} appears twice in catalog",
                    quiz.id
                )));
            }
            if quiz.options.len() < 2 {
                return Err(EngineError::invalid(format!(
                    "quiz {} needs at least two options",
                    quiz.id
                )));
            }
            if quiz.correct_answer >= quiz.options.len() {
                return Err(EngineError::invalid(format!(
                    "quiz {}: correct answer {} is outside its {} options",
                    quiz.id,
                    quiz.correct_answer,
                    quiz.options.len()
                )));
            }
            if quiz.points < 0 {
                return Err(EngineError::invalid(format!(
                    "quiz {} has negative points",
                    quiz.id
                )));
            }
        }
        Ok(())
    }
}

pub struct ContentStore<'c> {
    conn: &'c Connection,
}

impl<'c> ContentStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn get_chapter(&self, id: ChapterId) -> EngineResult<Option<Chapter>> {
        let chapter = self
            .conn
            .query_row(
                "SELECT id, number, title, content FROM chapters WHERE id = ?1",
                params![id],
                map_chapter,
            )
            .optional()?;
        Ok(chapter)
    }

    pub fn require_chapter(&self, id: ChapterId) -> EngineResult<Chapter> {
        self.get_chapter(id)?
            .ok_or_else(|| EngineError::not_found("chapter", id))
    }

    /// All chapters in reading order
    pub fn list_chapters(&self) -> EngineResult<Vec<Chapter>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, number, title, content FROM chapters ORDER BY number, id")?;
        let chapters = stmt
            .query_map([], map_chapter)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(chapters)
    }

    pub fn get_quiz(&self, id: QuizId) -> EngineResult<Option<Quiz>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, chapter_id, question, options_json, correct_answer, points, explanation
                FROM quizzes WHERE id = ?1
                "#,
                params![id],
                map_quiz_row,
            )
            .optional()?;
        row.map(QuizRow::into_quiz).transpose()
    }

    pub fn require_quiz(&self, id: QuizId) -> EngineResult<Quiz> {
        self.get_quiz(id)?
            .ok_or_else(|| EngineError::not_found("quiz", id))
    }

    pub fn get_quizzes_by_chapter(&self, chapter_id: ChapterId) -> EngineResult<Vec<Quiz>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, chapter_id, question, options_json, correct_answer, points, explanation
            FROM quizzes WHERE chapter_id = ?1 ORDER BY id
            "#,
        )?;
        let rows = stmt
            .query_map(params![chapter_id], map_quiz_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(QuizRow::into_quiz).collect()
    }

    /// Upsert every chapter and quiz of the catalog
    pub fn import(&self, catalog: &ContentCatalog) -> EngineResult<ImportSummary> {
        catalog.validate_shape()?;

        for chapter in &catalog.chapters {
            self.conn.execute(
                r#"
                INSERT INTO chapters (id, number, title, content) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    number = excluded.number, title = excluded.title, content = excluded.content
                "#,
                params![chapter.id, chapter.number, chapter.title, chapter.content],
            )?;
        }

        for quiz in &catalog.quizzes {
            if self.get_chapter(quiz.chapter_id)?.is_none() {
                return Err(EngineError::invalid(format!(
                    "quiz {} refers to unknown chapter {}",
                    quiz.id, quiz.chapter_id
                )));
            }
            self.conn.execute(
                r#"
                INSERT INTO quizzes (id, chapter_id, question, options_json, correct_answer, points, explanation)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    chapter_id = excluded.chapter_id, question = excluded.question,
                    options_json = excluded.options_json, correct_answer = excluded.correct_answer,
                    points = excluded.points, explanation = excluded.explanation
                "#,
                params![
                    quiz.id,
                    quiz.chapter_id,
                    quiz.question,
                    serde_json::to_string(&quiz.options)?,
                    quiz.correct_answer as i64,
                    quiz.points,
                    quiz.explanation,
                ],
            )?;
        }

        info!(
            chapters = catalog.chapters.len(),
            quizzes = catalog.quizzes.len(),
            "Imported content catalog"
        );
        Ok(ImportSummary {
            chapters: catalog.chapters.len(),
            quizzes: catalog.quizzes.len(),
        })
    }
}

fn map_chapter(row: &Row<'_>) -> rusqlite::Result<Chapter> {
    Ok(Chapter {
        id: row.get(0)?,
        number: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
    })
}

/// Raw quiz row; options are decoded outside the rusqlite closure so a bad
/// JSON column surfaces as a JSON error rather than a storage error
struct QuizRow {
    id: QuizId,
    chapter_id: ChapterId,
    question: String,
    options_json: String,
    correct_answer: i64,
    points: i64,
    explanation: Option<String>,
}

impl QuizRow {
    fn into_quiz(self) -> EngineResult<Quiz> {
        Ok(Quiz {
            id: self.id,
            chapter_id: self.chapter_id,
            question: self.question,
            options: serde_json::from_str(&self.options_json)?,
            correct_answer: usize::try_from(self.correct_answer).map_err(|_| {
                EngineError::invalid(format!("quiz {} has a negative answer index", self.id))
            })?,
            points: self.points,
            explanation: self.explanation,
        })
    }
}

fn map_quiz_row(row: &Row<'_>) -> rusqlite::Result<QuizRow> {
    Ok(QuizRow {
        id: row.get(0)?,
        chapter_id: row.get(1)?,
        question: row.get(2)?,
        options_json: row.get(3)?,
        correct_answer: row.get(4)?,
        points: row.get(5)?,
        explanation: row.get(6)?,
    })
}
