//! Request routing and handlers
//!
//! Handlers are plain functions from (method, path, query, body) to a status
//! code and a JSON value, so they can be tested without a socket.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{EngineError, EngineResult};
use crate::gamification::{ChapterId, GamificationEngine, ProgressPatch, QuizId, UserId};

/// A JSON response before it is written to the socket
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            body: json!({ "error": "not_found", "message": "no such endpoint" }),
        }
    }

    fn method_not_allowed() -> Self {
        Self {
            status: 405,
            body: json!({ "error": "method_not_allowed" }),
        }
    }
}

impl From<EngineError> for ApiResponse {
    fn from(err: EngineError) -> Self {
        if !err.is_client_error() {
            tracing::error!("Request failed: {}", err);
        }
        Self {
            status: err.http_status(),
            body: json!({ "error": err.kind(), "message": err.to_string() }),
        }
    }
}

/// Body of `POST /api/users/{id}/progress`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressRequest {
    chapter_id: ChapterId,
    #[serde(flatten)]
    patch: ProgressPatch,
}

/// Body of `POST /api/quiz-results`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizAnswerRequest {
    user_id: UserId,
    quiz_id: QuizId,
    #[serde(alias = "selectedAnswer")]
    selected_option: usize,
}

/// Dispatch one request
pub fn route(
    engine: &GamificationEngine,
    method: &str,
    path: &str,
    query: Option<&str>,
    body: &str,
) -> ApiResponse {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let result = match (method, segments.as_slice()) {
        ("GET", ["api", "ping"]) => Ok(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),

        ("GET", ["api", "chapters"]) => engine.list_chapters().map(|c| json!({ "chapters": c })),
        ("GET", ["api", "chapters", id]) => parse_id(id)
            .and_then(|id| engine.get_chapter(id))
            .map(|c| json!({ "chapter": c })),
        ("GET", ["api", "chapters", id, "quizzes"]) => parse_id(id)
            .and_then(|id| engine.get_quizzes_by_chapter(id))
            .map(|q| json!({ "quizzes": q })),

        ("GET", ["api", "users", id]) => parse_id(id).and_then(|id| {
            let user = engine.get_user(id)?;
            let level = engine.player_level(id)?;
            Ok(json!({ "user": user, "level": level }))
        }),
        ("GET", ["api", "users", id, "progress"]) => parse_id(id)
            .and_then(|id| engine.get_progress(id))
            .map(|p| json!({ "progress": p })),
        ("POST", ["api", "users", id, "progress"]) => parse_id(id).and_then(|id| {
            let req: ProgressRequest = parse_body(body)?;
            let update = engine.upsert_progress(id, req.chapter_id, &req.patch)?;
            Ok(serde_json::to_value(update)?)
        }),
        ("GET", ["api", "users", id, "quiz-results"]) => parse_id(id).and_then(|id| {
            let quiz_id = query_param(query, "quizId").map(parse_id).transpose()?;
            let results = engine.quiz_results(id, quiz_id)?;
            Ok(json!({ "results": results }))
        }),
        ("GET", ["api", "users", id, "achievements"]) => parse_id(id)
            .and_then(|id| engine.achievements(id))
            .map(|a| json!({ "achievements": a })),
        ("GET", ["api", "users", id, "stats"]) => parse_id(id)
            .and_then(|id| engine.stats(id))
            .map(|s| json!({ "stats": s })),

        ("POST", ["api", "quiz-results"]) => parse_body::<QuizAnswerRequest>(body).and_then(|req| {
            let submission = engine.submit_answer(req.user_id, req.quiz_id, req.selected_option)?;
            Ok(serde_json::to_value(submission)?)
        }),

        (_, ["api", ..]) if is_known_path(&segments) => return ApiResponse::method_not_allowed(),
        _ => return ApiResponse::not_found(),
    };

    match result {
        Ok(body) => ApiResponse::ok(body),
        Err(err) => err.into(),
    }
}

fn is_known_path(segments: &[&str]) -> bool {
    matches!(
        segments,
        ["api", "ping"]
            | ["api", "chapters"]
            | ["api", "chapters", _]
            | ["api", "chapters", _, "quizzes"]
            | ["api", "users", _]
            | ["api", "users", _, "progress" | "quiz-results" | "achievements" | "stats"]
            | ["api", "quiz-results"]
    )
}

fn parse_id(raw: &str) -> EngineResult<i64> {
    raw.parse()
        .map_err(|_| EngineError::invalid(format!("invalid id: {raw}")))
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> EngineResult<T> {
    serde_json::from_str(body).map_err(|e| EngineError::invalid(format!("invalid JSON body: {e}")))
}

/// Raw value of `key`. Values are not percent-decoded; the only parameter
/// is a numeric id, and an encoded one fails `parse_id` with a 400.
fn query_param<'a>(query: Option<&'a str>, key: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}
