//! Thin JSON API over the engine
//!
//! Listens on `[server] host:port` (default 127.0.0.1:9877) and serves:
//! - GET  /api/ping
//! - GET  /api/chapters, /api/chapters/{id}, /api/chapters/{id}/quizzes
//! - GET  /api/users/{id}
//! - GET|POST /api/users/{id}/progress
//! - GET  /api/users/{id}/quiz-results[?quizId=]
//! - GET  /api/users/{id}/achievements
//! - GET  /api/users/{id}/stats
//! - POST /api/quiz-results

mod handlers;

pub use handlers::{ApiResponse, route};

use std::io::Read;

use anyhow::{Result, anyhow};
use tiny_http::{Header, Request, Response, Server};
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::config::ServerSettings;
use crate::gamification::GamificationEngine;

const AUTH_HEADER: &str = "X-Edoquest-Token";
const REQUEST_ID_HEADER: &str = "X-Request-Id";
const MAX_BODY_BYTES: usize = 1024 * 1024; // 1 MiB

/// Bind the listening socket
pub fn bind(settings: &ServerSettings) -> Result<Server> {
    let bind_addr = format!("{}:{}", settings.host, settings.port);
    let server = Server::http(&bind_addr)
        .map_err(|e| anyhow!("Failed to start server on {}: {}", bind_addr, e))?;

    let auth_enabled = !settings.auth_token.trim().is_empty();
    info!(
        "Server listening on http://{} (auth: {})",
        bind_addr,
        if auth_enabled { "enabled" } else { "disabled" }
    );
    Ok(server)
}

/// Serve requests until [`Server::unblock`] is called
pub fn run(server: &Server, engine: &GamificationEngine, auth_token: Option<&str>) {
    for request in server.incoming_requests() {
        handle(engine, auth_token, request);
    }
    info!("Server stopped");
}

fn handle(engine: &GamificationEngine, auth_token: Option<&str>, mut request: Request) {
    let request_id = Uuid::new_v4();
    let method = request.method().to_string();
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url.as_str(), None),
    };

    let span = info_span!("request", id = %request_id, %method, path);
    let _enter = span.enter();

    if !is_authorized(&request, auth_token) {
        warn!("Rejected unauthenticated request");
        respond_json(
            request,
            request_id,
            ApiResponse {
                status: 401,
                body: serde_json::json!({ "error": "unauthorized" }),
            },
        );
        return;
    }

    let body = match read_request_body(&mut request) {
        Ok(body) => body,
        Err(response) => {
            respond_json(request, request_id, response);
            return;
        }
    };

    let response = route(engine, &method, path, query, &body);
    info!(status = response.status, "Handled request");
    respond_json(request, request_id, response);
}

fn is_authorized(request: &Request, expected: Option<&str>) -> bool {
    let Some(expected) = expected.filter(|t| !t.trim().is_empty()) else {
        return true;
    };

    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(AUTH_HEADER))
        .map(|h| h.value.as_str() == expected)
        .unwrap_or(false)
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn read_request_body(request: &mut Request) -> Result<String, ApiResponse> {
    let mut body = String::new();
    let mut reader = request.as_reader().take((MAX_BODY_BYTES + 1) as u64);
    if let Err(e) = reader.read_to_string(&mut body) {
        error!("Failed to read body: {}", e);
        return Err(ApiResponse {
            status: 400,
            body: serde_json::json!({ "error": "bad_request" }),
        });
    }

    if body.len() > MAX_BODY_BYTES {
        return Err(ApiResponse {
            status: 413,
            body: serde_json::json!({ "error": "payload_too_large" }),
        });
    }

    Ok(body)
}

fn respond_json(request: Request, request_id: Uuid, response: ApiResponse) {
    let body = serde_json::to_string(&response.body)
        .unwrap_or_else(|_| "{\"error\":\"serialize\"}".to_string());
    let mut http_response = Response::from_string(body).with_status_code(response.status);
    if let Some(h) = header("Content-Type", "application/json") {
        http_response = http_response.with_header(h);
    }
    if let Some(h) = header(REQUEST_ID_HEADER, &request_id.to_string()) {
        http_response = http_response.with_header(h);
    }
    if let Err(e) = request.respond(http_response) {
        warn!("Failed to send response: {}", e);
    }
}
