//! HTTP boundary: a thin Axum router in front of the prompt builder and
//! completion client.
//!
//! One business route, `POST /api/study`, plus `GET /health`. The study
//! handler validates the payload, builds the mode prompt, calls the
//! provider, cleans the returned markdown, and records the run in history.
//! Validation failures answer 400 and configuration/upstream failures
//! answer 500, always with an `{ "error": ... }` body; only a successful
//! completion produces `{ "result": ... }` and a history entry.

use crate::completion::CompletionProvider;
use crate::error::StudyError;
use crate::history::HistoryStore;
use crate::mode::Mode;
use crate::postprocess::clean_markdown;
use crate::prompts::build_prompt;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Notes shorter than this (after trimming) are rejected at the boundary.
pub const MIN_NOTES_CHARS: usize = 10;

/// Shared state behind every handler.
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub history: tokio::sync::Mutex<HistoryStore>,
}

impl AppState {
    pub fn new(provider: Arc<dyn CompletionProvider>, history: HistoryStore) -> Arc<Self> {
        Arc::new(Self {
            provider,
            history: tokio::sync::Mutex::new(history),
        })
    }
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/study", post(study))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: std::net::SocketAddr, state: Arc<AppState>) -> Result<(), StudyError> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StudyError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .map_err(|e| StudyError::Internal(format!("server error: {e}")))?;
    Ok(())
}

// ── Responses ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct StudyResponse {
    pub result: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

// ── Handlers ──────────────────────────────────────────────────────

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /api/study`: validate `{ notes, mode }`, generate, record.
///
/// The body is taken as a raw JSON value so that a missing or wrongly-typed
/// field answers 400 with our error shape rather than the extractor's
/// default rejection.
pub async fn study(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<StudyResponse>, ApiError> {
    let notes = match body.get("notes").and_then(Value::as_str) {
        Some(n) if n.trim().chars().count() >= MIN_NOTES_CHARS => n,
        _ => return Err(bad_request("Please provide at least 10 characters of notes.")),
    };

    let mode = match body
        .get("mode")
        .and_then(Value::as_str)
        .and_then(|m| Mode::from_str(m).ok())
    {
        Some(mode) => mode,
        None => return Err(bad_request("Invalid mode.")),
    };

    let prompt = build_prompt(notes, mode);
    let raw = state.provider.complete(&prompt).await.map_err(|e| {
        error!("completion failed: {e}");
        let status = if e.is_server_fault() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_REQUEST
        };
        (status, Json(ErrorResponse { error: e.to_string() }))
    })?;

    let result = clean_markdown(&raw);
    info!(%mode, notes_chars = notes.chars().count(), "generated study artifact");

    // History is best-effort bookkeeping: the entry is recorded (and
    // persisted, if it can be) after a successful run only.
    state
        .history
        .lock()
        .await
        .append(mode, notes.to_string(), result.clone());

    Ok(Json(StudyResponse { result }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_carries_message() {
        let (status, Json(body)) = bad_request("Invalid mode.");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Invalid mode.");
    }

    #[test]
    fn notes_threshold_counts_trimmed_chars() {
        // 9 chars after trim, just under the boundary
        let body: Value = serde_json::json!({ "notes": "  123456789  ", "mode": "quiz" });
        let trimmed = body["notes"].as_str().unwrap().trim();
        assert!(trimmed.chars().count() < MIN_NOTES_CHARS);
    }
}
