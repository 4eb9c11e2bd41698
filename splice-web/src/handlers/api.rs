//! Listing and health endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::error;

use crate::server::AppState;

/// `GET /recordings`
///
/// Lists finalized artifacts, newest first.
pub async fn list_recordings(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let entries = state.library.list().await.map_err(|e| {
        error!("failed to list recordings: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to list recordings" })),
        )
    })?;

    let recordings: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "sessionId": entry.session_id,
                "filename": entry.filename,
                "size": entry.size,
                "created": entry.created.to_rfc3339(),
                "url": format!("/video/{}", entry.session_id),
            })
        })
        .collect();

    Ok(Json(json!(recordings)))
}

/// `GET /health`
///
/// Liveness and diagnostics: active upload sessions, uptime, and version.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "activeSessions": state.tracker.active_sessions(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
