//! Finalize-recording handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use splice_core::{AssemblyError, validate_session_id};
use tracing::{error, info};

use super::error_response;
use crate::server::AppState;

/// Request body for `POST /finalize-recording`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    /// Session whose chunks should be reassembled
    pub session_id: String,
    /// Number of chunks the client uploaded
    pub total_chunks: u32,
}

/// `POST /finalize-recording`
///
/// Reassembles the session's chunks into the playable artifact. Failures
/// leave the stored chunks untouched, so the client may retry.
pub async fn finalize_recording(
    State(state): State<AppState>,
    request: Result<Json<FinalizeRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    // Missing or malformed fields are the client's fault, not a 422
    let Json(request) = match request {
        Ok(json) => json,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid request body: {rejection}") })),
            );
        }
    };

    if let Err(e) = validate_session_id(&request.session_id) {
        return error_response(&e);
    }
    if request.total_chunks == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "totalChunks must be at least 1" })),
        );
    }

    info!(
        session_id = %request.session_id,
        total_chunks = request.total_chunks,
        "finalizing recording"
    );

    let report = match state
        .engine
        .finalize(&request.session_id, request.total_chunks)
        .await
    {
        Ok(report) => report,
        Err(AssemblyError::NoChunksFound { session_id }) => {
            error!(%session_id, "finalize found no chunks");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("No chunks found for session {session_id}") })),
            );
        }
        Err(e) => {
            error!(session_id = %request.session_id, "finalize failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to finalize recording" })),
            );
        }
    };

    let video_path = format!("/video/{}", request.session_id);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Recording finalized",
            "videoId": &request.session_id,
            "sessionId": &request.session_id,
            "videoPath": video_path,
            "bytes": report.bytes_written,
            "chunks": report.chunks_written,
            "missingChunks": report.missing_chunks,
        })),
    )
}
