//! Multipart chunk upload handler.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use splice_core::{MAX_CHUNK_INDEX, SpliceError, validate_session_id};
use tracing::{error, info};

use super::error_response;
use crate::server::AppState;

/// `POST /upload-chunk`
///
/// Accepts a multipart form with text fields `sessionId` and `chunkIndex`
/// (decimal) plus one binary part named `chunk`. The chunk is durably stored
/// before the tracker count is updated, so a reported total never exceeds
/// what is actually on disk.
pub async fn upload_chunk(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut session_id: Option<String> = None;
    let mut chunk_index: Option<String> = None;
    let mut chunk_bytes: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return bad_request(format!("Failed to read multipart field: {e}"));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("sessionId") => match field.text().await {
                Ok(text) => session_id = Some(text),
                Err(e) => return bad_request(format!("Failed to read sessionId: {e}")),
            },
            Some("chunkIndex") => match field.text().await {
                Ok(text) => chunk_index = Some(text),
                Err(e) => return bad_request(format!("Failed to read chunkIndex: {e}")),
            },
            Some("chunk") => match field.bytes().await {
                Ok(bytes) => chunk_bytes = Some(bytes.to_vec()),
                Err(e) => return bad_request(format!("Failed to read chunk data: {e}")),
            },
            // Unknown parts are ignored rather than rejected
            _ => {}
        }
    }

    let (Some(session_id), Some(chunk_index)) = (session_id, chunk_index) else {
        return bad_request("Missing sessionId or chunkIndex".to_string());
    };
    let Some(chunk_bytes) = chunk_bytes else {
        return bad_request("No file uploaded".to_string());
    };

    if let Err(e) = validate_session_id(&session_id) {
        return error_response(&e);
    }

    let chunk_index = match chunk_index.parse::<u32>() {
        Ok(index) if index <= MAX_CHUNK_INDEX => index,
        _ => {
            return bad_request(format!("Invalid chunkIndex '{chunk_index}'"));
        }
    };

    if let Err(e) = state.chunk_store.put(&session_id, chunk_index, &chunk_bytes).await {
        error!(%session_id, chunk_index, "chunk store write failed: {e}");
        return error_response(&SpliceError::from(e));
    }

    let total_chunks = state.tracker.record_chunk(&session_id, chunk_index);

    info!(
        %session_id,
        chunk_index,
        size = chunk_bytes.len(),
        total_chunks,
        "received chunk"
    );

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": format!("Chunk {chunk_index} received"),
            "totalChunks": total_chunks,
        })),
    )
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}
