//! Range-aware artifact playback handler.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use splice_core::{ByteRange, RangeError};
use tracing::{debug, warn};

use crate::server::AppState;

/// `GET /video/{session_id}`
///
/// Serves a finalized artifact. Without a `Range` header the full file is
/// returned with status 200; with one, the exact requested span is returned
/// with status 206 and a `Content-Range` header. Malformed or out-of-bounds
/// ranges are rejected with 416 rather than clamped.
pub async fn serve_video(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response<Body> {
    let total_size = match state.library.artifact_size(&session_id).await {
        Ok(Some(size)) => size,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Video not found"),
        Err(e) => {
            warn!(%session_id, "artifact lookup failed: {e}");
            let status = if e.is_user_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            return json_error(status, &e.user_message());
        }
    };

    let range_header = headers.get("range").and_then(|v| v.to_str().ok());
    let (range, partial) = match range_header {
        Some(header) => match ByteRange::parse(header, total_size) {
            Ok(range) => (range, true),
            Err(e) => return range_not_satisfiable(&e, total_size),
        },
        None => (ByteRange::full(total_size), false),
    };

    let data = match state.library.read_span(&session_id, &range).await {
        Ok(data) => data,
        Err(e) => {
            warn!(%session_id, "artifact read failed: {e}");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.user_message());
        }
    };

    debug!(
        %session_id,
        start = range.start,
        end = range.end,
        total_size,
        partial,
        "serving artifact span"
    );

    let mut response = Response::builder()
        .header("Content-Type", state.library.content_type(&session_id))
        .header("Accept-Ranges", "bytes")
        .header("Content-Length", data.len().to_string());

    if partial {
        response = response
            .status(StatusCode::PARTIAL_CONTENT)
            .header("Content-Range", range.content_range());
    } else {
        response = response.status(StatusCode::OK);
    }

    response
        .body(Body::from(data))
        .unwrap_or_else(|_| empty_status(StatusCode::INTERNAL_SERVER_ERROR))
}

fn range_not_satisfiable(error: &RangeError, total_size: u64) -> Response<Body> {
    warn!(total_size, "rejecting range request: {error}");
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header("Content-Range", format!("bytes */{total_size}"))
        .header("Content-Type", "application/json")
        .body(Body::from(format!(r#"{{"error": "{error}"}}"#)))
        .unwrap_or_else(|_| empty_status(StatusCode::RANGE_NOT_SATISFIABLE))
}

fn json_error(status: StatusCode, message: &str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(
            serde_json::json!({ "error": message }).to_string(),
        ))
        .unwrap_or_else(|_| empty_status(status))
}

fn empty_status(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}
