//! HTTP request handlers organized by functionality

pub mod api;
pub mod finalize;
pub mod playback;
pub mod upload;

pub use api::{health, list_recordings};
pub use finalize::finalize_recording;
pub use playback::serve_video;
pub use upload::upload_chunk;

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};
use splice_core::SpliceError;

/// Maps a core error onto the boundary taxonomy: validation → 400,
/// not-found → 404, range → 416, everything else → 500.
pub(crate) fn error_response(error: &SpliceError) -> (StatusCode, Json<Value>) {
    let status = match error {
        SpliceError::Validation { .. } => StatusCode::BAD_REQUEST,
        SpliceError::NotFound { .. } => StatusCode::NOT_FOUND,
        SpliceError::Range(_) => StatusCode::RANGE_NOT_SATISFIABLE,
        SpliceError::Storage(splice_core::StorageError::ChunkTooLarge { .. }) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.user_message() })))
}
