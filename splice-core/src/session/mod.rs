//! Session tracking for in-progress recording uploads.
//!
//! A session is one client's recording, identified by a client-chosen opaque
//! string. The tracker records which chunk indices have arrived so the upload
//! endpoint can report progress and the health endpoint can count active
//! uploads. Bookkeeping is process-lifetime only: a restart loses the counts
//! while chunks already on disk survive.

pub mod memory;

pub use memory::InMemorySessionTracker;

use crate::SpliceError;

/// Maximum accepted length of a client-supplied session identifier.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// Tracks received chunk indices for active recording sessions.
///
/// Implementations must keep per-session updates atomic: concurrent uploads
/// for the same session must not lose an increment, and uploads for different
/// sessions must not contend beyond the map itself.
pub trait SessionTracker: Send + Sync {
    /// Records arrival of a chunk, creating the session entry on first use.
    ///
    /// Returns the number of distinct chunk indices received for the session
    /// after this update. Re-recording an already-seen index does not grow
    /// the count.
    fn record_chunk(&self, session_id: &str, chunk_index: u32) -> usize;

    /// Removes all bookkeeping for the session. Unknown sessions are a no-op.
    fn forget(&self, session_id: &str);

    /// Number of sessions currently tracked, for health reporting.
    fn active_sessions(&self) -> usize;
}

/// Validates a client-supplied session identifier before any path join.
///
/// Session ids become filesystem path components, so only an allow-list of
/// characters is accepted: ASCII alphanumerics, `-` and `_`. This rejects
/// traversal sequences, separators, and empty or oversized ids by
/// construction.
///
/// # Errors
///
/// - `SpliceError::Validation` - If the id is empty, too long, or contains
///   a character outside the allow-list
pub fn validate_session_id(session_id: &str) -> Result<(), SpliceError> {
    if session_id.is_empty() {
        return Err(SpliceError::Validation {
            reason: "session id is empty".to_string(),
        });
    }

    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(SpliceError::Validation {
            reason: format!(
                "session id exceeds {MAX_SESSION_ID_LEN} characters"
            ),
        });
    }

    if !session_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(SpliceError::Validation {
            reason: format!("session id '{session_id}' contains invalid characters"),
        });
    }

    Ok(())
}
