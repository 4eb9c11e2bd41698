//! Splice Core - Chunked recording ingestion and reassembly
//!
//! This crate provides the fundamental building blocks for the Splice media
//! server: per-session chunk storage, in-memory session tracking, ordered
//! reassembly of chunks into playable artifacts, and byte-range resolution
//! for streaming playback.

pub mod assembly;
pub mod config;
pub mod library;
pub mod range;
pub mod session;
pub mod storage;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use assembly::{AssemblyError, AssemblyReport, ReassemblyEngine};
pub use config::SpliceConfig;
pub use library::{ArtifactEntry, ArtifactLibrary};
pub use range::{ByteRange, RangeError};
pub use session::{InMemorySessionTracker, SessionTracker, validate_session_id};
pub use storage::{ChunkStore, FileChunkStore, MAX_CHUNK_INDEX, StorageError};

/// Core errors that can bubble up from any Splice subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SpliceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Range error: {0}")]
    Range(#[from] RangeError),

    #[error("Validation error: {reason}")]
    Validation { reason: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpliceError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            SpliceError::Storage(StorageError::ChunkTooLarge { size, limit }) => {
                format!("Chunk of {size} bytes exceeds the {limit} byte limit")
            }
            SpliceError::Storage(_) => "Storage error occurred".to_string(),
            SpliceError::Assembly(AssemblyError::NoChunksFound { session_id }) => {
                format!("No chunks stored for session {session_id}")
            }
            SpliceError::Assembly(_) => "Failed to assemble recording".to_string(),
            SpliceError::Range(e) => e.to_string(),
            SpliceError::Validation { reason } => format!("Invalid request: {reason}"),
            SpliceError::NotFound { resource } => format!("{resource} not found"),
            SpliceError::Configuration { .. } => "Configuration error occurred".to_string(),
            SpliceError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SpliceError::Validation { .. }
                | SpliceError::Range(_)
                | SpliceError::Storage(StorageError::ChunkTooLarge { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, SpliceError>;
