//! Storage layer for uploaded recording chunks.
//!
//! Defines the chunk store interface with a file-based implementation.
//! Chunks are durable the moment `put` returns: each write lands in a temp
//! file first and is published with a single atomic rename, so a crash
//! mid-upload never leaves a partially-written chunk visible to reassembly.

pub mod chunk_store;

use std::path::PathBuf;

use async_trait::async_trait;
pub use chunk_store::FileChunkStore;

/// Largest accepted chunk index.
///
/// Bounded so the zero-padded file names stay fixed-width; past this the
/// lexicographic-order invariant of the chunk directory would break.
pub const MAX_CHUNK_INDEX: u32 = 99_999;

/// Storage operations for per-session chunk data.
///
/// Keyed by `(session_id, chunk_index)`; at most one stored chunk exists per
/// key, and re-storing an index replaces the prior bytes (last-write-wins).
/// Callers must validate session ids before they reach this layer.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Stores one chunk, creating the session's storage area on demand.
    ///
    /// # Errors
    ///
    /// - `StorageError::ChunkTooLarge` - If the chunk exceeds the configured limit
    /// - `StorageError::Io` - If a file system operation failed
    async fn put(
        &self,
        session_id: &str,
        chunk_index: u32,
        chunk_bytes: &[u8],
    ) -> Result<(), StorageError>;

    /// Lists stored chunk paths for indices `[0, expected_count)` in
    /// ascending index order.
    ///
    /// Indices with no stored chunk are omitted rather than treated as an
    /// error; reassembly is deliberately gap-tolerant and surfaces the
    /// missing count to its caller.
    ///
    /// # Errors
    ///
    /// - `StorageError::Io` - If a file system operation failed
    async fn list_ordered(
        &self,
        session_id: &str,
        expected_count: u32,
    ) -> Result<Vec<PathBuf>, StorageError>;

    /// Removes the session's chunk directory and everything in it.
    ///
    /// An already-absent directory is not an error.
    ///
    /// # Errors
    ///
    /// - `StorageError::Io` - If a file system operation failed
    async fn purge(&self, session_id: &str) -> Result<(), StorageError>;
}

/// Errors that occur during chunk storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Uploaded chunk exceeds the configured per-chunk size limit
    #[error("Chunk of {size} bytes exceeds limit of {limit} bytes")]
    ChunkTooLarge {
        /// Size of the rejected chunk
        size: u64,
        /// Configured maximum chunk size
        limit: u64,
    },

    /// Standard I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
