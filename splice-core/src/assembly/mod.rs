//! Ordered reassembly of stored chunks into a playable artifact.
//!
//! Concatenation is the correctness core of the system: media containers are
//! order-sensitive, so chunk N+1 is never appended until chunk N's bytes are
//! fully written. Concatenation is byte-level only; the capture format is
//! assumed to produce segments that concatenate into one valid stream, and no
//! container-aware remuxing happens here.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::session::SessionTracker;
use crate::storage::{ChunkStore, StorageError};

/// Outcome of a successful reassembly.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    /// Final artifact location
    pub artifact_path: PathBuf,
    /// Total artifact size in bytes
    pub bytes_written: u64,
    /// Number of chunks concatenated
    pub chunks_written: usize,
    /// Expected indices with no stored chunk, skipped during concatenation
    pub missing_chunks: usize,
}

/// Errors that occur during reassembly.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// No stored chunks exist for the session
    #[error("No chunks found for session {session_id}")]
    NoChunksFound {
        /// Session that had nothing to assemble
        session_id: String,
    },

    /// Chunk store operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Reading a chunk or writing the artifact failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Concatenates a session's stored chunks into one artifact.
///
/// Finalize is serialized per session: duplicate concurrent calls queue on a
/// per-session lock, exactly one performs the reassembly and purge, and the
/// loser observes the already-purged state as `NoChunksFound`.
pub struct ReassemblyEngine {
    chunk_store: Arc<dyn ChunkStore>,
    tracker: Arc<dyn SessionTracker>,
    final_dir: PathBuf,
    extension: &'static str,
    // Lock entries are kept for the process lifetime; one Arc per session id
    // ever finalized is negligible next to the chunks themselves.
    finalize_locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ReassemblyEngine {
    /// Creates an engine writing artifacts into the configured final dir.
    pub fn new(
        config: &StorageConfig,
        chunk_store: Arc<dyn ChunkStore>,
        tracker: Arc<dyn SessionTracker>,
    ) -> Self {
        Self {
            chunk_store,
            tracker,
            final_dir: config.final_dir(),
            extension: config.artifact_extension,
            finalize_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Final artifact path for a session.
    pub fn artifact_path(&self, session_id: &str) -> PathBuf {
        self.final_dir
            .join(format!("{session_id}.{}", self.extension))
    }

    fn finalize_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.finalize_locks.lock();
        Arc::clone(
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Reassembles all stored chunks for the session, in index order, into
    /// one artifact, then purges the chunks and forgets the session.
    ///
    /// The artifact is written to a temp name and renamed into place on
    /// success, so a concurrently-streaming reader never observes a
    /// half-written file. On failure the temp file is removed and chunks are
    /// left untouched, so finalize can be retried.
    ///
    /// # Errors
    ///
    /// - `AssemblyError::NoChunksFound` - If the session has no stored chunks
    /// - `AssemblyError::Storage` / `AssemblyError::Io` - If a file system
    ///   operation failed; no chunks are purged in this case
    pub async fn finalize(
        &self,
        session_id: &str,
        expected_chunks: u32,
    ) -> Result<AssemblyReport, AssemblyError> {
        let lock = self.finalize_lock(session_id);
        let _guard = lock.lock().await;

        let chunk_paths = self
            .chunk_store
            .list_ordered(session_id, expected_chunks)
            .await?;

        if chunk_paths.is_empty() {
            return Err(AssemblyError::NoChunksFound {
                session_id: session_id.to_string(),
            });
        }

        let missing_chunks = expected_chunks as usize - chunk_paths.len();
        if missing_chunks > 0 {
            warn!(
                session_id,
                expected_chunks, missing_chunks, "assembling with missing chunks"
            );
        }

        fs::create_dir_all(&self.final_dir).await?;
        let temp_path = self
            .final_dir
            .join(format!(".{session_id}.{}.tmp", Uuid::new_v4()));

        let result = self.concatenate(&chunk_paths, &temp_path).await;
        let bytes_written = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }
        };

        let artifact_path = self.artifact_path(session_id);
        if let Err(e) = fs::rename(&temp_path, &artifact_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        // Only after the artifact is published do the sources go away.
        self.chunk_store.purge(session_id).await?;
        self.tracker.forget(session_id);

        info!(
            session_id,
            bytes_written,
            chunks = chunk_paths.len(),
            missing_chunks,
            "finalized recording {}",
            artifact_path.display()
        );

        Ok(AssemblyReport {
            artifact_path,
            bytes_written,
            chunks_written: chunk_paths.len(),
            missing_chunks,
        })
    }

    /// Appends each chunk's bytes to `dest` strictly sequentially.
    async fn concatenate(
        &self,
        chunk_paths: &[PathBuf],
        dest: &PathBuf,
    ) -> std::io::Result<u64> {
        let mut writer = BufWriter::new(fs::File::create(dest).await?);
        let mut total = 0u64;

        for path in chunk_paths {
            let mut reader = fs::File::open(path).await?;
            total += tokio::io::copy(&mut reader, &mut writer).await?;
            // Chunk fully on its way to disk before the next one begins
            writer.flush().await?;
        }

        writer.into_inner().sync_all().await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpliceConfig;
    use crate::session::InMemorySessionTracker;
    use crate::storage::FileChunkStore;

    fn test_engine(
        temp: &tempfile::TempDir,
    ) -> (ReassemblyEngine, Arc<FileChunkStore>, Arc<InMemorySessionTracker>) {
        let config = SpliceConfig::for_testing(temp.path());
        config.storage.ensure_directories().unwrap();
        let store = Arc::new(FileChunkStore::new(&config.storage));
        let tracker = Arc::new(InMemorySessionTracker::new());
        let engine = ReassemblyEngine::new(
            &config.storage,
            Arc::clone(&store) as Arc<dyn ChunkStore>,
            Arc::clone(&tracker) as Arc<dyn SessionTracker>,
        );
        (engine, store, tracker)
    }

    #[tokio::test]
    async fn test_finalize_concatenates_in_index_order() {
        let temp = tempfile::tempdir().unwrap();
        let (engine, store, tracker) = test_engine(&temp);

        // Arrival order 2, 0, 1 must not matter
        store.put("s1", 2, &[b'c'; 30]).await.unwrap();
        tracker.record_chunk("s1", 2);
        store.put("s1", 0, &[b'a'; 10]).await.unwrap();
        tracker.record_chunk("s1", 0);
        store.put("s1", 1, &[b'b'; 20]).await.unwrap();
        tracker.record_chunk("s1", 1);

        let report = engine.finalize("s1", 3).await.unwrap();

        assert_eq!(report.bytes_written, 60);
        assert_eq!(report.chunks_written, 3);
        assert_eq!(report.missing_chunks, 0);

        let mut expected = vec![b'a'; 10];
        expected.extend(vec![b'b'; 20]);
        expected.extend(vec![b'c'; 30]);
        let artifact = fs::read(&report.artifact_path).await.unwrap();
        assert_eq!(artifact, expected);

        // Session state and chunk directory are gone
        assert_eq!(tracker.active_sessions(), 0);
        assert!(!store.chunk_path("s1", 0).parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_finalize_reuploaded_chunk_contributes_once() {
        let temp = tempfile::tempdir().unwrap();
        let (engine, store, _tracker) = test_engine(&temp);

        store.put("s1", 0, b"old-bytes").await.unwrap();
        store.put("s1", 0, b"new").await.unwrap();
        store.put("s1", 1, b"tail").await.unwrap();

        let report = engine.finalize("s1", 2).await.unwrap();

        let artifact = fs::read(&report.artifact_path).await.unwrap();
        assert_eq!(artifact, b"newtail");
    }

    #[tokio::test]
    async fn test_finalize_empty_session_fails_without_side_effects() {
        let temp = tempfile::tempdir().unwrap();
        let (engine, _store, _tracker) = test_engine(&temp);

        let result = engine.finalize("ghost", 3).await;
        assert!(matches!(result, Err(AssemblyError::NoChunksFound { .. })));

        assert!(!engine.artifact_path("ghost").exists());
    }

    #[tokio::test]
    async fn test_finalize_tolerates_missing_middle_chunk() {
        let temp = tempfile::tempdir().unwrap();
        let (engine, store, _tracker) = test_engine(&temp);

        store.put("s1", 0, b"head").await.unwrap();
        store.put("s1", 2, b"tail").await.unwrap();

        let report = engine.finalize("s1", 3).await.unwrap();

        assert_eq!(report.missing_chunks, 1);
        let artifact = fs::read(&report.artifact_path).await.unwrap();
        assert_eq!(artifact, b"headtail");
    }

    #[tokio::test]
    async fn test_concurrent_finalize_single_winner() {
        let temp = tempfile::tempdir().unwrap();
        let (engine, store, _tracker) = test_engine(&temp);
        let engine = Arc::new(engine);

        store.put("s1", 0, b"only").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(
                async move { engine.finalize("s1", 1).await },
            ));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        // Exactly one reassembly+purge wins; the rest see the purged state
        assert_eq!(successes, 1);
        let artifact = fs::read(engine.artifact_path("s1")).await.unwrap();
        assert_eq!(artifact, b"only");
    }

    #[tokio::test]
    async fn test_finalize_after_success_reports_no_chunks() {
        let temp = tempfile::tempdir().unwrap();
        let (engine, store, _tracker) = test_engine(&temp);

        store.put("s1", 0, b"bytes").await.unwrap();
        engine.finalize("s1", 1).await.unwrap();

        let again = engine.finalize("s1", 1).await;
        assert!(matches!(again, Err(AssemblyError::NoChunksFound { .. })));

        // The published artifact is untouched by the failed repeat
        let artifact = fs::read(engine.artifact_path("s1")).await.unwrap();
        assert_eq!(artifact, b"bytes");
    }
}
