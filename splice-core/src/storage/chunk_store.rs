//! File system-based chunk store.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::{ChunkStore, StorageError};
use crate::config::StorageConfig;

/// Stores chunks as individual files in per-session directories.
///
/// Layout: `<chunks_dir>/<session_id>/chunk_<index>.{ext}` with the index
/// zero-padded to a fixed width, so a lexicographic directory listing equals
/// chunk order. The reassembly engine relies on that naming invariant; it
/// never orders by arrival time or mtime.
pub struct FileChunkStore {
    chunks_dir: PathBuf,
    temp_dir: PathBuf,
    max_chunk_bytes: u64,
    index_width: usize,
    extension: &'static str,
}

impl FileChunkStore {
    /// Creates a chunk store over the configured storage layout.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            chunks_dir: config.chunks_dir(),
            temp_dir: config.temp_dir(),
            max_chunk_bytes: config.max_chunk_bytes,
            index_width: config.chunk_index_width,
            extension: config.artifact_extension,
        }
    }

    /// Path of the stored chunk file for `(session_id, chunk_index)`.
    pub fn chunk_path(&self, session_id: &str, chunk_index: u32) -> PathBuf {
        self.chunks_dir.join(session_id).join(format!(
            "chunk_{:0width$}.{}",
            chunk_index,
            self.extension,
            width = self.index_width
        ))
    }
}

#[async_trait]
impl ChunkStore for FileChunkStore {
    async fn put(
        &self,
        session_id: &str,
        chunk_index: u32,
        chunk_bytes: &[u8],
    ) -> Result<(), StorageError> {
        let size = chunk_bytes.len() as u64;
        if size > self.max_chunk_bytes {
            return Err(StorageError::ChunkTooLarge {
                size,
                limit: self.max_chunk_bytes,
            });
        }

        let chunk_path = self.chunk_path(session_id, chunk_index);
        if let Some(parent) = chunk_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::create_dir_all(&self.temp_dir).await?;

        // Write to a temp file, then publish with one atomic rename. A
        // re-upload of the same index replaces the prior chunk the same way.
        let temp_path = self.temp_dir.join(format!("{}.part", Uuid::new_v4()));
        fs::write(&temp_path, chunk_bytes).await?;
        if let Err(e) = fs::rename(&temp_path, &chunk_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(
            session_id,
            chunk_index, size, "stored chunk {}", chunk_path.display()
        );
        Ok(())
    }

    async fn list_ordered(
        &self,
        session_id: &str,
        expected_count: u32,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let mut paths = Vec::new();
        for index in 0..expected_count {
            let path = self.chunk_path(session_id, index);
            if fs::try_exists(&path).await? {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    async fn purge(&self, session_id: &str) -> Result<(), StorageError> {
        let session_dir = self.chunks_dir.join(session_id);
        match fs::remove_dir_all(&session_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpliceConfig;

    fn test_store(temp: &tempfile::TempDir) -> FileChunkStore {
        let config = SpliceConfig::for_testing(temp.path());
        FileChunkStore::new(&config.storage)
    }

    #[tokio::test]
    async fn test_put_creates_session_dir_and_stores_bytes() {
        let temp = tempfile::tempdir().unwrap();
        let store = test_store(&temp);

        store.put("s1", 0, b"hello").await.unwrap();

        let stored = fs::read(store.chunk_path("s1", 0)).await.unwrap();
        assert_eq!(stored, b"hello");
    }

    #[tokio::test]
    async fn test_chunk_names_sort_in_index_order() {
        let temp = tempfile::tempdir().unwrap();
        let store = test_store(&temp);

        // Padded names must sort lexicographically even past one digit
        let early = store.chunk_path("s1", 2);
        let late = store.chunk_path("s1", 10);
        assert!(early.file_name().unwrap() < late.file_name().unwrap());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_index() {
        let temp = tempfile::tempdir().unwrap();
        let store = test_store(&temp);

        store.put("s1", 3, b"first").await.unwrap();
        store.put("s1", 3, b"second").await.unwrap();

        let stored = fs::read(store.chunk_path("s1", 3)).await.unwrap();
        assert_eq!(stored, b"second");
    }

    #[tokio::test]
    async fn test_put_rejects_oversized_chunk() {
        let temp = tempfile::tempdir().unwrap();
        let config = SpliceConfig::for_testing(temp.path());
        let mut storage = config.storage.clone();
        storage.max_chunk_bytes = 4;
        let store = FileChunkStore::new(&storage);

        let result = store.put("s1", 0, b"too big").await;
        assert!(matches!(
            result,
            Err(StorageError::ChunkTooLarge { size: 7, limit: 4 })
        ));

        // Nothing may land on disk for a rejected chunk
        assert!(!store.chunk_path("s1", 0).exists());
    }

    #[tokio::test]
    async fn test_list_ordered_skips_gaps() {
        let temp = tempfile::tempdir().unwrap();
        let store = test_store(&temp);

        store.put("s1", 0, b"a").await.unwrap();
        store.put("s1", 2, b"c").await.unwrap();

        let paths = store.list_ordered("s1", 3).await.unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], store.chunk_path("s1", 0));
        assert_eq!(paths[1], store.chunk_path("s1", 2));
    }

    #[tokio::test]
    async fn test_list_ordered_ignores_indices_past_expected() {
        let temp = tempfile::tempdir().unwrap();
        let store = test_store(&temp);

        store.put("s1", 0, b"a").await.unwrap();
        store.put("s1", 5, b"stray").await.unwrap();

        let paths = store.list_ordered("s1", 2).await.unwrap();
        assert_eq!(paths, vec![store.chunk_path("s1", 0)]);
    }

    #[tokio::test]
    async fn test_session_named_temp_does_not_clobber_temp_dir() {
        let temp = tempfile::tempdir().unwrap();
        let config = SpliceConfig::for_testing(temp.path());
        let store = FileChunkStore::new(&config.storage);

        store.put("temp", 0, b"payload").await.unwrap();
        // Another session's write still in flight in the shared temp area
        let in_flight = config.storage.temp_dir().join("in-flight.part");
        fs::write(&in_flight, b"partial").await.unwrap();

        store.purge("temp").await.unwrap();

        assert!(fs::try_exists(&in_flight).await.unwrap());
        assert!(!store.chunk_path("temp", 0).exists());
    }

    #[tokio::test]
    async fn test_purge_removes_session_dir() {
        let temp = tempfile::tempdir().unwrap();
        let store = test_store(&temp);

        store.put("s1", 0, b"a").await.unwrap();
        store.purge("s1").await.unwrap();

        assert!(!store.chunk_path("s1", 0).parent().unwrap().exists());

        // Purging an unknown session is not an error
        store.purge("never-seen").await.unwrap();
    }
}
