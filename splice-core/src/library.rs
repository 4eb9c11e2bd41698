//! Finalized artifact library.
//!
//! Resolves client-supplied artifact identifiers to files in the final
//! directory and reads byte spans of them for streaming playback. Identifier
//! validation happens here as well as at the boundary, so no path derived
//! from client input ever escapes the final directory.

use std::io::SeekFrom;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::config::StorageConfig;
use crate::range::ByteRange;
use crate::session::validate_session_id;
use crate::{Result, SpliceError};

/// One finalized recording, as reported by the listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactEntry {
    pub session_id: String,
    pub filename: String,
    pub size: u64,
    pub created: DateTime<Utc>,
}

/// Read access to finalized artifacts.
pub struct ArtifactLibrary {
    final_dir: PathBuf,
    extension: &'static str,
}

impl ArtifactLibrary {
    /// Creates a library over the configured final directory.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            final_dir: config.final_dir(),
            extension: config.artifact_extension,
        }
    }

    /// Resolves an artifact identifier to its path in the final directory.
    ///
    /// Clients may pass either the bare session id or the artifact filename
    /// (id plus extension); the extension is stripped before validation.
    ///
    /// # Errors
    ///
    /// - `SpliceError::Validation` - If the identifier fails the session-id
    ///   allow-list after suffix stripping
    pub fn resolve(&self, artifact_id: &str) -> Result<PathBuf> {
        let suffix = format!(".{}", self.extension);
        let session_id = artifact_id.strip_suffix(&suffix).unwrap_or(artifact_id);
        validate_session_id(session_id)?;
        Ok(self
            .final_dir
            .join(format!("{session_id}.{}", self.extension)))
    }

    /// Size of an artifact in bytes, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// - `SpliceError::Validation` - If the identifier is invalid
    /// - `SpliceError::Io` - If the metadata lookup failed
    pub async fn artifact_size(&self, artifact_id: &str) -> Result<Option<u64>> {
        let path = self.resolve(artifact_id)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads exactly the bytes covered by a validated range.
    ///
    /// # Errors
    ///
    /// - `SpliceError::NotFound` - If the artifact is absent
    /// - `SpliceError::Io` - If the read failed
    pub async fn read_span(&self, artifact_id: &str, range: &ByteRange) -> Result<Vec<u8>> {
        let path = self.resolve(artifact_id)?;
        let mut file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SpliceError::NotFound {
                    resource: format!("artifact {artifact_id}"),
                });
            }
            Err(e) => return Err(e.into()),
        };

        file.seek(SeekFrom::Start(range.start)).await?;
        let mut data = vec![0u8; range.length() as usize];
        file.read_exact(&mut data).await?;
        Ok(data)
    }

    /// MIME type for an artifact, derived from its extension.
    pub fn content_type(&self, artifact_id: &str) -> String {
        let filename = format!("{artifact_id}.{}", self.extension);
        mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string()
    }

    /// Lists all finalized artifacts, newest first.
    ///
    /// # Errors
    ///
    /// - `SpliceError::Io` - If the directory listing failed
    pub async fn list(&self) -> Result<Vec<ArtifactEntry>> {
        let mut entries = Vec::new();
        let mut dir = match fs::read_dir(&self.final_dir).await {
            Ok(dir) => dir,
            // Nothing finalized yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };

        let suffix = format!(".{}", self.extension);
        while let Some(entry) = dir.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            let Some(session_id) = filename.strip_suffix(&suffix) else {
                continue;
            };
            // Skip in-flight temp files and anything else outside the naming scheme
            if validate_session_id(session_id).is_err() {
                continue;
            }

            let meta = entry.metadata().await?;
            let created = meta
                .created()
                .or_else(|_| meta.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            entries.push(ArtifactEntry {
                session_id: session_id.to_string(),
                filename,
                size: meta.len(),
                created,
            });
        }

        entries.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpliceConfig;

    async fn seed_artifact(config: &SpliceConfig, session_id: &str, data: &[u8]) {
        let path = config.storage.final_dir().join(format!("{session_id}.webm"));
        fs::write(path, data).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_strips_extension_and_validates() {
        let temp = tempfile::tempdir().unwrap();
        let config = SpliceConfig::for_testing(temp.path());
        let library = ArtifactLibrary::new(&config.storage);

        let bare = library.resolve("abc123").unwrap();
        let suffixed = library.resolve("abc123.webm").unwrap();
        assert_eq!(bare, suffixed);

        assert!(library.resolve("../escape").is_err());
        assert!(library.resolve("a/b.webm").is_err());
    }

    #[tokio::test]
    async fn test_artifact_size_absent_is_none() {
        let temp = tempfile::tempdir().unwrap();
        let config = SpliceConfig::for_testing(temp.path());
        config.storage.ensure_directories().unwrap();
        let library = ArtifactLibrary::new(&config.storage);

        assert_eq!(library.artifact_size("missing").await.unwrap(), None);

        seed_artifact(&config, "present", &[0u8; 42]).await;
        assert_eq!(library.artifact_size("present").await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_read_span_returns_exact_bytes() {
        let temp = tempfile::tempdir().unwrap();
        let config = SpliceConfig::for_testing(temp.path());
        config.storage.ensure_directories().unwrap();
        let library = ArtifactLibrary::new(&config.storage);

        let data: Vec<u8> = (0..=255).collect();
        seed_artifact(&config, "bytes", &data).await;

        let range = ByteRange::parse("bytes=16-31", 256).unwrap();
        let span = library.read_span("bytes", &range).await.unwrap();
        assert_eq!(span, &data[16..=31]);

        let full = library
            .read_span("bytes", &ByteRange::full(256))
            .await
            .unwrap();
        assert_eq!(full, data);
    }

    #[tokio::test]
    async fn test_list_skips_foreign_files_and_sorts() {
        let temp = tempfile::tempdir().unwrap();
        let config = SpliceConfig::for_testing(temp.path());
        config.storage.ensure_directories().unwrap();
        let library = ArtifactLibrary::new(&config.storage);

        seed_artifact(&config, "first", b"aa").await;
        seed_artifact(&config, "second", b"bbbb").await;
        // Temp files and stray names must not appear in listings
        fs::write(
            config.storage.final_dir().join(".first.123.tmp"),
            b"partial",
        )
        .await
        .unwrap();
        fs::write(config.storage.final_dir().join("notes.txt"), b"x")
            .await
            .unwrap();

        let entries = library.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.session_id == "first" && e.size == 2));
        assert!(entries.iter().any(|e| e.session_id == "second" && e.size == 4));
    }

    #[tokio::test]
    async fn test_list_empty_when_final_dir_missing() {
        let temp = tempfile::tempdir().unwrap();
        let config = SpliceConfig::for_testing(temp.path());
        let library = ArtifactLibrary::new(&config.storage);

        assert!(library.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_content_type_for_webm() {
        let temp = tempfile::tempdir().unwrap();
        let config = SpliceConfig::for_testing(temp.path());
        let library = ArtifactLibrary::new(&config.storage);

        assert_eq!(library.content_type("abc"), "video/webm");
    }
}
