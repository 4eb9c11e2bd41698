//! Centralized configuration for Splice.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::path::{Path, PathBuf};

/// Central configuration for all Splice components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct SpliceConfig {
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

/// Chunk and artifact storage configuration.
///
/// Controls the on-disk layout: a transient chunks area subdivided per
/// session, a temp area for in-flight writes, and a final area holding one
/// artifact per finalized session.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all persisted data
    pub data_dir: PathBuf,
    /// Maximum accepted size for a single uploaded chunk
    pub max_chunk_bytes: u64,
    /// Zero-padded width of chunk indices in file names
    pub chunk_index_width: usize,
    /// File extension for stored chunks and finished artifacts
    pub artifact_extension: &'static str,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            max_chunk_bytes: 50 * 1024 * 1024, // 50 MiB per chunk
            chunk_index_width: 5,
            artifact_extension: "webm",
        }
    }
}

impl StorageConfig {
    /// Directory holding per-session chunk subdirectories.
    pub fn chunks_dir(&self) -> PathBuf {
        self.data_dir.join("uploads").join("chunks")
    }

    /// Directory for in-flight temporary writes, renamed into place on
    /// commit. Kept outside `chunks_dir` so no session id can map onto it.
    pub fn temp_dir(&self) -> PathBuf {
        self.data_dir.join("uploads").join("temp")
    }

    /// Directory holding one finalized artifact per session.
    pub fn final_dir(&self) -> PathBuf {
        self.data_dir.join("uploads").join("final")
    }

    /// Creates the storage directory tree if it does not exist.
    ///
    /// # Errors
    ///
    /// - `std::io::Error` - If a directory cannot be created
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [self.chunks_dir(), self.temp_dir(), self.final_dir()] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Allowed CORS origins; empty means permissive
    pub cors_origins: Vec<String>,
    /// Directory of static UI assets served at the root path
    pub ui_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            ui_dir: PathBuf::from("public"),
        }
    }
}

impl SpliceConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("SPLICE_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }

        if let Ok(limit) = std::env::var("SPLICE_MAX_CHUNK_BYTES") {
            if let Ok(bytes) = limit.parse::<u64>() {
                config.storage.max_chunk_bytes = bytes;
            }
        }

        if let Ok(port) = std::env::var("SPLICE_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.server.port = port;
            }
        }

        if let Ok(host) = std::env::var("SPLICE_HOST") {
            config.server.host = host;
        }

        if let Ok(origins) = std::env::var("SPLICE_CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        config
    }

    /// Creates a configuration rooted at the given directory, for tests.
    pub fn for_testing(data_dir: &Path) -> Self {
        Self {
            storage: StorageConfig {
                data_dir: data_dir.to_path_buf(),
                ..Default::default()
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = SpliceConfig::default();

        assert_eq!(config.storage.max_chunk_bytes, 50 * 1024 * 1024);
        assert_eq!(config.storage.chunk_index_width, 5);
        assert_eq!(config.storage.artifact_extension, "webm");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.cors_origins.is_empty());
    }

    #[test]
    fn test_storage_layout_nests_under_data_dir() {
        let config = StorageConfig {
            data_dir: PathBuf::from("/srv/splice"),
            ..Default::default()
        };

        assert_eq!(
            config.chunks_dir(),
            PathBuf::from("/srv/splice/uploads/chunks")
        );
        assert_eq!(
            config.temp_dir(),
            PathBuf::from("/srv/splice/uploads/temp")
        );
        assert_eq!(
            config.final_dir(),
            PathBuf::from("/srv/splice/uploads/final")
        );
    }

    #[test]
    fn test_ensure_directories_creates_tree() {
        let temp = tempfile::tempdir().unwrap();
        let config = SpliceConfig::for_testing(temp.path());

        config.storage.ensure_directories().unwrap();

        assert!(config.storage.chunks_dir().is_dir());
        assert!(config.storage.temp_dir().is_dir());
        assert!(config.storage.final_dir().is_dir());
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("SPLICE_DATA_DIR", "/tmp/splice-env-test");
            std::env::set_var("SPLICE_MAX_CHUNK_BYTES", "1048576");
            std::env::set_var("SPLICE_PORT", "8080");
            std::env::set_var("SPLICE_CORS_ORIGINS", "http://localhost:5173, https://app.example.com");
        }

        let config = SpliceConfig::from_env();

        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/splice-env-test"));
        assert_eq!(config.storage.max_chunk_bytes, 1_048_576);
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.server.cors_origins,
            vec![
                "http://localhost:5173".to_string(),
                "https://app.example.com".to_string()
            ]
        );

        // Cleanup
        unsafe {
            std::env::remove_var("SPLICE_DATA_DIR");
            std::env::remove_var("SPLICE_MAX_CHUNK_BYTES");
            std::env::remove_var("SPLICE_PORT");
            std::env::remove_var("SPLICE_CORS_ORIGINS");
        }
    }
}
