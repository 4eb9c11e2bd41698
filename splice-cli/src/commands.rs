//! CLI command implementations

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use splice_core::config::SpliceConfig;
use splice_core::library::ArtifactLibrary;
use splice_core::tracing_setup::{CliLogLevel, init_tracing};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the upload and playback server
    Server {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Root directory for chunks and artifacts
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Directory of static UI assets
        #[arg(long)]
        ui_dir: Option<PathBuf>,
        /// Console log level
        #[arg(long, default_value = "info")]
        log_level: CliLogLevel,
    },
    /// List finalized recordings
    Recordings {
        /// Root directory for chunks and artifacts
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Server {
            host,
            port,
            data_dir,
            ui_dir,
            log_level,
        } => start_server(host, port, data_dir, ui_dir, log_level).await,
        Commands::Recordings { data_dir } => list_recordings(data_dir).await,
    }
}

/// Build configuration from environment plus CLI overrides.
fn build_config(
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    ui_dir: Option<PathBuf>,
) -> SpliceConfig {
    let mut config = SpliceConfig::from_env();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(dir) = ui_dir {
        config.server.ui_dir = dir;
    }
    config
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    ui_dir: Option<PathBuf>,
    log_level: CliLogLevel,
) -> anyhow::Result<()> {
    init_tracing(log_level.as_tracing_level(), None)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let config = build_config(host, port, data_dir, ui_dir);

    println!("Starting Splice server...");
    println!("Listen: http://{}:{}", config.server.host, config.server.port);
    println!("Data directory: {}", config.storage.data_dir.display());
    println!(
        "Chunk size limit: {} MiB",
        config.storage.max_chunk_bytes / (1024 * 1024)
    );
    println!("Press Ctrl+C to stop the server");

    splice_web::run_server(config)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}

async fn list_recordings(data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = build_config(None, None, data_dir, None);
    let library = ArtifactLibrary::new(&config.storage);

    let entries = library
        .list()
        .await
        .context("failed to list recordings")?;

    if entries.is_empty() {
        println!("No finalized recordings.");
        println!(
            "Looked in: {}",
            config.storage.final_dir().display()
        );
        return Ok(());
    }

    println!("{:<30} {:>12} {:<25}", "SESSION", "SIZE", "CREATED");
    println!("{:-<70}", "");
    for entry in entries {
        println!(
            "{:<30} {:>12} {:<25}",
            entry.session_id,
            format_size(entry.size),
            entry.created.to_rfc3339()
        );
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_applies_overrides() {
        let config = build_config(
            Some("127.0.0.1".to_string()),
            Some(8080),
            Some(PathBuf::from("/tmp/splice-cli-test")),
            None,
        );

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/splice-cli-test"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1_048_576), "3.00 MB");
    }
}
