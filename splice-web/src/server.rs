//! Axum server wiring for Splice.
//!
//! Owns no business logic: the handlers delegate into splice-core through
//! explicitly injected, trait-typed state, so every collaborator can be
//! swapped for a test double.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use splice_core::{
    ArtifactLibrary, ChunkStore, FileChunkStore, InMemorySessionTracker, ReassemblyEngine,
    SessionTracker, SpliceConfig,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::handlers::{finalize_recording, health, list_recordings, serve_video, upload_chunk};

/// Shared state injected into every handler.
///
/// All collaborators are held behind `Arc`s with trait types at the seams;
/// there is no hidden global session map.
#[derive(Clone)]
pub struct AppState {
    /// In-memory record of received chunk indices per session
    pub tracker: Arc<dyn SessionTracker>,
    /// Durable per-session chunk storage
    pub chunk_store: Arc<dyn ChunkStore>,
    /// Ordered chunk concatenation
    pub engine: Arc<ReassemblyEngine>,
    /// Finalized artifact access
    pub library: Arc<ArtifactLibrary>,
    /// Per-chunk upload size limit in bytes
    pub max_chunk_bytes: u64,
    /// Server start time, for health reporting
    pub started_at: Instant,
}

impl AppState {
    /// Builds the production component graph from configuration.
    pub fn from_config(config: &SpliceConfig) -> Self {
        let tracker: Arc<dyn SessionTracker> = Arc::new(InMemorySessionTracker::new());
        let chunk_store: Arc<dyn ChunkStore> = Arc::new(FileChunkStore::new(&config.storage));
        let engine = Arc::new(ReassemblyEngine::new(
            &config.storage,
            Arc::clone(&chunk_store),
            Arc::clone(&tracker),
        ));
        let library = Arc::new(ArtifactLibrary::new(&config.storage));

        Self {
            tracker,
            chunk_store,
            engine,
            library,
            max_chunk_bytes: config.storage.max_chunk_bytes,
            started_at: Instant::now(),
        }
    }
}

/// Builds the application router with all routes, CORS, and the static UI.
pub fn build_router(state: AppState, config: &SpliceConfig) -> Router {
    let cors = if config.server.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Multipart framing adds overhead on top of the chunk itself
    let body_limit = (state.max_chunk_bytes as usize).saturating_add(1024 * 1024);

    Router::new()
        .route("/upload-chunk", post(upload_chunk))
        .route("/finalize-recording", post(finalize_recording))
        .route("/video/{session_id}", get(serve_video))
        .route("/recordings", get(list_recordings))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(&config.server.ui_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Bootstraps storage directories and runs the server until shutdown.
///
/// # Errors
///
/// Returns an error if the storage tree cannot be created or the listen
/// address cannot be bound.
pub async fn run_server(config: SpliceConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.storage.ensure_directories()?;

    let state = AppState::from_config(&config);
    let app = build_router(state, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Splice media server running on http://{} (data dir: {})",
        listener.local_addr()?,
        config.storage.data_dir.display()
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Splice media server shut down");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM so in-flight requests can drain.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
