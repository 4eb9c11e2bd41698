//! Splice Web - HTTP upload and playback server
//!
//! Exposes the chunk ingestion pipeline over HTTP: multipart chunk uploads,
//! a JSON finalize operation, range-aware artifact playback, a recordings
//! listing, and a health endpoint. Also serves the static recorder UI.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]

pub mod handlers;
pub mod server;

pub use server::{AppState, build_router, run_server};
