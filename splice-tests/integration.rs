//! Integration tests for Splice
//!
//! These tests verify the integration between components of the system:
//! the ingestion pipeline end to end through the core types, and the HTTP
//! surface through the assembled axum router.

#[path = "integration/upload_pipeline.rs"]
mod upload_pipeline;

#[path = "integration/http_surface.rs"]
mod http_surface;

#[path = "integration/range_requests.rs"]
mod range_requests;
