//! HTTP surface tests against the assembled router.
//!
//! Drives the real axum router with in-process requests via
//! `tower::ServiceExt::oneshot`, covering the upload, finalize, listing,
//! health, and validation behavior of the boundary.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use splice_core::config::SpliceConfig;
use splice_web::{AppState, build_router};
use tower::ServiceExt;

const BOUNDARY: &str = "splice-test-boundary";

struct TestApp {
    router: Router,
    config: SpliceConfig,
    _temp: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let temp = tempfile::tempdir().unwrap();
    let config = SpliceConfig::for_testing(temp.path());
    config.storage.ensure_directories().unwrap();

    let state = AppState::from_config(&config);
    let router = build_router(state, &config);

    TestApp {
        router,
        config,
        _temp: temp,
    }
}

/// Builds a multipart body in the shape the recorder UI sends.
fn multipart_body(session_id: Option<&str>, chunk_index: Option<&str>, chunk: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(session_id) = session_id {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"sessionId\"\r\n\r\n{session_id}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(chunk_index) = chunk_index {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"chunkIndex\"\r\n\r\n{chunk_index}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(chunk) = chunk {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"chunk\"; filename=\"blob\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(chunk);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(session_id: Option<&str>, chunk_index: Option<&str>, chunk: Option<&[u8]>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload-chunk")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(session_id, chunk_index, chunk)))
        .unwrap()
}

fn finalize_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/finalize-recording")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_then_finalize_then_stream() {
    let app = test_app();

    for (index, payload) in [b"first-".as_slice(), b"second-".as_slice(), b"third".as_slice()]
        .into_iter()
        .enumerate()
    {
        let index_text = index.to_string();
        let response = app
            .router
            .clone()
            .oneshot(upload_request(
                Some("rec1"),
                Some(index_text.as_str()),
                Some(payload),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["totalChunks"], index as u64 + 1);
    }

    let response = app
        .router
        .clone()
        .oneshot(finalize_request(
            serde_json::json!({ "sessionId": "rec1", "totalChunks": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["videoId"], "rec1");
    assert_eq!(body["videoPath"], "/video/rec1");
    assert_eq!(body["missingChunks"], 0);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/video/rec1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "video/webm"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"first-second-third");
}

#[tokio::test]
async fn upload_rejects_missing_fields() {
    let app = test_app();

    // No sessionId
    let response = app
        .router
        .clone()
        .oneshot(upload_request(None, Some("0"), Some(b"x")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Missing sessionId or chunkIndex");

    // No file part
    let response = app
        .router
        .clone()
        .oneshot(upload_request(Some("rec1"), Some("0"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn upload_rejects_traversal_session_ids() {
    let app = test_app();

    for bad_id in ["..", "a/b", "a\\b", "x.y"] {
        let response = app
            .router
            .clone()
            .oneshot(upload_request(Some(bad_id), Some("0"), Some(b"x")))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "accepted session id {bad_id:?}"
        );
    }

    // Nothing may have been written under the chunks root
    let mut entries = tokio::fs::read_dir(app.config.storage.chunks_dir())
        .await
        .unwrap();
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    assert!(names.is_empty(), "unexpected entries: {names:?}");
}

#[tokio::test]
async fn upload_rejects_non_numeric_index() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(Some("rec1"), Some("七"), Some(b"x")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(upload_request(Some("rec1"), Some("-1"), Some(b"x")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn finalize_rejects_missing_session_and_empty_sessions() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(finalize_request(
            serde_json::json!({ "sessionId": "", "totalChunks": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Absent sessionId field is the client's fault, not a 422
    let response = app
        .router
        .clone()
        .oneshot(finalize_request(serde_json::json!({ "totalChunks": 3 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());

    // Valid id but no chunks uploaded: reassembly failure, chunks-free 500
    let response = app
        .router
        .clone()
        .oneshot(finalize_request(
            serde_json::json!({ "sessionId": "never-uploaded", "totalChunks": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn video_absent_is_404() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/video/nothing-here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recordings_lists_finalized_artifacts() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/recordings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!([]));

    // Upload and finalize one recording, then it must appear
    app.router
        .clone()
        .oneshot(upload_request(Some("listed"), Some("0"), Some(b"abcdef")))
        .await
        .unwrap();
    app.router
        .clone()
        .oneshot(finalize_request(
            serde_json::json!({ "sessionId": "listed", "totalChunks": 1 }),
        ))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/recordings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    let listing = body.as_array().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["sessionId"], "listed");
    assert_eq!(listing[0]["filename"], "listed.webm");
    assert_eq!(listing[0]["size"], 6);
    assert_eq!(listing[0]["url"], "/video/listed");
}

#[tokio::test]
async fn health_reports_active_sessions() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["activeSessions"], 0);

    app.router
        .clone()
        .oneshot(upload_request(Some("inflight"), Some("0"), Some(b"x")))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["activeSessions"], 1);
}
