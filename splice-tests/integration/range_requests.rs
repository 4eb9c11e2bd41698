//! Range request behavior over the HTTP surface.
//!
//! Verifies the 200/206/416 contract against a known artifact, including
//! the strict rejection of out-of-bounds ranges.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use splice_core::config::SpliceConfig;
use splice_web::{AppState, build_router};
use tower::ServiceExt;

/// Router with a single 1000-byte artifact `clip` seeded in the final dir.
async fn app_with_artifact() -> (Router, Vec<u8>, tempfile::TempDir) {
    let temp = tempfile::tempdir().unwrap();
    let config = SpliceConfig::for_testing(temp.path());
    config.storage.ensure_directories().unwrap();

    let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
    tokio::fs::write(config.storage.final_dir().join("clip.webm"), &data)
        .await
        .unwrap();

    let state = AppState::from_config(&config);
    (build_router(state, &config), data, temp)
}

async fn get_video(router: &Router, range: Option<&str>) -> axum::response::Response {
    let mut request = Request::builder().uri("/video/clip");
    if let Some(range) = range {
        request = request.header("Range", range);
    }
    router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn full_request_returns_200_with_length() {
    let (router, data, _temp) = app_with_artifact().await;

    let response = get_video(&router, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-length").unwrap(), "1000");
    assert_eq!(response.headers().get("accept-ranges").unwrap(), "bytes");
    assert!(response.headers().get("content-range").is_none());

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], &data[..]);
}

#[tokio::test]
async fn prefix_range_returns_206_with_exact_span() {
    let (router, data, _temp) = app_with_artifact().await;

    let response = get_video(&router, Some("bytes=0-99")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get("content-range").unwrap(),
        "bytes 0-99/1000"
    );
    assert_eq!(response.headers().get("content-length").unwrap(), "100");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], &data[..100]);
}

#[tokio::test]
async fn open_ended_range_runs_to_last_byte() {
    let (router, data, _temp) = app_with_artifact().await;

    let response = get_video(&router, Some("bytes=900-")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get("content-range").unwrap(),
        "bytes 900-999/1000"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], &data[900..]);
}

#[tokio::test]
async fn mid_file_seek_returns_matching_bytes() {
    let (router, data, _temp) = app_with_artifact().await;

    let response = get_video(&router, Some("bytes=250-749")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.len(), 500);
    assert_eq!(&bytes[..], &data[250..=749]);
}

#[tokio::test]
async fn out_of_bounds_range_is_416_not_clamped() {
    let (router, _data, _temp) = app_with_artifact().await;

    for range in ["bytes=1000-", "bytes=0-1000", "bytes=500-400", "bytes=5000-6000"] {
        let response = get_video(&router, Some(range)).await;
        assert_eq!(
            response.status(),
            StatusCode::RANGE_NOT_SATISFIABLE,
            "range {range:?} was not rejected"
        );
        assert_eq!(
            response.headers().get("content-range").unwrap(),
            "bytes */1000"
        );
    }
}

#[tokio::test]
async fn malformed_range_is_416() {
    let (router, _data, _temp) = app_with_artifact().await;

    for range in ["bites=0-99", "bytes=abc-def", "bytes=1,2,3"] {
        let response = get_video(&router, Some(range)).await;
        assert_eq!(
            response.status(),
            StatusCode::RANGE_NOT_SATISFIABLE,
            "range {range:?} was not rejected"
        );
    }
}

#[tokio::test]
async fn empty_artifact_serves_200_with_no_body() {
    let (router, _data, temp) = app_with_artifact().await;
    tokio::fs::write(temp.path().join("uploads/final/silence.webm"), b"")
        .await
        .unwrap();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/video/silence")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-length").unwrap(), "0");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());

    // A range against an empty artifact stays unsatisfiable
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/video/silence")
                .header("Range", "bytes=0-")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
}

#[tokio::test]
async fn suffixed_identifier_resolves_same_artifact() {
    let (router, _data, _temp) = app_with_artifact().await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/video/clip.webm")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
