//! Integration tests for the trigger service
//!
//! Tests key endpoints:
//! - GET /health - Liveness
//! - POST /api/sitemap/run - Run the task, guarded by the scheduler token

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use core_smx::mock::{MockFetcher, RecordingSink, sitemap_page};
use core_smx::{AuthSettings, TaskConfig, token_digest};
use http_body_util::BodyExt;
use tower::ServiceExt;

use api_smx::{AppState, routes::router};

const SOURCE: &str = "https://example.com/?eID=sitemap&sitemap=pages";

fn scheduler_auth(token: &str) -> AuthSettings {
    AuthSettings {
        only_scheduler_mode: true,
        scheduler_token: Some(token.to_string()),
        encryption_key: None,
    }
}

fn test_state(site_root: &Path, auth: AuthSettings) -> Arc<AppState> {
    let mut config = TaskConfig::new(SOURCE, site_root);
    config.index_file_path = Some("sitemap.xml".to_string());

    let fetcher = MockFetcher::new().with_page(
        &format!("{}&offset=0&limit=50000", SOURCE),
        sitemap_page(&["https://example.com/a"]),
    );
    Arc::new(AppState::new(config, auth, Arc::new(fetcher), Arc::new(RecordingSink::new())))
}

fn run_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/sitemap/run");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

/// Helper to parse JSON response body
async fn response_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(dir.path(), AuthSettings::default()));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"healthy");
}

#[tokio::test]
async fn test_run_without_scheduler_mode() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(dir.path(), AuthSettings::default()));

    let response = app.oneshot(run_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["index_url"], "https://example.com/sitemap.xml");
    assert_eq!(body["sources"][0]["token"], "00001");
    assert_eq!(body["sources"][0]["stop_reason"], "empty_page");
    assert_eq!(
        body["sources"][0]["parts"][0],
        "https://example.com/sitemap_sitemap_00001_00001.xml"
    );
    assert!(dir.path().join("sitemap.xml").exists());
}

#[tokio::test]
async fn test_run_requires_bearer_in_scheduler_mode() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), scheduler_auth("abc"));

    let missing = router(state.clone()).oneshot(run_request(None)).await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let raw_token = router(state.clone()).oneshot(run_request(Some("Bearer abc"))).await.unwrap();
    assert_eq!(raw_token.status(), StatusCode::UNAUTHORIZED);

    let wrong = format!("Bearer {}", token_digest("abd"));
    let response = router(state.clone()).oneshot(run_request(Some(&wrong))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!dir.path().join("sitemap.xml").exists());

    let valid = format!("Bearer {}", token_digest("abc"));
    let response = router(state).oneshot(run_request(Some(&valid))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(dir.path().join("sitemap.xml").exists());
}

#[tokio::test]
async fn test_concurrent_run_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), AuthSettings::default());

    let _running = state.run_lock.lock().await;
    let response = router(state.clone()).oneshot(run_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["error"], "A sitemap run is already in progress");
}

#[tokio::test]
async fn test_misconfigured_run_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = TaskConfig::new(SOURCE, dir.path());
    config.index_file_path = None;
    let state = Arc::new(AppState::new(
        config,
        AuthSettings::default(),
        Arc::new(MockFetcher::new()),
        Arc::new(RecordingSink::new()),
    ));

    let response = router(state).oneshot(run_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
