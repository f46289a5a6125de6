//! Health Check API Tests

use axum::http::StatusCode;
use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::new();
    let server = app.server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn health_check_through_the_router() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn liveness_probe() {
    let server = TestApp::new().server();

    let response = server.get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn readiness_reports_store_and_gateway() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let _connection = app.connect(&alice).await;
    let server = app.server();

    let response = server.get("/health/ready").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["checks"]["store"]["persistent"], false);
    assert_eq!(body["checks"]["websocket"]["active_connections"], 1);
    assert_eq!(body["checks"]["websocket"]["online_users"], 1);
}

#[tokio::test]
async fn metrics_are_exposed() {
    let server = TestApp::new().server();

    let response = server.get("/metrics").await;

    response.assert_status_ok();
}
