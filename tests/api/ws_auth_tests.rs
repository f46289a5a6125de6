//! WebSocket handshake authentication

use axum::http::StatusCode;
use serde_json::Value;

use chat_relay::domain::value_objects::UserId;

use crate::common::TestApp;

#[tokio::test]
async fn missing_token_is_refused() {
    let server = TestApp::new().server();

    let response = server.get("/ws").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Token was not provided");
}

#[tokio::test]
async fn garbage_token_is_refused() {
    let server = TestApp::new().server();

    let response = server.get("/ws").add_query_param("token", "garbage").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Invalid token");
}

#[tokio::test]
async fn token_for_unknown_identity_is_refused() {
    let app = TestApp::new();
    let token = app.token(&UserId::new("ghost"));
    let server = app.server();

    let response = server.get("/ws").authorization_bearer(token).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Invalid token");
}

#[tokio::test]
async fn valid_token_passes_authentication() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let token = app.token(&alice.id);
    let server = app.server();

    // Not a real upgrade request, so it fails after authentication.
    let response = server.get("/ws").add_query_param("token", token).await;

    assert_ne!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.state.gateway.session_count(), 0);
}
