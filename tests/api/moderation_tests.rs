//! Moderation API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::TestApp;

#[tokio::test]
async fn block_and_unblock() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    app.create_user("bob").await;
    let token = app.token(&alice.id);
    let server = app.server();

    server
        .post("/api/v1/users/bob/block")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::CREATED);

    let status = server
        .get("/api/v1/users/bob/block")
        .authorization_bearer(&token)
        .await;
    status.assert_status_ok();
    assert_eq!(status.json::<Value>()["blockedByMe"], true);

    let unblocked = server
        .delete("/api/v1/users/bob/block")
        .authorization_bearer(&token)
        .await;
    unblocked.assert_status_ok();
    assert_eq!(unblocked.json::<Value>()["message"], "User unblocked");
}

#[tokio::test]
async fn self_block_is_rejected() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let server = app.server();

    server
        .post("/api/v1/users/alice/block")
        .authorization_bearer(app.token(&alice.id))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn staff_suspend_and_lift() {
    let app = TestApp::new();
    let staff = app.create_staff("mod").await;
    app.create_user("alice").await;
    let token = app.token(&staff.id);
    let server = app.server();

    let suspended = server
        .post("/api/v1/admin/suspensions")
        .authorization_bearer(&token)
        .json(&json!({ "userId": "alice", "duration": 3600, "reason": "spam" }))
        .await;
    suspended.assert_status(StatusCode::CREATED);
    let id = suspended.json::<Value>()["suspension"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    server
        .delete(&format!("/api/v1/admin/suspensions/{}", id))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn bad_duration_is_a_validation_error() {
    let app = TestApp::new();
    let staff = app.create_staff("mod").await;
    app.create_user("alice").await;
    let server = app.server();

    server
        .post("/api/v1/admin/suspensions")
        .authorization_bearer(app.token(&staff.id))
        .json(&json!({ "userId": "alice", "duration": "forever" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn regular_users_cannot_suspend() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    app.create_user("bob").await;
    let server = app.server();

    server
        .post("/api/v1/admin/suspensions")
        .authorization_bearer(app.token(&alice.id))
        .json(&json!({ "userId": "bob", "duration": "permanent" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
