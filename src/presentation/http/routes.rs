//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, track_metrics};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // WebSocket endpoint; authenticates on the upgrade request itself
        .route("/ws", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes, all authenticated
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/chats", chat_routes())
        .nest("/channels", channel_routes())
        .nest("/users", user_routes())
        .nest("/admin", admin_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn chat_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::chat::open_chat).get(handlers::chat::list_chats),
        )
        .route("/{chat_id}/messages", get(handlers::chat::get_messages))
}

fn channel_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::channel::create_channel))
        .route("/{channel_id}", get(handlers::channel::get_channel))
        .route("/{channel_id}/join", post(handlers::channel::join_channel))
        .route("/{channel_id}/leave", post(handlers::channel::leave_channel))
        .route("/{channel_id}/messages", get(handlers::channel::get_messages))
        .route(
            "/{channel_id}/admins/{user_id}",
            post(handlers::channel::add_admin).delete(handlers::channel::remove_admin),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new().route(
        "/{user_id}/block",
        post(handlers::moderation::block_user)
            .delete(handlers::moderation::unblock_user)
            .get(handlers::moderation::block_status),
    )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/suspensions", post(handlers::moderation::suspend_user))
        .route(
            "/suspensions/{suspension_id}",
            delete(handlers::moderation::lift_suspension),
        )
}
