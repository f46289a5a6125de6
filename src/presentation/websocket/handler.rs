//! WebSocket Connection Handler
//!
//! The credential is checked on the upgrade request, before any socket
//! exists, so a rejected client never gets connection state. After the
//! upgrade one task writes queued events and pings; the reader loop handles
//! intents one at a time, which keeps a connection's intents in order.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use super::messages::{ClientIntent, ServerEvent};
use super::session::SessionState;
use crate::application::services::AuthError;
use crate::domain::value_objects::{ConnectionId, UserId};
use crate::presentation::middleware::bearer_token;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// How long the writer may take to flush after the reader stops
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Query parameters accepted on the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let user_id = match authenticate(&state, params, &headers).await {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::debug!(error = %e, "Connection refused");
            return e.into_response();
        }
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let settings = &state.settings.websocket;
    ws.max_message_size(settings.max_message_size)
        .max_frame_size(settings.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

/// Resolve the handshake credential to an identity.
async fn authenticate(
    state: &AppState,
    params: ConnectParams,
    headers: &HeaderMap,
) -> Result<UserId, AppError> {
    let token = params
        .token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| bearer_token(headers))
        .ok_or(AuthError::MissingToken)?;
    let user = state.auth_service.authenticate(&token).await?;
    Ok(user.id)
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, user_id: UserId) {
    let connection_id = ConnectionId::generate();
    let engine = state.fanout.clone();
    let heartbeat = Duration::from_millis(state.settings.websocket.heartbeat_interval_ms);
    let idle_timeout = Duration::from_millis(state.settings.websocket.idle_timeout_ms);

    // Split socket for concurrent read/write
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    engine.connect(&connection_id, &user_id, tx).await;

    let writer_connection = connection_id.clone();
    let mut writer = tokio::spawn(async move {
        let mut ping = interval(heartbeat);
        ping.tick().await; // Skip first immediate tick
        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(
                                connection_id = %writer_connection,
                                error = %e,
                                "Failed to serialize event"
                            );
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = sink.close().await;
    });

    let mut session = SessionState::new(connection_id.clone(), user_id.clone());
    let mut idle_check = interval(heartbeat.min(idle_timeout));
    idle_check.tick().await;

    loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        session.touch();
                        match ClientIntent::parse(text.as_str()) {
                            Ok(intent) => engine.handle(&connection_id, &user_id, intent).await,
                            Err(e) => engine.reject_frame(&connection_id, e),
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        session.touch();
                        engine.reject_frame(
                            &connection_id,
                            AppError::Validation("Binary frames are not supported".into()),
                        );
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed by client");
                        break;
                    }
                    // Ping and pong; axum answers pings itself
                    Some(Ok(_)) => session.touch(),
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            _ = idle_check.tick() => {
                if !session.is_alive(idle_timeout) {
                    tracing::info!(
                        connection_id = %connection_id,
                        user_id = %user_id,
                        frames = session.frames,
                        "Idle timeout, closing connection"
                    );
                    break;
                }
            }
        }
    }

    // Cleanup
    engine.disconnect(&connection_id).await;
    if timeout(CLOSE_GRACE, &mut writer).await.is_err() {
        writer.abort();
    }
}
