//! Chat Handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::OpenChatRequest;
use crate::application::dto::response::{ChatResponse, MessagesResponse};
use crate::domain::entities::Chat;
use crate::domain::value_objects::{ChatId, UserId};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Open the direct chat with another user, creating it on first use
pub async fn open_chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<OpenChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let (chat, created) = state
        .chat_service
        .open_chat(auth.id(), &UserId::new(body.participant_id))
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ChatResponse { chat, created })))
}

/// Chats of the current user, most recently active first
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Chat>>, AppError> {
    Ok(Json(state.chat_service.list_chats(auth.id()).await?))
}

/// Message history. Marks the other participant's messages as seen.
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = state
        .chat_service
        .get_chat_messages(&ChatId::new(chat_id), auth.id())
        .await?;
    Ok(Json(MessagesResponse { messages }))
}
