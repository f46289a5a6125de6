//! Channel Handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::CreateChannelRequest;
use crate::application::dto::response::{ChannelResponse, MessagesResponse};
use crate::application::services::CreateChannelDto;
use crate::domain::value_objects::{ChannelId, UserId};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Create a new channel owned by the caller
pub async fn create_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<ChannelResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let request = CreateChannelDto {
        name: body.name,
        username: body.username,
        description: body.description,
    };
    let channel = state
        .channel_service
        .create_channel(auth.id(), request)
        .await?;

    Ok((StatusCode::CREATED, Json(ChannelResponse::from(channel))))
}

/// Get channel by ID
pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel = state
        .channel_service
        .get_channel(&ChannelId::new(channel_id))
        .await?;
    Ok(Json(ChannelResponse::from(channel)))
}

pub async fn join_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel = state
        .channel_service
        .join_channel(&ChannelId::new(channel_id), auth.id())
        .await?;
    Ok(Json(ChannelResponse::from(channel)))
}

pub async fn leave_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel = state
        .channel_service
        .leave_channel(&ChannelId::new(channel_id), auth.id())
        .await?;
    Ok(Json(ChannelResponse::from(channel)))
}

/// Channel history, members only
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = state
        .channel_service
        .get_channel_messages(&ChannelId::new(channel_id), auth.id())
        .await?;
    Ok(Json(MessagesResponse { messages }))
}

/// Promote a member to admin (owner only)
pub async fn add_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((channel_id, user_id)): Path<(String, String)>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel = state
        .channel_service
        .add_admin(&ChannelId::new(channel_id), auth.id(), &UserId::new(user_id))
        .await?;
    Ok(Json(ChannelResponse::from(channel)))
}

/// Demote an admin (owner only)
pub async fn remove_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((channel_id, user_id)): Path<(String, String)>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel = state
        .channel_service
        .remove_admin(&ChannelId::new(channel_id), auth.id(), &UserId::new(user_id))
        .await?;
    Ok(Json(ChannelResponse::from(channel)))
}
