//! Moderation Handlers
//!
//! Blocking between users and staff suspensions.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::SuspendUserRequest;
use crate::application::dto::response::{BlockResponse, MessageResponse, SuspensionResponse};
use crate::domain::entities::{BlockStatus, SuspensionDuration};
use crate::domain::value_objects::{SuspensionId, UserId};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

pub async fn block_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<BlockResponse>), AppError> {
    let block = state
        .moderation_service
        .block_user(auth.id(), &UserId::new(user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(BlockResponse { block })))
}

pub async fn unblock_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .moderation_service
        .unblock_user(auth.id(), &UserId::new(user_id))
        .await?;
    Ok(Json(MessageResponse::new("User unblocked")))
}

/// Block relation between the caller and another user
pub async fn block_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<BlockStatus>, AppError> {
    let status = state
        .moderation_service
        .check_block_status(auth.id(), &UserId::new(user_id))
        .await?;
    Ok(Json(status))
}

/// Suspend a user (staff only)
pub async fn suspend_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SuspendUserRequest>,
) -> Result<(StatusCode, Json<SuspensionResponse>), AppError> {
    body.validate().map_err(validation_error)?;
    let duration: SuspensionDuration = body.duration_text().parse()?;

    let suspension = state
        .moderation_service
        .suspend_user(&auth.user, &UserId::new(body.user_id), duration, body.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(SuspensionResponse { suspension })))
}

/// Lift a suspension early (staff only)
pub async fn lift_suspension(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(suspension_id): Path<String>,
) -> Result<Json<SuspensionResponse>, AppError> {
    let suspension = state
        .moderation_service
        .lift_suspension(&auth.user, &SuspensionId::new(suspension_id))
        .await?;
    Ok(Json(SuspensionResponse { suspension }))
}
