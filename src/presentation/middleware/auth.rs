//! Authentication Middleware
//!
//! JWT validation for protected routes. The same credential check guards the
//! WebSocket upgrade.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::application::services::AuthError;
use crate::domain::entities::User;
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> &UserId {
        &self.user.id
    }
}

/// Token from an `Authorization: Bearer` header, if present and non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string())
        .filter(|token| !token.trim().is_empty())
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let user = state.auth_service.authenticate(&token).await?;

    // Insert authenticated user into request extensions
    request.extensions_mut().insert(AuthUser { user });

    Ok(next.run(request).await)
}
