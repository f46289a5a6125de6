//! Authentication Service
//!
//! Resolves the bearer credential presented at connection time to a durable
//! identity. Tokens are HS256 JWTs whose `sub` claim is the user id.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtSettings;
use crate::domain::entities::{User, UserRepository};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Validate a token and load the identity it names.
    async fn authenticate(&self, token: &str) -> Result<User, AuthError>;

    /// Validate a token and extract the user id without touching the store.
    fn validate_token(&self, token: &str) -> Result<UserId, AuthError>;

    /// Mint a token for `user_id`. Used by development tooling and tests.
    fn issue_token(&self, user_id: &UserId) -> Result<String, AuthError>;
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token was not provided")]
    MissingToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken => AppError::Unauthorized("Token was not provided".into()),
            AuthError::TokenExpired | AuthError::InvalidToken | AuthError::UserNotFound => {
                AppError::Unauthorized("Invalid token".into())
            }
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// AuthService implementation
pub struct AuthServiceImpl {
    user_repo: Arc<dyn UserRepository>,
    jwt_settings: JwtSettings,
}

impl AuthServiceImpl {
    /// Create a new AuthServiceImpl
    pub fn new(user_repo: Arc<dyn UserRepository>, jwt_settings: JwtSettings) -> Self {
        Self {
            user_repo,
            jwt_settings,
        }
    }

    /// Decode and validate access token
    fn decode_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.validate_token(token)?;

        self.user_repo
            .find_by_id(&user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UserNotFound)
    }

    fn validate_token(&self, token: &str) -> Result<UserId, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }
        let claims = self.decode_access_token(token)?;
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(UserId::new(claims.sub))
    }

    fn issue_token(&self, user_id: &UserId) -> Result<String, AuthError> {
        let now = Utc::now();
        let expiry = now + Duration::minutes(self.jwt_settings.access_token_expiry_minutes);
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))
    }
}
