//! User entity and repository trait.
//!
//! Stored in the `users.json` collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;

/// Account-wide role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
    SuperAdmin,
    System,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
            Self::System => "system",
        }
    }

    /// Whether the role may moderate other accounts.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a user account.
///
/// The realtime core reads `role`, the suspension flags and the system marker,
/// and writes `is_online` / `last_seen` on presence transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,

    pub username: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub role: UserRole,

    /// Mirrors the presence registry; never authoritative on its own.
    #[serde(default)]
    pub is_online: bool,

    pub last_seen: DateTime<Utc>,

    #[serde(default)]
    pub is_verified: bool,

    /// The support account used to deliver system notices.
    #[serde(default)]
    pub is_system_account: bool,

    #[serde(default)]
    pub is_suspended: bool,

    /// `None` while suspended means the suspension is permanent.
    #[serde(default)]
    pub suspended_until: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a regular account with default flags.
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: username.into(),
            email: String::new(),
            role: UserRole::User,
            is_online: false,
            last_seen: now,
            is_verified: false,
            is_system_account: false,
            is_suspended: false,
            suspended_until: None,
            created_at: now,
        }
    }

    /// Create the support account.
    pub fn system(id: UserId, username: impl Into<String>) -> Self {
        Self {
            role: UserRole::System,
            is_system_account: true,
            is_verified: true,
            ..Self::new(id, username)
        }
    }
}

/// Repository trait for User data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AppError>;

    /// Find the support account, if one was provisioned.
    async fn find_system_account(&self) -> Result<Option<User>, AppError>;

    /// Create a new user.
    async fn create(&self, user: &User) -> Result<User, AppError>;

    /// Set or clear the suspension flags, leaving the rest of the profile alone.
    ///
    /// `until` is ignored when `is_suspended` is false.
    async fn set_suspension(
        &self,
        id: &UserId,
        is_suspended: bool,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>;

    /// Record a presence transition on the durable profile.
    async fn set_presence(
        &self,
        id: &UserId,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> Result<(), AppError>;
}
