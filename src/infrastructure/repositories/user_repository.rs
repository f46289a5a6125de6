//! User Repository Implementation
//!
//! Flat-file implementation of the UserRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{User, UserRepository};
use crate::domain::value_objects::UserId;
use crate::infrastructure::database::{Collection, FlatFileDb};
use crate::shared::error::AppError;

/// User repository backed by `users.json`.
#[derive(Clone)]
pub struct FileUserRepository {
    db: FlatFileDb,
}

impl FileUserRepository {
    pub fn new(db: FlatFileDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for FileUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AppError> {
        Ok(self
            .db
            .read(|t| t.users.iter().find(|u| &u.id == id).cloned())
            .await)
    }

    async fn find_system_account(&self) -> Result<Option<User>, AppError> {
        Ok(self
            .db
            .read(|t| t.users.iter().find(|u| u.is_system_account).cloned())
            .await)
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let user = user.clone();
        self.db
            .write(Collection::Users, |t| {
                if t.users.iter().any(|u| u.id == user.id) {
                    return Err(AppError::Conflict(format!("User {} already exists", user.id)));
                }
                t.users.push(user.clone());
                Ok(user)
            })
            .await?
    }

    async fn set_suspension(
        &self,
        id: &UserId,
        is_suspended: bool,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        self.db
            .write(Collection::Users, |t| {
                let user = t
                    .users
                    .iter_mut()
                    .find(|u| &u.id == id)
                    .ok_or_else(|| AppError::NotFound("User not found".into()))?;
                user.is_suspended = is_suspended;
                user.suspended_until = until.filter(|_| is_suspended);
                Ok(())
            })
            .await?
    }

    async fn set_presence(
        &self,
        id: &UserId,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.db
            .write(Collection::Users, |t| {
                let user = t
                    .users
                    .iter_mut()
                    .find(|u| &u.id == id)
                    .ok_or_else(|| AppError::NotFound("User not found".into()))?;
                user.is_online = is_online;
                user.last_seen = last_seen;
                Ok(())
            })
            .await?
    }
}
