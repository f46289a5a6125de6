//! Channel Repository Implementation
//!
//! Flat-file implementation of the ChannelRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Channel, ChannelRepository};
use crate::domain::value_objects::{ChannelId, UserId};
use crate::infrastructure::database::{Collection, FlatFileDb};
use crate::shared::error::AppError;

/// Channel repository backed by `channels.json`.
#[derive(Clone)]
pub struct FileChannelRepository {
    db: FlatFileDb,
}

impl FileChannelRepository {
    pub fn new(db: FlatFileDb) -> Self {
        Self { db }
    }

    /// Check and mutate one channel under the store's write lock.
    async fn modify(
        &self,
        id: &ChannelId,
        change: impl FnOnce(&mut Channel) -> Result<(), AppError> + Send,
    ) -> Result<Channel, AppError> {
        self.db
            .write(Collection::Channels, |t| {
                let channel = t
                    .channels
                    .iter_mut()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| AppError::NotFound("Channel not found".into()))?;
                change(channel)?;
                Ok(channel.clone())
            })
            .await?
    }
}

#[async_trait]
impl ChannelRepository for FileChannelRepository {
    async fn find_by_id(&self, id: &ChannelId) -> Result<Option<Channel>, AppError> {
        Ok(self
            .db
            .read(|t| t.channels.iter().find(|c| &c.id == id).cloned())
            .await)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Channel>, AppError> {
        let username = username.to_lowercase();
        Ok(self
            .db
            .read(|t| t.channels.iter().find(|c| c.username == username).cloned())
            .await)
    }

    async fn create(&self, channel: &Channel) -> Result<Channel, AppError> {
        let channel = channel.clone();
        self.db
            .write(Collection::Channels, |t| {
                if t.channels.iter().any(|c| c.username == channel.username) {
                    return Err(AppError::Conflict("Channel username already taken".into()));
                }
                t.channels.push(channel.clone());
                Ok(channel)
            })
            .await?
    }

    async fn add_member(&self, id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError> {
        self.modify(id, |channel| channel.add_member(user_id)).await
    }

    async fn remove_member(&self, id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError> {
        self.modify(id, |channel| channel.remove_member(user_id)).await
    }

    async fn add_admin(&self, id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError> {
        self.modify(id, |channel| channel.promote(user_id)).await
    }

    async fn remove_admin(&self, id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError> {
        self.modify(id, |channel| channel.demote(user_id)).await
    }

    async fn touch(&self, id: &ChannelId, at: DateTime<Utc>) -> Result<(), AppError> {
        self.db
            .write(Collection::Channels, |t| {
                let channel = t
                    .channels
                    .iter_mut()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| AppError::NotFound("Channel not found".into()))?;
                channel.updated_at = at;
                Ok(())
            })
            .await?
    }
}
