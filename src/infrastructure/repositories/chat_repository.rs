//! Chat Repository Implementation
//!
//! Flat-file implementation of the ChatRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Chat, ChatRepository};
use crate::domain::value_objects::{ChatId, UserId};
use crate::infrastructure::database::{Collection, FlatFileDb};
use crate::shared::error::AppError;

/// Chat repository backed by `chats.json`.
#[derive(Clone)]
pub struct FileChatRepository {
    db: FlatFileDb,
}

impl FileChatRepository {
    pub fn new(db: FlatFileDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChatRepository for FileChatRepository {
    async fn find_by_id(&self, id: &ChatId) -> Result<Option<Chat>, AppError> {
        Ok(self
            .db
            .read(|t| t.chats.iter().find(|c| &c.id == id).cloned())
            .await)
    }

    async fn find_by_participants(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Chat>, AppError> {
        Ok(self
            .db
            .read(|t| {
                t.chats
                    .iter()
                    .find(|c| c.is_participant(a) && c.is_participant(b))
                    .cloned()
            })
            .await)
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Chat>, AppError> {
        let mut chats = self
            .db
            .read(|t| {
                t.chats
                    .iter()
                    .filter(|c| c.is_participant(user_id))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(chats)
    }

    async fn create(&self, chat: &Chat) -> Result<Chat, AppError> {
        let chat = chat.clone();
        self.db
            .write(Collection::Chats, |t| {
                t.chats.push(chat.clone());
                chat
            })
            .await
    }

    async fn touch(&self, id: &ChatId, at: DateTime<Utc>) -> Result<(), AppError> {
        self.db
            .write(Collection::Chats, |t| {
                let chat = t
                    .chats
                    .iter_mut()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| AppError::NotFound("Chat not found".into()))?;
                chat.updated_at = at;
                Ok(())
            })
            .await?
    }
}
