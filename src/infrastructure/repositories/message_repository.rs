//! Message Repository Implementation
//!
//! Flat-file implementation of the MessageRepository trait. Chat and channel
//! messages share `messages.json`; reactions live in their own collection and
//! are never stored on the message record.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::entities::{Message, MessageRepository};
use crate::domain::value_objects::{ChannelId, ChatId, MessageId, MessageStatus, UserId};
use crate::infrastructure::database::{Collection, FlatFileDb};
use crate::shared::error::AppError;

/// Message repository backed by `messages.json`.
#[derive(Clone)]
pub struct FileMessageRepository {
    db: FlatFileDb,
}

impl FileMessageRepository {
    pub fn new(db: FlatFileDb) -> Self {
        Self { db }
    }
}

/// Strip the hydrated reaction list before storing.
fn storable(message: &Message) -> Result<Message, AppError> {
    if !message.status.is_persistable() {
        return Err(AppError::Internal(format!(
            "Refusing to store message {} with status {}",
            message.id, message.status
        )));
    }
    let mut stored = message.clone();
    stored.reactions.clear();
    Ok(stored)
}

fn find_mut<'a>(messages: &'a mut [Message], id: &MessageId) -> Result<&'a mut Message, AppError> {
    messages
        .iter_mut()
        .find(|m| &m.id == id)
        .ok_or_else(|| AppError::NotFound("Message not found".into()))
}

fn in_creation_order(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    messages
}

#[async_trait]
impl MessageRepository for FileMessageRepository {
    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, AppError> {
        Ok(self
            .db
            .read(|t| t.messages.iter().find(|m| &m.id == id).cloned())
            .await)
    }

    async fn find_by_chat(&self, chat_id: &ChatId) -> Result<Vec<Message>, AppError> {
        let messages = self
            .db
            .read(|t| {
                t.messages
                    .iter()
                    .filter(|m| m.chat_id() == Some(chat_id))
                    .cloned()
                    .collect()
            })
            .await;
        Ok(in_creation_order(messages))
    }

    async fn find_by_channel(&self, channel_id: &ChannelId) -> Result<Vec<Message>, AppError> {
        let messages = self
            .db
            .read(|t| {
                t.messages
                    .iter()
                    .filter(|m| m.channel_id() == Some(channel_id))
                    .cloned()
                    .collect()
            })
            .await;
        Ok(in_creation_order(messages))
    }

    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        let stored = storable(message)?;
        self.db
            .write(Collection::Messages, |t| {
                t.messages.push(stored);
            })
            .await?;
        Ok(message.clone())
    }

    async fn edit(&self, id: &MessageId, content: &str) -> Result<Message, AppError> {
        self.db
            .write(Collection::Messages, |t| {
                let message = find_mut(&mut t.messages, id)?;
                if message.is_deleted {
                    return Err(AppError::Validation("Cannot edit a deleted message".into()));
                }
                message.edit(content);
                Ok(message.clone())
            })
            .await?
    }

    async fn tombstone(&self, id: &MessageId) -> Result<(Message, bool), AppError> {
        self.db
            .write(Collection::Messages, |t| {
                let message = find_mut(&mut t.messages, id)?;
                if message.is_deleted {
                    return Ok((message.clone(), false));
                }
                message.tombstone();
                Ok((message.clone(), true))
            })
            .await?
    }

    async fn advance_status(
        &self,
        id: &MessageId,
        status: MessageStatus,
    ) -> Result<bool, AppError> {
        // Read first so a no-op never rewrites the file.
        let current = self
            .db
            .read(|t| t.messages.iter().find(|m| &m.id == id).map(|m| m.status))
            .await
            .ok_or_else(|| AppError::NotFound("Message not found".into()))?;
        if current.advance(status).is_none() {
            return Ok(false);
        }

        self.db
            .write(Collection::Messages, |t| {
                let message = find_mut(&mut t.messages, id)?;
                let changed = message.advance_status(status);
                if changed {
                    message.updated_at = Utc::now();
                }
                Ok(changed)
            })
            .await?
    }

    async fn mark_seen(
        &self,
        chat_id: &ChatId,
        reader_id: &UserId,
    ) -> Result<Vec<MessageId>, AppError> {
        let pending = self
            .db
            .read(|t| {
                t.messages.iter().any(|m| {
                    m.chat_id() == Some(chat_id)
                        && &m.sender_id != reader_id
                        && m.status < MessageStatus::Seen
                })
            })
            .await;
        if !pending {
            return Ok(Vec::new());
        }

        self.db
            .write(Collection::Messages, |t| {
                let now = Utc::now();
                t.messages
                    .iter_mut()
                    .filter(|m| m.chat_id() == Some(chat_id) && &m.sender_id != reader_id)
                    .filter_map(|m| {
                        m.advance_status(MessageStatus::Seen).then(|| {
                            m.updated_at = now;
                            m.id.clone()
                        })
                    })
                    .collect()
            })
            .await
    }
}
