//! Reaction Repository Implementation
//!
//! Flat-file implementation of message reactions. One record per
//! (message, user, emoji).

use async_trait::async_trait;

use crate::domain::entities::{Reaction, ReactionRepository};
use crate::domain::value_objects::{MessageId, UserId};
use crate::infrastructure::database::{Collection, FlatFileDb};
use crate::shared::error::AppError;

/// Reaction repository backed by `reactions.json`.
#[derive(Clone)]
pub struct FileReactionRepository {
    db: FlatFileDb,
}

impl FileReactionRepository {
    pub fn new(db: FlatFileDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReactionRepository for FileReactionRepository {
    async fn add(&self, reaction: &Reaction) -> Result<(Reaction, bool), AppError> {
        let existing = self
            .db
            .read(|t| {
                t.reactions
                    .iter()
                    .find(|r| r.same_key(&reaction.message_id, &reaction.user_id, &reaction.emoji))
                    .cloned()
            })
            .await;
        if let Some(existing) = existing {
            return Ok((existing, false));
        }

        let reaction = reaction.clone();
        self.db
            .write(Collection::Reactions, |t| {
                // Re-check under the write lock.
                if let Some(existing) = t
                    .reactions
                    .iter()
                    .find(|r| r.same_key(&reaction.message_id, &reaction.user_id, &reaction.emoji))
                {
                    return (existing.clone(), false);
                }
                t.reactions.push(reaction.clone());
                (reaction, true)
            })
            .await
    }

    async fn remove(
        &self,
        message_id: &MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> Result<bool, AppError> {
        let present = self
            .db
            .read(|t| t.reactions.iter().any(|r| r.same_key(message_id, user_id, emoji)))
            .await;
        if !present {
            return Ok(false);
        }

        self.db
            .write(Collection::Reactions, |t| {
                let before = t.reactions.len();
                t.reactions.retain(|r| !r.same_key(message_id, user_id, emoji));
                t.reactions.len() != before
            })
            .await
    }

    async fn find_by_message(&self, message_id: &MessageId) -> Result<Vec<Reaction>, AppError> {
        Ok(self
            .db
            .read(|t| {
                t.reactions
                    .iter()
                    .filter(|r| &r.message_id == message_id)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn find_by_messages(&self, message_ids: &[MessageId]) -> Result<Vec<Reaction>, AppError> {
        Ok(self
            .db
            .read(|t| {
                t.reactions
                    .iter()
                    .filter(|r| message_ids.contains(&r.message_id))
                    .cloned()
                    .collect()
            })
            .await)
    }
}
