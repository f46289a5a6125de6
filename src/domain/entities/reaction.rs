//! Message Reaction entity and repository trait.
//!
//! Stored in the `reactions.json` collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{MessageId, ReactionId, UserId};
use crate::shared::error::AppError;

/// Represents a reaction on a message.
///
/// The triple (message_id, user_id, emoji) is unique: one reaction per user
/// per emoji per message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: ReactionId,

    /// Message this reaction is on
    pub message_id: MessageId,

    /// User who added the reaction
    pub user_id: UserId,

    /// Emoji identifier (unicode emoji or custom name)
    pub emoji: String,

    /// When the reaction was added
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    /// Create a new reaction.
    pub fn new(message_id: MessageId, user_id: UserId, emoji: impl Into<String>) -> Self {
        Self {
            id: ReactionId::generate(),
            message_id,
            user_id,
            emoji: emoji.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether this reaction has the given (message, user, emoji) key.
    pub fn same_key(&self, message_id: &MessageId, user_id: &UserId, emoji: &str) -> bool {
        &self.message_id == message_id && &self.user_id == user_id && self.emoji == emoji
    }
}

/// Repository trait for Reaction data access operations.
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Add a reaction unless the same key already exists.
    ///
    /// Returns the stored reaction and whether it was newly created.
    async fn add(&self, reaction: &Reaction) -> Result<(Reaction, bool), AppError>;

    /// Remove a reaction. Returns `false` when nothing matched.
    async fn remove(
        &self,
        message_id: &MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> Result<bool, AppError>;

    /// Reactions on one message, oldest first.
    async fn find_by_message(&self, message_id: &MessageId) -> Result<Vec<Reaction>, AppError>;

    /// Reactions on any of the given messages.
    async fn find_by_messages(&self, message_ids: &[MessageId]) -> Result<Vec<Reaction>, AppError>;
}
