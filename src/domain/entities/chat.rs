//! Direct chat entity and repository trait.
//!
//! Stored in the `chats.json` collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ChatId, RoomId, UserId};
use crate::shared::error::AppError;

/// A 1:1 conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,

    /// Exactly two participants.
    pub participant_ids: Vec<UserId>,

    /// Conversation between the support account and a user.
    #[serde(default)]
    pub is_system_chat: bool,

    pub created_at: DateTime<Utc>,

    /// Last activity, used for conversation list ordering.
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(a: UserId, b: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ChatId::generate(),
            participant_ids: vec![a, b],
            is_system_chat: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn room(&self) -> RoomId {
        RoomId::Chat(self.id.clone())
    }

    pub fn is_participant(&self, user_id: &UserId) -> bool {
        self.participant_ids.contains(user_id)
    }

    /// The other participant, from `user_id`'s point of view.
    pub fn peer_of(&self, user_id: &UserId) -> Option<&UserId> {
        self.participant_ids.iter().find(|id| *id != user_id)
    }
}

/// Repository trait for Chat data access operations.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn find_by_id(&self, id: &ChatId) -> Result<Option<Chat>, AppError>;

    /// Find the chat both users participate in, if any.
    async fn find_by_participants(&self, a: &UserId, b: &UserId)
        -> Result<Option<Chat>, AppError>;

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Chat>, AppError>;

    async fn create(&self, chat: &Chat) -> Result<Chat, AppError>;

    /// Bump the last-activity timestamp.
    async fn touch(&self, id: &ChatId, at: DateTime<Utc>) -> Result<(), AppError>;
}
