//! Message entity and repository trait.
//!
//! Stored in the `messages.json` collection. Chat and channel messages share
//! the collection; the conversation reference tells them apart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reaction::Reaction;
use crate::domain::value_objects::{ChannelId, ChatId, MessageId, MessageStatus, RoomId, UserId};
use crate::shared::error::AppError;

/// Content shown in place of a deleted message.
pub const DELETED_PLACEHOLDER: &str = "This message has been deleted";

/// Message payload kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    File,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why the support account sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemMessageKind {
    Welcome,
    Suspension,
    Block,
    Broadcast,
    Manual,
}

/// The single conversation a message belongs to.
///
/// Serialized flattened into the message as either `chatId` or `channelId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationRef {
    #[serde(rename = "chatId")]
    Chat(ChatId),
    #[serde(rename = "channelId")]
    Channel(ChannelId),
}

impl ConversationRef {
    pub fn room(&self) -> RoomId {
        match self {
            ConversationRef::Chat(id) => RoomId::Chat(id.clone()),
            ConversationRef::Channel(id) => RoomId::Channel(id.clone()),
        }
    }
}

/// Snapshot of the message being replied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPreview {
    pub id: MessageId,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub sender_id: UserId,
}

/// A chat or channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,

    #[serde(flatten)]
    pub conversation: ConversationRef,

    pub sender_id: UserId,

    pub content: String,

    #[serde(rename = "type", default)]
    pub message_type: MessageType,

    #[serde(default)]
    pub status: MessageStatus,

    #[serde(default)]
    pub is_edited: bool,

    /// Tombstone marker; deleted messages are never removed.
    #[serde(default)]
    pub is_deleted: bool,

    /// Hydrated from the reaction collection on read.
    #[serde(default)]
    pub reactions: Vec<Reaction>,

    #[serde(default)]
    pub reply_to_id: Option<MessageId>,

    #[serde(default)]
    pub reply_to: Option<ReplyPreview>,

    #[serde(default)]
    pub is_system_message: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message_type: Option<SystemMessageKind>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Build a freshly persisted-to-be message with status `sent`.
    pub fn new(conversation: ConversationRef, sender_id: UserId, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: MessageId::generate(),
            conversation,
            sender_id,
            content: content.into(),
            message_type: MessageType::Text,
            status: MessageStatus::Sent,
            is_edited: false,
            is_deleted: false,
            reactions: Vec::new(),
            reply_to_id: None,
            reply_to: None,
            is_system_message: false,
            system_message_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn room(&self) -> RoomId {
        self.conversation.room()
    }

    pub fn chat_id(&self) -> Option<&ChatId> {
        match &self.conversation {
            ConversationRef::Chat(id) => Some(id),
            ConversationRef::Channel(_) => None,
        }
    }

    pub fn channel_id(&self) -> Option<&ChannelId> {
        match &self.conversation {
            ConversationRef::Channel(id) => Some(id),
            ConversationRef::Chat(_) => None,
        }
    }

    pub fn belongs_to_chat(&self, chat_id: &ChatId) -> bool {
        self.chat_id() == Some(chat_id)
    }

    /// Move the status forward. Returns `false` when `next` would not advance it.
    pub fn advance_status(&mut self, next: MessageStatus) -> bool {
        match self.status.advance(next) {
            Some(status) => {
                self.status = status;
                true
            }
            None => false,
        }
    }

    pub fn edit(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.is_edited = true;
        self.updated_at = Utc::now();
    }

    /// Soft-delete: content is replaced, the record stays.
    pub fn tombstone(&mut self) {
        self.content = DELETED_PLACEHOLDER.to_string();
        self.is_deleted = true;
        self.updated_at = Utc::now();
    }

    pub fn preview(&self) -> ReplyPreview {
        ReplyPreview {
            id: self.id.clone(),
            content: self.content.clone(),
            message_type: self.message_type,
            sender_id: self.sender_id.clone(),
        }
    }
}

/// Repository trait for Message data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, AppError>;

    /// Messages of a chat in creation order.
    async fn find_by_chat(&self, chat_id: &ChatId) -> Result<Vec<Message>, AppError>;

    /// Messages of a channel in creation order.
    async fn find_by_channel(&self, channel_id: &ChannelId) -> Result<Vec<Message>, AppError>;

    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// Replace the content of a live message. Status is left as stored.
    ///
    /// Fails with `Validation` if the message is tombstoned.
    async fn edit(&self, id: &MessageId, content: &str) -> Result<Message, AppError>;

    /// Tombstone a message. Returns the stored record and whether it changed.
    async fn tombstone(&self, id: &MessageId) -> Result<(Message, bool), AppError>;

    /// Atomically move a message's status forward.
    ///
    /// Returns `true` if the status changed, `false` if it was already at or
    /// past `status`. Fails with `NotFound` for unknown ids.
    async fn advance_status(&self, id: &MessageId, status: MessageStatus)
        -> Result<bool, AppError>;

    /// Stamp `seen` on every message in the chat not authored by `reader_id`.
    ///
    /// Returns the ids that changed.
    async fn mark_seen(&self, chat_id: &ChatId, reader_id: &UserId)
        -> Result<Vec<MessageId>, AppError>;
}
