//! WebSocket Message Types
//!
//! Every frame in either direction is `{"event": "<name>", "data": <payload>}`.
//! Client frames decode into [`ClientIntent`]; anything that does not match a
//! known event with the required fields is rejected before it reaches the
//! engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Message, Reaction};
use crate::domain::value_objects::{
    ChannelId, ChatId, MessageId, MessageStatus, RoomId, UserId,
};
use crate::shared::error::AppError;

/// Client to server intents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientIntent {
    #[serde(rename = "chat:join")]
    ChatJoin(ChatId),
    #[serde(rename = "chat:leave")]
    ChatLeave(ChatId),
    #[serde(rename = "message:send")]
    MessageSend(SendMessagePayload),
    #[serde(rename = "message:edit")]
    MessageEdit(EditMessagePayload),
    #[serde(rename = "message:delete")]
    MessageDelete(MessageRefPayload),
    #[serde(rename = "message:reaction:add")]
    ReactionAdd(ReactionPayload),
    #[serde(rename = "message:reaction:remove")]
    ReactionRemove(ReactionPayload),
    #[serde(rename = "channel:join")]
    ChannelJoin(ChannelId),
    #[serde(rename = "channel:leave")]
    ChannelLeave(ChannelId),
    #[serde(rename = "channel:message:send")]
    ChannelMessageSend(ChannelMessagePayload),
    #[serde(rename = "typing:start")]
    TypingStart(TypingPayload),
    #[serde(rename = "typing:stop")]
    TypingStop(TypingPayload),
}

impl ClientIntent {
    /// Decode one text frame.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        serde_json::from_str(text)
            .map_err(|_| AppError::Validation("Unknown or malformed event".into()))
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ClientIntent::ChatJoin(_) => "chat:join",
            ClientIntent::ChatLeave(_) => "chat:leave",
            ClientIntent::MessageSend(_) => "message:send",
            ClientIntent::MessageEdit(_) => "message:edit",
            ClientIntent::MessageDelete(_) => "message:delete",
            ClientIntent::ReactionAdd(_) => "message:reaction:add",
            ClientIntent::ReactionRemove(_) => "message:reaction:remove",
            ClientIntent::ChannelJoin(_) => "channel:join",
            ClientIntent::ChannelLeave(_) => "channel:leave",
            ClientIntent::ChannelMessageSend(_) => "channel:message:send",
            ClientIntent::TypingStart(_) => "typing:start",
            ClientIntent::TypingStop(_) => "typing:stop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub chat_id: ChatId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
    /// Correlation token echoed on the resulting `message:receive`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMessagePayload {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRefPayload {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessagePayload {
    pub channel_id: ChannelId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
}

/// Names a chat, a channel, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
}

impl TypingPayload {
    pub fn rooms(&self) -> Result<Vec<RoomId>, AppError> {
        let rooms: Vec<RoomId> = self
            .chat_id
            .iter()
            .map(|id| RoomId::Chat(id.clone()))
            .chain(self.channel_id.iter().map(|id| RoomId::Channel(id.clone())))
            .collect();
        if rooms.is_empty() {
            return Err(AppError::Validation(
                "Typing signals need a chatId or a channelId".into(),
            ));
        }
        Ok(rooms)
    }
}

/// Server to client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "message:receive")]
    MessageReceive(MessageEnvelope),
    #[serde(rename = "message:edited")]
    MessageEdited(Message),
    #[serde(rename = "message:deleted")]
    MessageDeleted(Message),
    #[serde(rename = "message:status")]
    MessageStatus(StatusEvent),
    #[serde(rename = "message:reaction:added")]
    ReactionAdded(ReactionAddedEvent),
    #[serde(rename = "message:reaction:removed")]
    ReactionRemoved(ReactionRemovedEvent),
    #[serde(rename = "channel:message:receive")]
    ChannelMessageReceive(MessageEnvelope),
    #[serde(rename = "typing:start")]
    TypingStart(TypingEvent),
    #[serde(rename = "typing:stop")]
    TypingStop(TypingEvent),
    #[serde(rename = "user:online")]
    UserOnline(PresenceEvent),
    #[serde(rename = "user:offline")]
    UserOffline(PresenceEvent),
    #[serde(rename = "error")]
    Error(ErrorEvent),
}

impl ServerEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerEvent::MessageReceive(_) => "message:receive",
            ServerEvent::MessageEdited(_) => "message:edited",
            ServerEvent::MessageDeleted(_) => "message:deleted",
            ServerEvent::MessageStatus(_) => "message:status",
            ServerEvent::ReactionAdded(_) => "message:reaction:added",
            ServerEvent::ReactionRemoved(_) => "message:reaction:removed",
            ServerEvent::ChannelMessageReceive(_) => "channel:message:receive",
            ServerEvent::TypingStart(_) => "typing:start",
            ServerEvent::TypingStop(_) => "typing:stop",
            ServerEvent::UserOnline(_) => "user:online",
            ServerEvent::UserOffline(_) => "user:offline",
            ServerEvent::Error(_) => "error",
        }
    }

    pub fn error(message: impl Into<String>, event: Option<&str>) -> Self {
        ServerEvent::Error(ErrorEvent {
            message: message.into(),
            event: event.map(str::to_string),
        })
    }
}

/// A message plus the sender's correlation token, if one was supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    #[serde(flatten)]
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
}

impl MessageEnvelope {
    pub fn new(message: Message, client_ref: Option<String>) -> Self {
        Self {
            message,
            client_ref,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub status: MessageStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionAddedEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub reaction: Reaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRemovedEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
}

impl TypingEvent {
    pub fn new(user_id: UserId, room: &RoomId) -> Self {
        let (chat_id, channel_id) = match room {
            RoomId::Chat(id) => (Some(id.clone()), None),
            RoomId::Channel(id) => (None, Some(id.clone())),
        };
        Self {
            user_id,
            chat_id,
            channel_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
    /// The intent that failed, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}
