//! Response DTOs
//!
//! Data structures for API response bodies. Entities already serialize in
//! their wire shape, so most responses wrap them directly.

use serde::Serialize;

use crate::domain::entities::{Block, Channel, Chat, Message, Suspension};

/// Direct chat plus whether this call created it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(flatten)]
    pub chat: Chat,
    pub created: bool,
}

/// Channel with derived member count
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    #[serde(flatten)]
    pub channel: Channel,
    pub member_count: usize,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            member_count: channel.member_count(),
            channel,
        }
    }
}

/// Message list
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// Block record
#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub block: Block,
}

/// Suspension record
#[derive(Debug, Serialize)]
pub struct SuspensionResponse {
    pub suspension: Suspension,
}

/// Simple acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
