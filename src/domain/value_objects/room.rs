//! Fan-out addressing.

use std::fmt;

use super::ids::{ChannelId, ChatId};

/// The unit realtime events are addressed to.
///
/// Chats and channels live in separate namespaces so that a chat and a channel
/// which happen to share an id never receive each other's events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomId {
    Chat(ChatId),
    Channel(ChannelId),
}

impl RoomId {
    pub fn is_channel(&self) -> bool {
        matches!(self, RoomId::Channel(_))
    }
}

impl From<ChatId> for RoomId {
    fn from(id: ChatId) -> Self {
        RoomId::Chat(id)
    }
}

impl From<ChannelId> for RoomId {
    fn from(id: ChannelId) -> Self {
        RoomId::Channel(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::Chat(id) => write!(f, "{}", id),
            RoomId::Channel(id) => write!(f, "channel:{}", id),
        }
    }
}
