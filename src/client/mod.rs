//! Client-side conversation state.
//!
//! Mirrors what a connected client keeps in memory: one store per chat and
//! per channel, who is online, and who is typing where. Server events are
//! applied through [`ClientState::apply`]; chat events never touch channel
//! stores and vice versa.

pub mod store;

use std::collections::{HashMap, HashSet};

use crate::domain::entities::{ConversationRef, Message};
use crate::domain::value_objects::{ChannelId, ChatId, MessageId, RoomId, UserId};
use crate::presentation::websocket::messages::{
    ChannelMessagePayload, ClientIntent, SendMessagePayload, ServerEvent, TypingEvent,
};

pub use store::{ConversationStore, Reconciled, PROVISIONAL_ID_PREFIX};

#[derive(Debug)]
pub struct ClientState {
    local_user: UserId,
    chats: HashMap<ChatId, ConversationStore>,
    channels: HashMap<ChannelId, ConversationStore>,
    online: HashSet<UserId>,
    typing: HashMap<RoomId, HashSet<UserId>>,
    errors: Vec<String>,
}

impl ClientState {
    pub fn new(local_user: UserId) -> Self {
        Self {
            local_user,
            chats: HashMap::new(),
            channels: HashMap::new(),
            online: HashSet::new(),
            typing: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn local_user(&self) -> &UserId {
        &self.local_user
    }

    pub fn chat(&self, chat_id: &ChatId) -> Option<&ConversationStore> {
        self.chats.get(chat_id)
    }

    pub fn channel(&self, channel_id: &ChannelId) -> Option<&ConversationStore> {
        self.channels.get(channel_id)
    }

    pub fn chat_mut(&mut self, chat_id: &ChatId) -> &mut ConversationStore {
        self.chats
            .entry(chat_id.clone())
            .or_insert_with(|| ConversationStore::new(ConversationRef::Chat(chat_id.clone())))
    }

    pub fn channel_mut(&mut self, channel_id: &ChannelId) -> &mut ConversationStore {
        self.channels.entry(channel_id.clone()).or_insert_with(|| {
            ConversationStore::new(ConversationRef::Channel(channel_id.clone()))
        })
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.online.contains(user_id)
    }

    /// Users typing in `room`. Signals about the local user, e.g. from
    /// another of its devices, are never recorded.
    pub fn typing_in(&self, room: &RoomId) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .typing
            .get(room)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        users.sort();
        users
    }

    /// Errors received since the last call.
    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }

    /// Render a chat message optimistically and build the intent to send.
    pub fn send_chat_message(
        &mut self,
        chat_id: &ChatId,
        content: impl Into<String>,
        reply_to_id: Option<MessageId>,
    ) -> (MessageId, ClientIntent) {
        let content = content.into();
        let sender = self.local_user.clone();
        let (id, client_ref) = self.chat_mut(chat_id).push_provisional(sender, content.clone());
        let intent = ClientIntent::MessageSend(SendMessagePayload {
            chat_id: chat_id.clone(),
            content,
            reply_to_id,
            client_ref: Some(client_ref),
        });
        (id, intent)
    }

    /// Render a channel post optimistically and build the intent to send.
    pub fn send_channel_message(
        &mut self,
        channel_id: &ChannelId,
        content: impl Into<String>,
    ) -> (MessageId, ClientIntent) {
        let content = content.into();
        let sender = self.local_user.clone();
        let (id, client_ref) = self
            .channel_mut(channel_id)
            .push_provisional(sender, content.clone());
        let intent = ClientIntent::ChannelMessageSend(ChannelMessagePayload {
            channel_id: channel_id.clone(),
            content,
            client_ref: Some(client_ref),
        });
        (id, intent)
    }

    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::MessageReceive(envelope) => {
                let Some(chat_id) = envelope.message.chat_id().cloned() else {
                    return;
                };
                self.stop_typing_of(&envelope.message.room(), &envelope.message.sender_id);
                self.chat_mut(&chat_id).apply_server_message(envelope);
            }
            ServerEvent::ChannelMessageReceive(envelope) => {
                let Some(channel_id) = envelope.message.channel_id().cloned() else {
                    return;
                };
                self.stop_typing_of(&envelope.message.room(), &envelope.message.sender_id);
                self.channel_mut(&channel_id).apply_server_message(envelope);
            }
            ServerEvent::MessageEdited(message) | ServerEvent::MessageDeleted(message) => {
                self.apply_update(message);
            }
            ServerEvent::MessageStatus(event) => {
                if let Some(store) = self.chats.get_mut(&event.chat_id) {
                    store.apply_status(&event.message_id, event.status);
                }
            }
            ServerEvent::ReactionAdded(event) => {
                if let Some(store) = self.chats.get_mut(&event.chat_id) {
                    store.apply_reaction_added(event.reaction);
                }
            }
            ServerEvent::ReactionRemoved(event) => {
                if let Some(store) = self.chats.get_mut(&event.chat_id) {
                    store.apply_reaction_removed(&event.message_id, &event.user_id, &event.emoji);
                }
            }
            ServerEvent::TypingStart(event) => {
                if let Some(room) = typing_room(&event) {
                    if event.user_id != self.local_user {
                        self.typing.entry(room).or_default().insert(event.user_id);
                    }
                }
            }
            ServerEvent::TypingStop(event) => {
                if let Some(room) = typing_room(&event) {
                    self.stop_typing_of(&room, &event.user_id);
                }
            }
            ServerEvent::UserOnline(event) => {
                self.online.insert(event.user_id);
            }
            ServerEvent::UserOffline(event) => {
                self.online.remove(&event.user_id);
                for users in self.typing.values_mut() {
                    users.remove(&event.user_id);
                }
            }
            ServerEvent::Error(event) => {
                tracing::debug!(message = %event.message, event = ?event.event, "Server rejected intent");
                self.errors.push(event.message);
            }
        }
    }

    fn apply_update(&mut self, message: Message) {
        let store = match &message.conversation {
            ConversationRef::Chat(id) => self.chats.get_mut(id),
            ConversationRef::Channel(id) => self.channels.get_mut(id),
        };
        if let Some(store) = store {
            store.apply_update(message);
        }
    }

    fn stop_typing_of(&mut self, room: &RoomId, user_id: &UserId) {
        if let Some(users) = self.typing.get_mut(room) {
            users.remove(user_id);
            if users.is_empty() {
                self.typing.remove(room);
            }
        }
    }
}

fn typing_room(event: &TypingEvent) -> Option<RoomId> {
    match (&event.chat_id, &event.channel_id) {
        (Some(chat_id), None) => Some(RoomId::Chat(chat_id.clone())),
        (None, Some(channel_id)) => Some(RoomId::Channel(channel_id.clone())),
        _ => None,
    }
}
