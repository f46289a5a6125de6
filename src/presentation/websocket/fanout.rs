//! Message Fan-out Engine
//!
//! Turns client intents into persisted state and emitted events. Every
//! intent follows the same shape: resolve, authorize, persist, emit. The
//! first three steps live in the application services; this module decides
//! who hears about the result.
//!
//! Recipient rules:
//! - new chat and channel messages go to connections joined to the room
//! - edits, deletes and reactions go to joined connections plus every
//!   connection of the chat's participants
//! - typing signals go to the room, never back to the originating
//!   connection
//! - presence transitions go to every other connection
//!
//! Failures are reported to the originating connection only.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::gateway::{EventSender, Gateway};
use super::messages::{
    ChannelMessagePayload, ClientIntent, EditMessagePayload, MessageEnvelope, MessageRefPayload,
    PresenceEvent, ReactionAddedEvent, ReactionPayload, ReactionRemovedEvent, SendMessagePayload,
    ServerEvent, StatusEvent, TypingEvent, TypingPayload,
};
use crate::application::services::{ChannelService, ChatService};
use crate::domain::entities::{Chat, UserRepository};
use crate::domain::value_objects::{ChannelId, ChatId, ConnectionId, MessageStatus, RoomId, UserId};
use crate::infrastructure::cache::TypingCacheService;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

pub struct FanoutEngine {
    gateway: Arc<Gateway>,
    chat_service: Arc<ChatService>,
    channel_service: Arc<ChannelService>,
    user_repo: Arc<dyn UserRepository>,
    typing: Arc<TypingCacheService>,
    /// Serializes presence transitions per identity
    transitions: DashMap<UserId, Arc<Mutex<()>>>,
}

impl FanoutEngine {
    pub fn new(
        gateway: Arc<Gateway>,
        chat_service: Arc<ChatService>,
        channel_service: Arc<ChannelService>,
        user_repo: Arc<dyn UserRepository>,
        typing: Arc<TypingCacheService>,
    ) -> Self {
        Self {
            gateway,
            chat_service,
            channel_service,
            user_repo,
            typing,
            transitions: DashMap::new(),
        }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Bring an authenticated connection online.
    ///
    /// On the identity's first connection the durable profile is marked
    /// online and `user:online` goes out to everyone else.
    #[instrument(skip(self, sender), fields(connection_id = %connection_id, user_id = %user_id))]
    pub async fn connect(&self, connection_id: &ConnectionId, user_id: &UserId, sender: EventSender) {
        let lock = self.transition_lock(user_id);
        let _guard = lock.lock().await;

        self.gateway
            .register_session(connection_id.clone(), user_id.clone(), sender);
        let first = self.gateway.presence().register(user_id, connection_id);
        self.gateway.update_gauges();
        info!(first, "Connection registered");

        if first {
            if let Err(e) = self.user_repo.set_presence(user_id, true, Utc::now()).await {
                error!(error = %e, "Failed to persist online presence");
            }
            self.gateway.broadcast(
                &ServerEvent::UserOnline(PresenceEvent {
                    user_id: user_id.clone(),
                    last_seen: None,
                }),
                Some(user_id),
            );
        }
    }

    /// Tear down a connection. Safe to call more than once.
    ///
    /// Leaves every room, clears the user's typing indicators in them and,
    /// on the identity's last connection, marks it offline and broadcasts
    /// `user:offline`.
    #[instrument(skip(self), fields(connection_id = %connection_id))]
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let Some((session, rooms)) = self.gateway.unregister_session(connection_id) else {
            return;
        };
        let user_id = session.user_id.clone();
        drop(session);

        for room in &rooms {
            self.stop_typing(room, &user_id, None);
        }

        let lock = self.transition_lock(&user_id);
        let guard = lock.lock().await;

        let last = self.gateway.presence().deregister(&user_id, connection_id);
        self.gateway.update_gauges();
        info!(user_id = %user_id, last, "Connection closed");

        if last {
            let last_seen = Utc::now();
            if let Err(e) = self.user_repo.set_presence(&user_id, false, last_seen).await {
                error!(user_id = %user_id, error = %e, "Failed to persist offline presence");
            }
            self.gateway.broadcast(
                &ServerEvent::UserOffline(PresenceEvent {
                    user_id: user_id.clone(),
                    last_seen: Some(last_seen),
                }),
                Some(&user_id),
            );
        }
        drop(guard);
        drop(lock);
        if last {
            // Unused once no transition holds a clone.
            self.transitions
                .remove_if(&user_id, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }

    /// Identities with a presence lock allocated.
    pub fn tracked_identities(&self) -> usize {
        self.transitions.len()
    }

    /// Handle one intent from a connection. Errors go back to that
    /// connection as an `error` event and never propagate further.
    pub async fn handle(&self, connection_id: &ConnectionId, user_id: &UserId, intent: ClientIntent) {
        let name = intent.event_name();
        let result = match intent {
            ClientIntent::ChatJoin(chat_id) => self.join_chat(connection_id, user_id, &chat_id).await,
            ClientIntent::ChatLeave(chat_id) => {
                self.leave_room(connection_id, user_id, &RoomId::Chat(chat_id));
                Ok(())
            }
            ClientIntent::MessageSend(payload) => {
                self.send_message(connection_id, user_id, payload).await
            }
            ClientIntent::MessageEdit(payload) => self.edit_message(user_id, payload).await,
            ClientIntent::MessageDelete(payload) => self.delete_message(user_id, payload).await,
            ClientIntent::ReactionAdd(payload) => self.add_reaction(user_id, payload).await,
            ClientIntent::ReactionRemove(payload) => self.remove_reaction(user_id, payload).await,
            ClientIntent::ChannelJoin(channel_id) => self.join_channel(connection_id, &channel_id).await,
            ClientIntent::ChannelLeave(channel_id) => {
                self.leave_room(connection_id, user_id, &RoomId::Channel(channel_id));
                Ok(())
            }
            ClientIntent::ChannelMessageSend(payload) => {
                self.send_channel_message(connection_id, user_id, payload).await
            }
            ClientIntent::TypingStart(payload) => self.typing_start(connection_id, user_id, &payload),
            ClientIntent::TypingStop(payload) => self.typing_stop(connection_id, user_id, &payload),
        };

        match result {
            Ok(()) => metrics::record_intent(name, "ok"),
            Err(e) => self.reject(connection_id, Some(name), e),
        }
    }

    /// Report a frame that could not be decoded into an intent.
    pub fn reject_frame(&self, connection_id: &ConnectionId, error: AppError) {
        self.reject(connection_id, None, error);
    }

    /// Expire stale typing indicators and announce them as stopped.
    ///
    /// Every joined connection hears the stop, the typist's own included.
    pub fn expire_typing(&self) -> usize {
        let expired = self.typing.sweep_expired();
        for (room, user_id) in &expired {
            debug!(room = %room, user_id = %user_id, "Typing indicator expired");
            self.gateway.send_to_room(
                room,
                &ServerEvent::TypingStop(TypingEvent::new(user_id.clone(), room)),
                None,
            );
        }
        expired.len()
    }

    async fn join_chat(
        &self,
        connection_id: &ConnectionId,
        user_id: &UserId,
        chat_id: &ChatId,
    ) -> Result<(), AppError> {
        let chat = self.chat_service.get_chat(chat_id, user_id).await?;
        self.gateway.rooms().join(connection_id, &chat.room());
        debug!(connection_id = %connection_id, chat_id = %chat_id, "Joined chat room");
        Ok(())
    }

    async fn join_channel(&self, connection_id: &ConnectionId, channel_id: &ChannelId) -> Result<(), AppError> {
        let channel = self.channel_service.get_channel(channel_id).await?;
        self.gateway.rooms().join(connection_id, &channel.room());
        debug!(connection_id = %connection_id, channel_id = %channel_id, "Joined channel room");
        Ok(())
    }

    fn leave_room(&self, connection_id: &ConnectionId, user_id: &UserId, room: &RoomId) {
        if self.gateway.rooms().leave(connection_id, room) {
            self.stop_typing(room, user_id, Some(connection_id));
        }
    }

    #[instrument(skip(self, payload), fields(chat_id = %payload.chat_id, sender_id = %sender_id))]
    async fn send_message(
        &self,
        connection_id: &ConnectionId,
        sender_id: &UserId,
        payload: SendMessagePayload,
    ) -> Result<(), AppError> {
        let (chat, message) = self
            .chat_service
            .send_message(
                &payload.chat_id,
                sender_id,
                &payload.content,
                payload.reply_to_id.as_ref(),
            )
            .await?;
        let room = chat.room();
        let message_id = message.id.clone();

        self.stop_typing(&room, sender_id, Some(connection_id));
        self.gateway.send_to_room(
            &room,
            &ServerEvent::MessageReceive(MessageEnvelope::new(message, payload.client_ref)),
            None,
        );

        let peer_online = chat
            .peer_of(sender_id)
            .is_some_and(|peer| self.gateway.is_user_online(peer));
        if peer_online {
            // The message is stored and emitted; a failed status write only
            // leaves it at `sent`.
            match self.chat_service.mark_delivered(&message_id).await {
                Ok(true) => {
                    self.gateway.send_to_room(
                        &room,
                        &ServerEvent::MessageStatus(StatusEvent {
                            chat_id: chat.id.clone(),
                            message_id,
                            status: MessageStatus::Delivered,
                        }),
                        None,
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    error!(message_id = %message_id, error = %e, "Failed to mark message delivered");
                }
            }
        }
        Ok(())
    }

    async fn edit_message(&self, user_id: &UserId, payload: EditMessagePayload) -> Result<(), AppError> {
        let (chat, message) = self
            .chat_service
            .edit_message(&payload.chat_id, &payload.message_id, user_id, &payload.content)
            .await?;
        self.emit_to_chat(&chat, ServerEvent::MessageEdited(message));
        Ok(())
    }

    async fn delete_message(&self, user_id: &UserId, payload: MessageRefPayload) -> Result<(), AppError> {
        let (chat, message, changed) = self
            .chat_service
            .delete_message(&payload.chat_id, &payload.message_id, user_id)
            .await?;
        if changed {
            self.emit_to_chat(&chat, ServerEvent::MessageDeleted(message));
        }
        Ok(())
    }

    async fn add_reaction(&self, user_id: &UserId, payload: ReactionPayload) -> Result<(), AppError> {
        let (chat, reaction, created) = self
            .chat_service
            .add_reaction(&payload.chat_id, &payload.message_id, user_id, &payload.emoji)
            .await?;
        if created {
            self.emit_to_chat(
                &chat,
                ServerEvent::ReactionAdded(ReactionAddedEvent {
                    chat_id: chat.id.clone(),
                    message_id: reaction.message_id.clone(),
                    reaction,
                }),
            );
        }
        Ok(())
    }

    async fn remove_reaction(&self, user_id: &UserId, payload: ReactionPayload) -> Result<(), AppError> {
        let removal = self
            .chat_service
            .remove_reaction(&payload.chat_id, &payload.message_id, user_id, &payload.emoji)
            .await?;
        if removal.removed {
            self.emit_to_chat(
                &removal.chat,
                ServerEvent::ReactionRemoved(ReactionRemovedEvent {
                    chat_id: removal.chat.id.clone(),
                    message_id: removal.message_id,
                    user_id: user_id.clone(),
                    emoji: payload.emoji,
                }),
            );
        }
        Ok(())
    }

    #[instrument(skip(self, payload), fields(channel_id = %payload.channel_id, sender_id = %sender_id))]
    async fn send_channel_message(
        &self,
        connection_id: &ConnectionId,
        sender_id: &UserId,
        payload: ChannelMessagePayload,
    ) -> Result<(), AppError> {
        let (channel, message) = self
            .channel_service
            .send_channel_message(&payload.channel_id, sender_id, &payload.content)
            .await?;
        let room = channel.room();
        self.stop_typing(&room, sender_id, Some(connection_id));
        self.gateway.send_to_room(
            &room,
            &ServerEvent::ChannelMessageReceive(MessageEnvelope::new(message, payload.client_ref)),
            None,
        );
        Ok(())
    }

    /// A payload naming both a chat and a channel signals in both rooms.
    fn typing_start(
        &self,
        connection_id: &ConnectionId,
        user_id: &UserId,
        payload: &TypingPayload,
    ) -> Result<(), AppError> {
        let rooms = payload.rooms()?;
        if rooms
            .iter()
            .any(|room| !self.gateway.rooms().is_joined(connection_id, room))
        {
            return Err(AppError::Forbidden(
                "You have not joined this conversation".into(),
            ));
        }
        for room in &rooms {
            self.typing.set_typing(room, user_id);
            self.gateway.send_to_room(
                room,
                &ServerEvent::TypingStart(TypingEvent::new(user_id.clone(), room)),
                Some(connection_id),
            );
        }
        Ok(())
    }

    fn typing_stop(
        &self,
        connection_id: &ConnectionId,
        user_id: &UserId,
        payload: &TypingPayload,
    ) -> Result<(), AppError> {
        for room in payload.rooms()? {
            self.stop_typing(&room, user_id, Some(connection_id));
        }
        Ok(())
    }

    /// Clear an indicator and relay `typing:stop` if one was set.
    fn stop_typing(&self, room: &RoomId, user_id: &UserId, origin: Option<&ConnectionId>) {
        if self.typing.clear_typing(room, user_id) {
            self.gateway.send_to_room(
                room,
                &ServerEvent::TypingStop(TypingEvent::new(user_id.clone(), room)),
                origin,
            );
        }
    }

    fn emit_to_chat(&self, chat: &Chat, event: ServerEvent) {
        self.gateway
            .send_to_room_and_users(&chat.room(), &chat.participant_ids, &event);
    }

    fn reject(&self, connection_id: &ConnectionId, intent: Option<&'static str>, error: AppError) {
        let label = intent.unwrap_or("unknown");
        if error.is_transient() {
            error!(connection_id = %connection_id, event = label, error = %error, "Intent failed");
            metrics::record_intent(label, "failed");
        } else {
            warn!(connection_id = %connection_id, event = label, error = %error, "Intent rejected");
            metrics::record_intent(label, "rejected");
        }
        self.gateway
            .send_to_connection(connection_id, ServerEvent::error(error.client_message(), intent));
    }

    fn transition_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        self.transitions.entry(user_id.clone()).or_default().clone()
    }
}
