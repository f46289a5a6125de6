//! Chat Service
//!
//! Direct (1:1) conversations: resolve, authorize, persist. Fan-out of the
//! results is the realtime engine's job.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, instrument};

use super::moderation_service::ModerationService;
use crate::domain::entities::{
    Chat, ChatRepository, ConversationRef, Message, MessageRepository, Reaction,
    ReactionRepository, UserRepository,
};
use crate::domain::services::AccessPolicy;
use crate::domain::value_objects::{ChatId, MessageId, MessageStatus, UserId};
use crate::shared::error::AppError;
use crate::shared::validation::{validate_content, validate_emoji};

/// Result of a reaction removal.
#[derive(Debug, Clone)]
pub struct ReactionRemoval {
    pub chat: Chat,
    pub message_id: MessageId,
    pub removed: bool,
}

pub struct ChatService {
    user_repo: Arc<dyn UserRepository>,
    chat_repo: Arc<dyn ChatRepository>,
    message_repo: Arc<dyn MessageRepository>,
    reaction_repo: Arc<dyn ReactionRepository>,
    moderation: Arc<ModerationService>,
}

impl ChatService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        chat_repo: Arc<dyn ChatRepository>,
        message_repo: Arc<dyn MessageRepository>,
        reaction_repo: Arc<dyn ReactionRepository>,
        moderation: Arc<ModerationService>,
    ) -> Self {
        Self {
            user_repo,
            chat_repo,
            message_repo,
            reaction_repo,
            moderation,
        }
    }

    /// Chat between `user_id` and `peer_id`, created on first use.
    ///
    /// Returns the chat and whether it was just created.
    #[instrument(skip(self))]
    pub async fn open_chat(&self, user_id: &UserId, peer_id: &UserId) -> Result<(Chat, bool), AppError> {
        if user_id == peer_id {
            return Err(AppError::Validation("You cannot start a chat with yourself".into()));
        }
        if self.user_repo.find_by_id(peer_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".into()));
        }
        if let Some(chat) = self.chat_repo.find_by_participants(user_id, peer_id).await? {
            return Ok((chat, false));
        }
        let chat = self
            .chat_repo
            .create(&Chat::new(user_id.clone(), peer_id.clone()))
            .await?;
        debug!(chat_id = %chat.id, "Chat created");
        Ok((chat, true))
    }

    /// Load a chat the caller participates in.
    pub async fn get_chat(&self, chat_id: &ChatId, user_id: &UserId) -> Result<Chat, AppError> {
        let chat = self.require_chat(chat_id).await?;
        AccessPolicy::ensure_chat_participant(&chat, user_id)?;
        Ok(chat)
    }

    /// Chats of a user, most recently active first.
    pub async fn list_chats(&self, user_id: &UserId) -> Result<Vec<Chat>, AppError> {
        self.chat_repo.find_by_user(user_id).await
    }

    /// Validate, authorize and persist a new chat message with status `sent`.
    #[instrument(skip(self, content), fields(chat_id = %chat_id, sender_id = %sender_id))]
    pub async fn send_message(
        &self,
        chat_id: &ChatId,
        sender_id: &UserId,
        content: &str,
        reply_to_id: Option<&MessageId>,
    ) -> Result<(Chat, Message), AppError> {
        validate_content(content)?;
        let chat = self.require_chat(chat_id).await?;
        let sender = self
            .user_repo
            .find_by_id(sender_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        AccessPolicy::ensure_can_post_in_chat(&chat, &sender)?;

        self.moderation.ensure_can_post(sender_id).await?;
        if let Some(peer_id) = chat.peer_of(sender_id) {
            self.moderation.ensure_not_blocked(sender_id, peer_id).await?;
        }

        let mut message = Message::new(
            ConversationRef::Chat(chat.id.clone()),
            sender_id.clone(),
            content,
        );
        if let Some(reply_to_id) = reply_to_id {
            let target = self
                .message_repo
                .find_by_id(reply_to_id)
                .await?
                .filter(|m| m.belongs_to_chat(&chat.id))
                .ok_or_else(|| {
                    AppError::Validation("Reply target is not part of this chat".into())
                })?;
            message.reply_to_id = Some(target.id.clone());
            message.reply_to = Some(target.preview());
        }

        let message = self.message_repo.create(&message).await?;
        // The message is stored; a stale activity stamp only affects chat ordering.
        if let Err(e) = self.chat_repo.touch(&chat.id, message.created_at).await {
            error!(chat_id = %chat.id, error = %e, "Failed to bump chat activity");
        }
        Ok((chat, message))
    }

    /// Move a message to `delivered`. Returns `false` if it was already there or past.
    pub async fn mark_delivered(&self, message_id: &MessageId) -> Result<bool, AppError> {
        self.message_repo
            .advance_status(message_id, MessageStatus::Delivered)
            .await
    }

    #[instrument(skip(self, content))]
    pub async fn edit_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        user_id: &UserId,
        content: &str,
    ) -> Result<(Chat, Message), AppError> {
        validate_content(content)?;
        let (chat, message) = self.require_message(chat_id, message_id, user_id).await?;
        AccessPolicy::ensure_author(&message, user_id, "edit")?;

        let message = self.message_repo.edit(&message.id, content).await?;
        Ok((chat, self.hydrate(message).await?))
    }

    /// Tombstone a message. Returns whether anything changed.
    #[instrument(skip(self))]
    pub async fn delete_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        user_id: &UserId,
    ) -> Result<(Chat, Message, bool), AppError> {
        let (chat, message) = self.require_message(chat_id, message_id, user_id).await?;
        AccessPolicy::ensure_author(&message, user_id, "delete")?;

        let (message, changed) = self.message_repo.tombstone(&message.id).await?;
        Ok((chat, self.hydrate(message).await?, changed))
    }

    /// Idempotent per (message, user, emoji). Returns whether a reaction was created.
    pub async fn add_reaction(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> Result<(Chat, Reaction, bool), AppError> {
        validate_emoji(emoji)?;
        let (chat, message) = self.require_message(chat_id, message_id, user_id).await?;
        let (reaction, created) = self
            .reaction_repo
            .add(&Reaction::new(message.id, user_id.clone(), emoji))
            .await?;
        Ok((chat, reaction, created))
    }

    /// Removing an absent reaction is a no-op.
    pub async fn remove_reaction(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        user_id: &UserId,
        emoji: &str,
    ) -> Result<ReactionRemoval, AppError> {
        validate_emoji(emoji)?;
        let (chat, message) = self.require_message(chat_id, message_id, user_id).await?;
        let removed = self
            .reaction_repo
            .remove(&message.id, user_id, emoji)
            .await?;
        Ok(ReactionRemoval {
            chat,
            message_id: message.id,
            removed,
        })
    }

    /// Message history for a participant. Stamps `seen` on the peer's messages.
    #[instrument(skip(self))]
    pub async fn get_chat_messages(
        &self,
        chat_id: &ChatId,
        reader_id: &UserId,
    ) -> Result<Vec<Message>, AppError> {
        let chat = self.get_chat(chat_id, reader_id).await?;
        let seen = self.message_repo.mark_seen(&chat.id, reader_id).await?;
        if !seen.is_empty() {
            debug!(count = seen.len(), "Messages marked seen");
        }
        let messages = self.message_repo.find_by_chat(&chat.id).await?;
        self.hydrate_all(messages).await
    }

    /// Attach stored reactions to a message.
    pub async fn hydrate(&self, mut message: Message) -> Result<Message, AppError> {
        message.reactions = self.reaction_repo.find_by_message(&message.id).await?;
        Ok(message)
    }

    pub async fn hydrate_all(&self, mut messages: Vec<Message>) -> Result<Vec<Message>, AppError> {
        let ids: Vec<MessageId> = messages.iter().map(|m| m.id.clone()).collect();
        let mut by_message: HashMap<MessageId, Vec<Reaction>> = HashMap::new();
        for reaction in self.reaction_repo.find_by_messages(&ids).await? {
            by_message
                .entry(reaction.message_id.clone())
                .or_default()
                .push(reaction);
        }
        for message in &mut messages {
            message.reactions = by_message.remove(&message.id).unwrap_or_default();
        }
        Ok(messages)
    }

    async fn require_chat(&self, chat_id: &ChatId) -> Result<Chat, AppError> {
        self.chat_repo
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Chat not found".into()))
    }

    /// Chat plus one of its messages, for a participant.
    async fn require_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        user_id: &UserId,
    ) -> Result<(Chat, Message), AppError> {
        let chat = self.get_chat(chat_id, user_id).await?;
        let message = self
            .message_repo
            .find_by_id(message_id)
            .await?
            .filter(|m| m.belongs_to_chat(&chat.id))
            .ok_or_else(|| AppError::NotFound("Message not found".into()))?;
        Ok((chat, message))
    }
}
