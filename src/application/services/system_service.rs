//! System Message Service
//!
//! Delivers notices from the support account into each user's system chat.
//! The system chat is created on first use.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::entities::{
    Chat, ChatRepository, ConversationRef, Message, MessageRepository, Suspension,
    SystemMessageKind, User, UserRepository,
};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;

/// Delivery of system notices.
#[async_trait]
pub trait SystemNotifier: Send + Sync {
    /// Persist a system message to `user_id`'s system chat.
    ///
    /// Returns `None` when no support account is provisioned.
    async fn deliver(
        &self,
        user_id: &UserId,
        content: &str,
        kind: SystemMessageKind,
    ) -> Result<Option<(Chat, Message)>, AppError>;
}

/// SystemNotifier backed by the chat and message repositories.
pub struct SystemService {
    user_repo: Arc<dyn UserRepository>,
    chat_repo: Arc<dyn ChatRepository>,
    message_repo: Arc<dyn MessageRepository>,
}

impl SystemService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        chat_repo: Arc<dyn ChatRepository>,
        message_repo: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            user_repo,
            chat_repo,
            message_repo,
        }
    }

    async fn system_chat_with(&self, system: &User, user_id: &UserId) -> Result<Chat, AppError> {
        if let Some(chat) = self
            .chat_repo
            .find_by_participants(&system.id, user_id)
            .await?
        {
            return Ok(chat);
        }
        let mut chat = Chat::new(system.id.clone(), user_id.clone());
        chat.is_system_chat = true;
        info!(chat_id = %chat.id, user_id = %user_id, "Creating system chat");
        self.chat_repo.create(&chat).await
    }

    /// Greeting sent once an account exists.
    pub async fn send_welcome(&self, user: &User) -> Result<Option<(Chat, Message)>, AppError> {
        let content = format!(
            "Hi {}!\n\nWelcome aboard. You can chat with friends, follow channels and \
             share files.\n\nIf you have any questions, ask here: our support team reads \
             every message.",
            user.username
        );
        self.deliver(&user.id, &content, SystemMessageKind::Welcome).await
    }

    /// Notice sent to a freshly suspended user.
    pub async fn send_suspension_notice(
        &self,
        suspension: &Suspension,
    ) -> Result<Option<(Chat, Message)>, AppError> {
        let content = suspension_notice(suspension, Utc::now());
        self.deliver(&suspension.user_id, &content, SystemMessageKind::Suspension)
            .await
    }

    /// Notice sent to a user who was just blocked.
    pub async fn send_block_notice(
        &self,
        blocked_id: &UserId,
        blocker_username: &str,
    ) -> Result<Option<(Chat, Message)>, AppError> {
        let content = format!(
            "User \"{}\" has blocked you.\n\nYou cannot send messages to this user, and this \
             user cannot send messages to you.",
            blocker_username
        );
        self.deliver(blocked_id, &content, SystemMessageKind::Block).await
    }
}

fn suspension_notice(suspension: &Suspension, now: DateTime<Utc>) -> String {
    let (span, ends) = match suspension.expires_at {
        Some(at) if !suspension.is_permanent => {
            let left = at - now;
            let days = left.num_days();
            let hours = left.num_hours() - days * 24;
            let span = if days > 0 {
                format!("for {} day(s) and {} hour(s)", days, hours)
            } else {
                format!("for {} hour(s)", hours.max(0))
            };
            (span, at.format("%Y-%m-%d %H:%M UTC").to_string())
        }
        _ => ("permanently".to_string(), "Never (permanent)".to_string()),
    };
    format!(
        "Account Suspension Notice\n\nYour account has been suspended {}.\n\nReason: {}\n\
         Suspension ends: {}\n\nWhile suspended you cannot send messages in chats or channels. \
         You can still read channel content.",
        span, suspension.reason, ends
    )
}

#[async_trait]
impl SystemNotifier for SystemService {
    async fn deliver(
        &self,
        user_id: &UserId,
        content: &str,
        kind: SystemMessageKind,
    ) -> Result<Option<(Chat, Message)>, AppError> {
        let Some(system) = self.user_repo.find_system_account().await? else {
            warn!(user_id = %user_id, "System account not provisioned, dropping notice");
            return Ok(None);
        };

        let chat = self.system_chat_with(&system, user_id).await?;

        let mut message = Message::new(
            ConversationRef::Chat(chat.id.clone()),
            system.id.clone(),
            content,
        );
        message.is_system_message = true;
        message.system_message_type = Some(kind);
        let message = self.message_repo.create(&message).await?;
        self.chat_repo.touch(&chat.id, message.created_at).await?;

        Ok(Some((chat, message)))
    }
}
