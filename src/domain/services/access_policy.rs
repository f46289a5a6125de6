//! Authorization rules for conversation access.

use crate::domain::entities::{Channel, Chat, Message, User};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;

/// Domain service deciding who may read, post and mutate in a conversation.
pub struct AccessPolicy;

impl AccessPolicy {
    /// The user must be one of the chat's participants.
    pub fn ensure_chat_participant(chat: &Chat, user_id: &UserId) -> Result<(), AppError> {
        if chat.is_participant(user_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have access to this chat".into(),
            ))
        }
    }

    /// Participation plus the system-chat rule: only the support account posts there.
    pub fn ensure_can_post_in_chat(chat: &Chat, sender: &User) -> Result<(), AppError> {
        Self::ensure_chat_participant(chat, &sender.id)?;
        if chat.is_system_chat && !sender.is_system_account {
            return Err(AppError::Forbidden(
                "You cannot send messages to the support account".into(),
            ));
        }
        Ok(())
    }

    /// Only channel admins author channel messages.
    pub fn ensure_channel_author(channel: &Channel, user_id: &UserId) -> Result<(), AppError> {
        if channel.is_admin(user_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only admins can send messages in this channel".into(),
            ))
        }
    }

    /// Reading channel history requires membership.
    pub fn ensure_channel_member(channel: &Channel, user_id: &UserId) -> Result<(), AppError> {
        if channel.is_member(user_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You are not a member of this channel".into(),
            ))
        }
    }

    /// Edits and deletes are reserved to the original sender.
    pub fn ensure_author(message: &Message, user_id: &UserId, action: &str) -> Result<(), AppError> {
        if &message.sender_id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("You cannot {} this message", action)))
        }
    }
}
