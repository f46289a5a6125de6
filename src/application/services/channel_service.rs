//! Channel Service
//!
//! Broadcast channels: membership, admin-only authoring, member-only history.

use std::sync::Arc;

use tracing::{error, info, instrument};

use super::moderation_service::ModerationService;
use crate::domain::entities::{Channel, ChannelRepository, ConversationRef, Message, MessageRepository};
use crate::domain::services::AccessPolicy;
use crate::domain::value_objects::{ChannelId, UserId};
use crate::shared::error::AppError;
use crate::shared::validation::{validate_channel_username, validate_content};

/// Create channel request
#[derive(Debug, Clone)]
pub struct CreateChannelDto {
    pub name: String,
    pub username: String,
    pub description: Option<String>,
}

pub struct ChannelService {
    channel_repo: Arc<dyn ChannelRepository>,
    message_repo: Arc<dyn MessageRepository>,
    moderation: Arc<ModerationService>,
}

impl ChannelService {
    pub fn new(
        channel_repo: Arc<dyn ChannelRepository>,
        message_repo: Arc<dyn MessageRepository>,
        moderation: Arc<ModerationService>,
    ) -> Self {
        Self {
            channel_repo,
            message_repo,
            moderation,
        }
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_channel(
        &self,
        owner_id: &UserId,
        request: CreateChannelDto,
    ) -> Result<Channel, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Channel name cannot be empty".into()));
        }
        validate_channel_username(&request.username)?;
        if self
            .channel_repo
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("This username is already taken".into()));
        }

        let mut channel = Channel::new(owner_id.clone(), request.name.trim(), &request.username);
        channel.description = request.description.unwrap_or_default();
        let channel = self.channel_repo.create(&channel).await?;
        info!(channel_id = %channel.id, "Channel created");
        Ok(channel)
    }

    pub async fn get_channel(&self, channel_id: &ChannelId) -> Result<Channel, AppError> {
        self.channel_repo
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn join_channel(&self, channel_id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError> {
        self.channel_repo.add_member(channel_id, user_id).await
    }

    /// Leaving also drops admin rights. The owner cannot leave.
    #[instrument(skip(self))]
    pub async fn leave_channel(&self, channel_id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError> {
        self.channel_repo.remove_member(channel_id, user_id).await
    }

    /// Owner-only: promote a member to admin.
    pub async fn add_admin(
        &self,
        channel_id: &ChannelId,
        owner_id: &UserId,
        target_id: &UserId,
    ) -> Result<Channel, AppError> {
        let channel = self.get_channel(channel_id).await?;
        if &channel.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the channel owner can add an admin".into(),
            ));
        }
        self.channel_repo.add_admin(&channel.id, target_id).await
    }

    /// Owner-only: demote an admin. The owner always stays admin.
    pub async fn remove_admin(
        &self,
        channel_id: &ChannelId,
        owner_id: &UserId,
        target_id: &UserId,
    ) -> Result<Channel, AppError> {
        let channel = self.get_channel(channel_id).await?;
        if &channel.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the channel owner can remove an admin".into(),
            ));
        }
        self.channel_repo.remove_admin(&channel.id, target_id).await
    }

    /// Persist an admin-authored channel message with status `sent`.
    #[instrument(skip(self, content), fields(channel_id = %channel_id, sender_id = %sender_id))]
    pub async fn send_channel_message(
        &self,
        channel_id: &ChannelId,
        sender_id: &UserId,
        content: &str,
    ) -> Result<(Channel, Message), AppError> {
        validate_content(content)?;
        let channel = self.get_channel(channel_id).await?;
        AccessPolicy::ensure_channel_author(&channel, sender_id)?;
        self.moderation.ensure_can_post(sender_id).await?;

        let message = Message::new(
            ConversationRef::Channel(channel.id.clone()),
            sender_id.clone(),
            content,
        );
        let message = self.message_repo.create(&message).await?;
        if let Err(e) = self.channel_repo.touch(&channel.id, message.created_at).await {
            error!(channel_id = %channel.id, error = %e, "Failed to bump channel activity");
        }
        Ok((channel, message))
    }

    pub async fn get_channel_messages(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<Vec<Message>, AppError> {
        let channel = self.get_channel(channel_id).await?;
        AccessPolicy::ensure_channel_member(&channel, user_id)?;
        self.message_repo.find_by_channel(&channel.id).await
    }
}
