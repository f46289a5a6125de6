//! Broadcast channel entity and repository trait.
//!
//! Stored in the `channels.json` collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ChannelId, RoomId, UserId};
use crate::shared::error::AppError;

/// Membership role inside a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRole {
    Owner,
    Admin,
    Member,
}

/// A broadcast group. Only admins author messages; members read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,

    pub name: String,

    /// Unique lowercase handle.
    pub username: String,

    #[serde(default)]
    pub description: String,

    pub owner_id: UserId,

    /// Always contains the owner.
    pub admin_ids: Vec<UserId>,

    /// Always contains every admin.
    pub member_ids: Vec<UserId>,

    #[serde(default)]
    pub is_verified: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Channel {
    pub fn new(owner_id: UserId, name: impl Into<String>, username: &str) -> Self {
        let now = Utc::now();
        Self {
            id: ChannelId::generate(),
            name: name.into(),
            username: username.to_lowercase(),
            description: String::new(),
            owner_id: owner_id.clone(),
            admin_ids: vec![owner_id.clone()],
            member_ids: vec![owner_id],
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn room(&self) -> RoomId {
        RoomId::Channel(self.id.clone())
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.member_ids.contains(user_id)
    }

    pub fn is_admin(&self, user_id: &UserId) -> bool {
        self.admin_ids.contains(user_id)
    }

    pub fn add_member(&mut self, user_id: &UserId) -> Result<(), AppError> {
        if self.is_member(user_id) {
            return Err(AppError::Conflict(
                "You are already a member of this channel".into(),
            ));
        }
        self.member_ids.push(user_id.clone());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Leaving also drops admin rights. The owner cannot leave.
    pub fn remove_member(&mut self, user_id: &UserId) -> Result<(), AppError> {
        if &self.owner_id == user_id {
            return Err(AppError::BadRequest(
                "The channel owner cannot leave the channel".into(),
            ));
        }
        if !self.is_member(user_id) {
            return Err(AppError::BadRequest(
                "You are not a member of this channel".into(),
            ));
        }
        self.member_ids.retain(|id| id != user_id);
        self.admin_ids.retain(|id| id != user_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn promote(&mut self, user_id: &UserId) -> Result<(), AppError> {
        if !self.is_member(user_id) {
            return Err(AppError::BadRequest(
                "This user is not a member of the channel".into(),
            ));
        }
        if self.is_admin(user_id) {
            return Err(AppError::Conflict("This user is already an admin".into()));
        }
        self.admin_ids.push(user_id.clone());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The owner always stays admin.
    pub fn demote(&mut self, user_id: &UserId) -> Result<(), AppError> {
        if &self.owner_id == user_id {
            return Err(AppError::BadRequest(
                "The owner cannot be removed from the admin list".into(),
            ));
        }
        self.admin_ids.retain(|id| id != user_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn role_of(&self, user_id: &UserId) -> Option<ChannelRole> {
        if &self.owner_id == user_id {
            Some(ChannelRole::Owner)
        } else if self.is_admin(user_id) {
            Some(ChannelRole::Admin)
        } else if self.is_member(user_id) {
            Some(ChannelRole::Member)
        } else {
            None
        }
    }
}

/// Repository trait for Channel data access operations.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn find_by_id(&self, id: &ChannelId) -> Result<Option<Channel>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Channel>, AppError>;

    async fn create(&self, channel: &Channel) -> Result<Channel, AppError>;

    /// Atomically add a member. See [`Channel::add_member`].
    async fn add_member(&self, id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError>;

    /// Atomically remove a member. See [`Channel::remove_member`].
    async fn remove_member(&self, id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError>;

    async fn add_admin(&self, id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError>;

    async fn remove_admin(&self, id: &ChannelId, user_id: &UserId) -> Result<Channel, AppError>;

    /// Bump the last-activity timestamp.
    async fn touch(&self, id: &ChannelId, at: DateTime<Utc>) -> Result<(), AppError>;
}
