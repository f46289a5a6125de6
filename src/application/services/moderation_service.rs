//! Moderation Service
//!
//! Blocks between users and staff-issued suspensions. Both gate message
//! sending; neither affects reading.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use super::system_service::SystemService;
use crate::domain::entities::{
    Block, BlockRepository, BlockStatus, Suspension, SuspensionDuration, SuspensionRepository,
    User, UserRepository,
};
use crate::domain::value_objects::{SuspensionId, UserId};
use crate::shared::error::AppError;

pub struct ModerationService {
    user_repo: Arc<dyn UserRepository>,
    block_repo: Arc<dyn BlockRepository>,
    suspension_repo: Arc<dyn SuspensionRepository>,
    system: Arc<SystemService>,
}

impl ModerationService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        block_repo: Arc<dyn BlockRepository>,
        suspension_repo: Arc<dyn SuspensionRepository>,
        system: Arc<SystemService>,
    ) -> Self {
        Self {
            user_repo,
            block_repo,
            suspension_repo,
            system,
        }
    }

    /// `blocker_id` stops exchanging messages with `blocked_id`.
    #[instrument(skip(self))]
    pub async fn block_user(&self, blocker_id: &UserId, blocked_id: &UserId) -> Result<Block, AppError> {
        if blocker_id == blocked_id {
            return Err(AppError::Validation("You cannot block yourself".into()));
        }
        let blocker = self
            .user_repo
            .find_by_id(blocker_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if self.user_repo.find_by_id(blocked_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".into()));
        }
        if self.block_repo.is_blocked(blocker_id, blocked_id).await? {
            return Err(AppError::Conflict("This user is already blocked".into()));
        }

        let block = self
            .block_repo
            .create(&Block::new(blocker_id.clone(), blocked_id.clone()))
            .await?;
        info!(blocker_id = %blocker_id, blocked_id = %blocked_id, "User blocked");

        if let Err(e) = self.system.send_block_notice(blocked_id, &blocker.username).await {
            warn!(error = %e, blocked_id = %blocked_id, "Failed to send block notice");
        }

        Ok(block)
    }

    #[instrument(skip(self))]
    pub async fn unblock_user(&self, blocker_id: &UserId, blocked_id: &UserId) -> Result<(), AppError> {
        if !self.block_repo.remove(blocker_id, blocked_id).await? {
            return Err(AppError::BadRequest("This user is not blocked".into()));
        }
        info!(blocker_id = %blocker_id, blocked_id = %blocked_id, "User unblocked");
        Ok(())
    }

    /// Block relation between `user_id` and `other_id`, seen from `user_id`.
    pub async fn check_block_status(
        &self,
        user_id: &UserId,
        other_id: &UserId,
    ) -> Result<BlockStatus, AppError> {
        Ok(BlockStatus {
            blocked_by_me: self.block_repo.is_blocked(user_id, other_id).await?,
            blocked_me: self.block_repo.is_blocked(other_id, user_id).await?,
        })
    }

    /// Refuse a direct message when either side blocked the other.
    pub async fn ensure_not_blocked(&self, sender_id: &UserId, peer_id: &UserId) -> Result<(), AppError> {
        let status = self.check_block_status(sender_id, peer_id).await?;
        if status.blocked_by_me {
            return Err(AppError::Forbidden(
                "You have blocked this user. Unblock them to send messages".into(),
            ));
        }
        if status.blocked_me {
            return Err(AppError::Forbidden(
                "You cannot send messages to this user".into(),
            ));
        }
        Ok(())
    }

    /// The suspension in force for a user, expiring stale ones on the way.
    pub async fn active_suspension(&self, user_id: &UserId) -> Result<Option<Suspension>, AppError> {
        let Some(mut suspension) = self.suspension_repo.find_active(user_id).await? else {
            return Ok(None);
        };
        if suspension.is_in_force(Utc::now()) {
            return Ok(Some(suspension));
        }

        suspension.is_active = false;
        self.suspension_repo.update(&suspension).await?;
        self.clear_user_flags(user_id).await?;
        info!(user_id = %user_id, suspension_id = %suspension.id, "Suspension expired");
        Ok(None)
    }

    /// Refuse any send from a suspended account.
    pub async fn ensure_can_post(&self, user_id: &UserId) -> Result<(), AppError> {
        if self.active_suspension(user_id).await?.is_some() {
            return Err(AppError::Forbidden(
                "Your account is suspended. You cannot send messages".into(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self, admin, reason), fields(admin_id = %admin.id))]
    pub async fn suspend_user(
        &self,
        admin: &User,
        user_id: &UserId,
        duration: SuspensionDuration,
        reason: Option<String>,
    ) -> Result<Suspension, AppError> {
        if !admin.role.is_staff() {
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        if self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".into()));
        }
        if self.active_suspension(user_id).await?.is_some() {
            return Err(AppError::Conflict("This user is currently suspended".into()));
        }

        let suspension = self
            .suspension_repo
            .create(&Suspension::new(
                user_id.clone(),
                admin.id.clone(),
                duration,
                reason,
            ))
            .await?;

        self.user_repo
            .set_suspension(user_id, true, suspension.expires_at)
            .await?;
        info!(user_id = %user_id, suspension_id = %suspension.id, "User suspended");

        if let Err(e) = self.system.send_suspension_notice(&suspension).await {
            warn!(error = %e, user_id = %user_id, "Failed to send suspension notice");
        }

        Ok(suspension)
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn lift_suspension(
        &self,
        admin: &User,
        suspension_id: &SuspensionId,
    ) -> Result<Suspension, AppError> {
        if !admin.role.is_staff() {
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        let mut suspension = self
            .suspension_repo
            .find_by_id(suspension_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Suspension not found".into()))?;

        suspension.is_active = false;
        suspension.lifted_at = Some(Utc::now());
        suspension.lifted_by = Some(admin.id.clone());
        let suspension = self.suspension_repo.update(&suspension).await?;
        self.clear_user_flags(&suspension.user_id).await?;
        info!(user_id = %suspension.user_id, "Suspension lifted");
        Ok(suspension)
    }

    async fn clear_user_flags(&self, user_id: &UserId) -> Result<(), AppError> {
        match self.user_repo.set_suspension(user_id, false, None).await {
            Err(AppError::NotFound(_)) => Ok(()),
            other => other,
        }
    }
}
