//! Block entity and repository trait.
//!
//! Stored in the `blocks.json` collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BlockId, UserId};
use crate::shared::error::AppError;

/// `blocker_id` no longer accepts messages from `blocked_id`, and vice versa.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub blocker_id: UserId,
    pub blocked_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Block {
    pub fn new(blocker_id: UserId, blocked_id: UserId) -> Self {
        Self {
            id: BlockId::generate(),
            blocker_id,
            blocked_id,
            created_at: Utc::now(),
        }
    }
}

/// Block relation between two users, seen from the first one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatus {
    pub blocked_by_me: bool,
    pub blocked_me: bool,
}

impl BlockStatus {
    pub fn is_blocked(&self) -> bool {
        self.blocked_by_me || self.blocked_me
    }
}

/// Repository trait for Block data access operations.
#[async_trait]
pub trait BlockRepository: Send + Sync {
    async fn is_blocked(&self, blocker_id: &UserId, blocked_id: &UserId) -> Result<bool, AppError>;

    async fn create(&self, block: &Block) -> Result<Block, AppError>;

    /// Returns `false` when no such block existed.
    async fn remove(&self, blocker_id: &UserId, blocked_id: &UserId) -> Result<bool, AppError>;

    async fn find_by_blocker(&self, blocker_id: &UserId) -> Result<Vec<Block>, AppError>;
}
