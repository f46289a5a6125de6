//! Block Repository Implementation

use async_trait::async_trait;

use crate::domain::entities::{Block, BlockRepository};
use crate::domain::value_objects::UserId;
use crate::infrastructure::database::{Collection, FlatFileDb};
use crate::shared::error::AppError;

/// Block repository backed by `blocks.json`.
#[derive(Clone)]
pub struct FileBlockRepository {
    db: FlatFileDb,
}

impl FileBlockRepository {
    pub fn new(db: FlatFileDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlockRepository for FileBlockRepository {
    async fn is_blocked(&self, blocker_id: &UserId, blocked_id: &UserId) -> Result<bool, AppError> {
        Ok(self
            .db
            .read(|t| {
                t.blocks
                    .iter()
                    .any(|b| &b.blocker_id == blocker_id && &b.blocked_id == blocked_id)
            })
            .await)
    }

    async fn create(&self, block: &Block) -> Result<Block, AppError> {
        let block = block.clone();
        self.db
            .write(Collection::Blocks, |t| {
                if let Some(existing) = t
                    .blocks
                    .iter()
                    .find(|b| b.blocker_id == block.blocker_id && b.blocked_id == block.blocked_id)
                {
                    return existing.clone();
                }
                t.blocks.push(block.clone());
                block
            })
            .await
    }

    async fn remove(&self, blocker_id: &UserId, blocked_id: &UserId) -> Result<bool, AppError> {
        if !self.is_blocked(blocker_id, blocked_id).await? {
            return Ok(false);
        }
        self.db
            .write(Collection::Blocks, |t| {
                let before = t.blocks.len();
                t.blocks
                    .retain(|b| !(&b.blocker_id == blocker_id && &b.blocked_id == blocked_id));
                t.blocks.len() != before
            })
            .await
    }

    async fn find_by_blocker(&self, blocker_id: &UserId) -> Result<Vec<Block>, AppError> {
        Ok(self
            .db
            .read(|t| {
                t.blocks
                    .iter()
                    .filter(|b| &b.blocker_id == blocker_id)
                    .cloned()
                    .collect()
            })
            .await)
    }
}
