//! Suspension Repository Implementation

use async_trait::async_trait;

use crate::domain::entities::{Suspension, SuspensionRepository};
use crate::domain::value_objects::{SuspensionId, UserId};
use crate::infrastructure::database::{Collection, FlatFileDb};
use crate::shared::error::AppError;

/// Suspension repository backed by `suspensions.json`.
#[derive(Clone)]
pub struct FileSuspensionRepository {
    db: FlatFileDb,
}

impl FileSuspensionRepository {
    pub fn new(db: FlatFileDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SuspensionRepository for FileSuspensionRepository {
    async fn find_by_id(&self, id: &SuspensionId) -> Result<Option<Suspension>, AppError> {
        Ok(self
            .db
            .read(|t| t.suspensions.iter().find(|s| &s.id == id).cloned())
            .await)
    }

    async fn find_active(&self, user_id: &UserId) -> Result<Option<Suspension>, AppError> {
        Ok(self
            .db
            .read(|t| {
                t.suspensions
                    .iter()
                    .filter(|s| &s.user_id == user_id && s.is_active)
                    .max_by_key(|s| s.created_at)
                    .cloned()
            })
            .await)
    }

    async fn create(&self, suspension: &Suspension) -> Result<Suspension, AppError> {
        let suspension = suspension.clone();
        self.db
            .write(Collection::Suspensions, |t| {
                t.suspensions.push(suspension.clone());
                suspension
            })
            .await
    }

    async fn update(&self, suspension: &Suspension) -> Result<Suspension, AppError> {
        let suspension = suspension.clone();
        self.db
            .write(Collection::Suspensions, |t| {
                let slot = t
                    .suspensions
                    .iter_mut()
                    .find(|s| s.id == suspension.id)
                    .ok_or_else(|| AppError::NotFound("Suspension not found".into()))?;
                *slot = suspension.clone();
                Ok(suspension)
            })
            .await?
    }
}
