//! Suspension entity and repository trait.
//!
//! Stored in the `suspensions.json` collection.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{SuspensionId, UserId};
use crate::shared::error::AppError;

/// How long a suspension lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspensionDuration {
    Seconds(u64),
    Permanent,
}

impl SuspensionDuration {
    /// Expiry for a suspension starting at `from`; `None` for permanent.
    pub fn expires_at(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            SuspensionDuration::Seconds(secs) => {
                let secs = i64::try_from(*secs).unwrap_or(i64::MAX);
                Duration::try_seconds(secs).and_then(|d| from.checked_add_signed(d))
            }
            SuspensionDuration::Permanent => None,
        }
    }
}

impl FromStr for SuspensionDuration {
    type Err = AppError;

    /// Accepts `"permanent"` or a positive number of seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("permanent") {
            return Ok(SuspensionDuration::Permanent);
        }
        match s.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(SuspensionDuration::Seconds(secs)),
            _ => Err(AppError::Validation(format!(
                "Invalid suspension duration: {}",
                s
            ))),
        }
    }
}

/// An account suspension issued by staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suspension {
    pub id: SuspensionId,
    pub user_id: UserId,
    pub admin_id: UserId,
    pub reason: String,
    #[serde(default)]
    pub is_permanent: bool,
    /// `None` for permanent suspensions.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lifted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lifted_by: Option<UserId>,
}

impl Suspension {
    pub fn new(
        user_id: UserId,
        admin_id: UserId,
        duration: SuspensionDuration,
        reason: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SuspensionId::generate(),
            user_id,
            admin_id,
            reason: reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "No reason provided".into()),
            is_permanent: duration == SuspensionDuration::Permanent,
            expires_at: duration.expires_at(now),
            is_active: true,
            created_at: now,
            lifted_at: None,
            lifted_by: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_permanent && self.expires_at.is_some_and(|at| at <= now)
    }

    /// Active and not yet past its expiry.
    pub fn is_in_force(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }
}

/// Repository trait for Suspension data access operations.
#[async_trait]
pub trait SuspensionRepository: Send + Sync {
    async fn find_by_id(&self, id: &SuspensionId) -> Result<Option<Suspension>, AppError>;

    /// The suspension currently flagged active for a user, expired or not.
    async fn find_active(&self, user_id: &UserId) -> Result<Option<Suspension>, AppError>;

    async fn create(&self, suspension: &Suspension) -> Result<Suspension, AppError>;

    async fn update(&self, suspension: &Suspension) -> Result<Suspension, AppError>;
}
