//! Request DTOs
//!
//! Data structures for API request bodies.

use serde::Deserialize;
use validator::Validate;

/// Open (or fetch) the direct chat with another user
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OpenChatRequest {
    #[validate(length(min = 1, message = "Participant id is required"))]
    pub participant_id: String,
}

/// Create channel request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChannelRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Suspend a user
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuspendUserRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,

    /// `"permanent"` or a number of seconds
    pub duration: serde_json::Value,

    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

impl SuspendUserRequest {
    /// Duration as text, accepting both JSON numbers and strings.
    pub fn duration_text(&self) -> String {
        match &self.duration {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
