//! Delivery status state machine.
//!
//! ```text
//! sending ──► sent ──► delivered ──► seen
//! (client)   (stored)  (peer online)  (peer fetched)
//! ```
//!
//! Transitions only move forward. `sending` exists on clients only and is never
//! written to the store. Channel messages stay at `sent`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-message delivery status, ordered by progress.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Provisional, rendered optimistically before the server answered.
    Sending,
    /// Persisted.
    #[default]
    Sent,
    /// The recipient had a live connection when the message was sent.
    Delivered,
    /// The recipient fetched the conversation.
    Seen,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Seen => "seen",
        }
    }

    /// Whether a message with this status may be stored.
    pub fn is_persistable(&self) -> bool {
        !matches!(self, Self::Sending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Seen)
    }

    /// Returns the next status if `next` moves forward, `None` otherwise.
    pub fn advance(self, next: MessageStatus) -> Option<MessageStatus> {
        (next > self).then_some(next)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
