//! Opaque string identifiers.
//!
//! Every durable entity is addressed by a UUID string. The newtypes keep a
//! chat id from being passed where a channel id is expected, which matters
//! because both share the same textual id space.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identity (user account) id.
    UserId
);
string_id!(
    /// Direct chat id.
    ChatId
);
string_id!(
    /// Broadcast channel id.
    ChannelId
);
string_id!(
    /// Message id.
    MessageId
);
string_id!(
    /// Reaction id.
    ReactionId
);
string_id!(
    /// Block record id.
    BlockId
);
string_id!(
    /// Suspension record id.
    SuspensionId
);
string_id!(
    /// Live socket connection id. Never persisted.
    ConnectionId
);
