//! # Domain Entities
//!
//! Durable business objects of the chat system. Each entity is stored in its
//! own flat-file collection.
//!
//! ## Core Entities
//!
//! - **User**: account with role, presence mirror and suspension flags
//! - **Chat**: direct 1:1 conversation
//! - **Channel**: broadcast group authored by admins
//! - **Message**: chat or channel message with delivery status
//! - **Reaction**: emoji reaction, unique per (message, user, emoji)
//!
//! ## Moderation Entities
//!
//! - **Block**: one user refusing messages from another
//! - **Suspension**: staff-issued posting ban
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod block;
mod channel;
mod chat;
mod message;
mod reaction;
mod suspension;
mod user;

pub use block::{Block, BlockRepository, BlockStatus};
pub use channel::{Channel, ChannelRepository, ChannelRole};
pub use chat::{Chat, ChatRepository};
pub use message::{
    ConversationRef, Message, MessageRepository, MessageType, ReplyPreview, SystemMessageKind,
    DELETED_PLACEHOLDER,
};
pub use reaction::{Reaction, ReactionRepository};
pub use suspension::{Suspension, SuspensionDuration, SuspensionRepository};
pub use user::{User, UserRepository, UserRole};

#[cfg(test)]
pub use message::MockMessageRepository;
#[cfg(test)]
pub use user::MockUserRepository;
