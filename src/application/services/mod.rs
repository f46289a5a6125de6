//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: bearer token validation and identity resolution
//! - **ChatService**: direct chats, messages, reactions, seen marking
//! - **ChannelService**: broadcast channels and their messages
//! - **ModerationService**: blocks and suspensions
//! - **SystemService**: notices from the support account

pub mod auth_service;
pub mod channel_service;
pub mod chat_service;
pub mod moderation_service;
pub mod system_service;

pub use auth_service::{AuthError, AuthService, AuthServiceImpl, Claims};
pub use channel_service::{ChannelService, CreateChannelDto};
pub use chat_service::{ChatService, ReactionRemoval};
pub use moderation_service::ModerationService;
pub use system_service::{SystemNotifier, SystemService};
