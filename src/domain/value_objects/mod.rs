//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **Ids**: typed string identifiers (users, chats, channels, messages, connections)
//! - **RoomId**: fan-out address with separate chat and channel namespaces
//! - **MessageStatus**: forward-only delivery status

mod ids;
mod message_status;
mod room;

pub use ids::*;
pub use message_status::*;
pub use room::*;
