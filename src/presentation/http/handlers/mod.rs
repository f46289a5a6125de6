//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod channel;
pub mod chat;
pub mod health;
pub mod moderation;
