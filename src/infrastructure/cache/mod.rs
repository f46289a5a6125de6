//! Cache Module
//!
//! Short-lived, in-process state that is never persisted.
//!
//! - [`TypingCacheService`]: typing indicators with a TTL, swept periodically
//!   by the realtime engine.

mod typing_cache;

pub use typing_cache::{TypingCacheService, DEFAULT_TYPING_TTL_SECS};
