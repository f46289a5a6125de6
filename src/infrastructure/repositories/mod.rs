//! Repository Implementations
//!
//! Flat-file implementations of the domain repository traits. Every
//! repository shares one [`FlatFileDb`] handle.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use crate::infrastructure::database::FlatFileDb;
//! use crate::infrastructure::repositories::Repositories;
//!
//! let db = FlatFileDb::open(&settings.storage).await?;
//! let repos = Repositories::file_backed(db);
//! let chat = repos.chats.find_by_id(&chat_id).await?;
//! ```

mod block_repository;
mod channel_repository;
mod chat_repository;
mod message_repository;
mod reaction_repository;
mod suspension_repository;
mod user_repository;

use std::sync::Arc;

pub use block_repository::FileBlockRepository;
pub use channel_repository::FileChannelRepository;
pub use chat_repository::FileChatRepository;
pub use message_repository::FileMessageRepository;
pub use reaction_repository::FileReactionRepository;
pub use suspension_repository::FileSuspensionRepository;
pub use user_repository::FileUserRepository;

use crate::domain::entities::{
    BlockRepository, ChannelRepository, ChatRepository, MessageRepository, ReactionRepository,
    SuspensionRepository, UserRepository,
};
use crate::infrastructure::database::FlatFileDb;

/// Every repository the services depend on, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub channels: Arc<dyn ChannelRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub reactions: Arc<dyn ReactionRepository>,
    pub blocks: Arc<dyn BlockRepository>,
    pub suspensions: Arc<dyn SuspensionRepository>,
}

impl Repositories {
    pub fn file_backed(db: FlatFileDb) -> Self {
        Self {
            users: Arc::new(FileUserRepository::new(db.clone())),
            chats: Arc::new(FileChatRepository::new(db.clone())),
            channels: Arc::new(FileChannelRepository::new(db.clone())),
            messages: Arc::new(FileMessageRepository::new(db.clone())),
            reactions: Arc::new(FileReactionRepository::new(db.clone())),
            blocks: Arc::new(FileBlockRepository::new(db.clone())),
            suspensions: Arc::new(FileSuspensionRepository::new(db)),
        }
    }
}
