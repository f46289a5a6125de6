//! Database Module
//!
//! Flat-file JSON store. Each collection is one pretty-printed JSON array
//! under the data directory, loaded once at start and rewritten after every
//! mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use crate::config::StorageSettings;
use crate::domain::entities::{Block, Channel, Chat, Message, Reaction, Suspension, User};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// The persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Chats,
    Channels,
    Messages,
    Reactions,
    Blocks,
    Suspensions,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Users,
        Collection::Chats,
        Collection::Channels,
        Collection::Messages,
        Collection::Reactions,
        Collection::Blocks,
        Collection::Suspensions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Chats => "chats",
            Self::Channels => "channels",
            Self::Messages => "messages",
            Self::Reactions => "reactions",
            Self::Blocks => "blocks",
            Self::Suspensions => "suspensions",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

/// In-memory image of every collection.
#[derive(Debug, Default)]
pub struct Tables {
    pub users: Vec<User>,
    pub chats: Vec<Chat>,
    pub channels: Vec<Channel>,
    pub messages: Vec<Message>,
    pub reactions: Vec<Reaction>,
    pub blocks: Vec<Block>,
    pub suspensions: Vec<Suspension>,
}

impl Tables {
    fn encode(&self, collection: Collection) -> Result<Vec<u8>, serde_json::Error> {
        match collection {
            Collection::Users => serde_json::to_vec_pretty(&self.users),
            Collection::Chats => serde_json::to_vec_pretty(&self.chats),
            Collection::Channels => serde_json::to_vec_pretty(&self.channels),
            Collection::Messages => serde_json::to_vec_pretty(&self.messages),
            Collection::Reactions => serde_json::to_vec_pretty(&self.reactions),
            Collection::Blocks => serde_json::to_vec_pretty(&self.blocks),
            Collection::Suspensions => serde_json::to_vec_pretty(&self.suspensions),
        }
    }
}

struct Inner {
    data_dir: Option<PathBuf>,
    tables: RwLock<Tables>,
}

/// Shared handle to the store. Cloning is cheap.
#[derive(Clone)]
pub struct FlatFileDb {
    inner: Arc<Inner>,
}

impl FlatFileDb {
    /// Open the store described by `settings`, loading every collection file.
    ///
    /// Missing files are treated as empty collections.
    #[instrument(skip(settings), fields(data_dir = %settings.data_dir.display()))]
    pub async fn open(settings: &StorageSettings) -> Result<Self, AppError> {
        if settings.in_memory {
            info!("Using in-memory store");
            return Ok(Self::in_memory());
        }

        let dir = settings.data_dir.clone();
        tokio::fs::create_dir_all(&dir).await?;

        let tables = Tables {
            users: load(&dir, Collection::Users).await?,
            chats: load(&dir, Collection::Chats).await?,
            channels: load(&dir, Collection::Channels).await?,
            messages: load(&dir, Collection::Messages).await?,
            reactions: load(&dir, Collection::Reactions).await?,
            blocks: load(&dir, Collection::Blocks).await?,
            suspensions: load(&dir, Collection::Suspensions).await?,
        };

        info!(
            users = tables.users.len(),
            chats = tables.chats.len(),
            channels = tables.channels.len(),
            messages = tables.messages.len(),
            "Flat-file store loaded"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                data_dir: Some(dir),
                tables: RwLock::new(tables),
            }),
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Inner {
                data_dir: None,
                tables: RwLock::new(Tables::default()),
            }),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.inner.data_dir.is_some()
    }

    /// Run `f` against a consistent snapshot of the tables.
    pub async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.inner.tables.read().await;
        f(&tables)
    }

    /// Mutate the tables and persist `collection`.
    ///
    /// Writers are serialized, so files are rewritten in mutation order. If
    /// persisting fails the in-memory change is kept and the error returned.
    pub async fn write<R>(
        &self,
        collection: Collection,
        f: impl FnOnce(&mut Tables) -> R,
    ) -> Result<R, AppError> {
        let mut tables = self.inner.tables.write().await;
        let result = f(&mut tables);

        if let Some(dir) = &self.inner.data_dir {
            let started = Instant::now();
            let bytes = tables.encode(collection)?;
            if let Err(e) = persist(dir, collection, &bytes).await {
                error!(collection = collection.name(), error = %e, "Failed to persist collection");
                return Err(e.into());
            }
            metrics::record_store_write(collection.name(), started.elapsed().as_secs_f64());
        }

        Ok(result)
    }
}

async fn load<T: DeserializeOwned>(dir: &Path, collection: Collection) -> Result<Vec<T>, AppError> {
    let path = dir.join(collection.file_name());
    match tokio::fs::read(&path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(file = %path.display(), "Collection file missing, starting empty");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Write to a temp file then rename over the target.
async fn persist(dir: &Path, collection: Collection, bytes: &[u8]) -> std::io::Result<()> {
    let target = dir.join(collection.file_name());
    let tmp = dir.join(format!(".{}.tmp", collection.file_name()));
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, &target).await
}
