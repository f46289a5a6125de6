//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::application::services::{
    AuthService, AuthServiceImpl, ChannelService, ChatService, ModerationService, SystemService,
};
use crate::config::Settings;
use crate::infrastructure::cache::TypingCacheService;
use crate::infrastructure::database::FlatFileDb;
use crate::infrastructure::repositories::Repositories;
use crate::presentation::http::create_router;
use crate::presentation::http::handlers::health;
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::{FanoutEngine, Gateway};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: FlatFileDb,
    pub repos: Repositories,
    pub auth_service: Arc<dyn AuthService>,
    pub system_service: Arc<SystemService>,
    pub moderation_service: Arc<ModerationService>,
    pub chat_service: Arc<ChatService>,
    pub channel_service: Arc<ChannelService>,
    pub typing: Arc<TypingCacheService>,
    pub gateway: Arc<Gateway>,
    pub fanout: Arc<FanoutEngine>,
}

impl AppState {
    /// Wire services over the given repositories.
    ///
    /// `db` is only used for health checks; all reads and writes go through
    /// `repos`, which lets tests substitute individual repositories.
    pub fn new(settings: Settings, db: FlatFileDb, repos: Repositories) -> Self {
        let auth_service: Arc<dyn AuthService> = Arc::new(AuthServiceImpl::new(
            repos.users.clone(),
            settings.jwt.clone(),
        ));
        let system_service = Arc::new(SystemService::new(
            repos.users.clone(),
            repos.chats.clone(),
            repos.messages.clone(),
        ));
        let moderation_service = Arc::new(ModerationService::new(
            repos.users.clone(),
            repos.blocks.clone(),
            repos.suspensions.clone(),
            system_service.clone(),
        ));
        let chat_service = Arc::new(ChatService::new(
            repos.users.clone(),
            repos.chats.clone(),
            repos.messages.clone(),
            repos.reactions.clone(),
            moderation_service.clone(),
        ));
        let channel_service = Arc::new(ChannelService::new(
            repos.channels.clone(),
            repos.messages.clone(),
            moderation_service.clone(),
        ));

        let typing = Arc::new(TypingCacheService::with_ttl(settings.realtime.typing_ttl()));
        let gateway = Arc::new(Gateway::new());
        let fanout = Arc::new(FanoutEngine::new(
            gateway.clone(),
            chat_service.clone(),
            channel_service.clone(),
            repos.users.clone(),
            typing.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            db,
            repos,
            auth_service,
            system_service,
            moderation_service,
            chat_service,
            channel_service,
            typing,
            gateway,
            fanout,
        }
    }

    /// State over the flat-file repositories of `db`.
    pub fn file_backed(settings: Settings, db: FlatFileDb) -> Self {
        let repos = Repositories::file_backed(db.clone());
        Self::new(settings, db, repos)
    }
}

/// Expire typing indicators on a fixed cadence.
pub fn spawn_typing_sweeper(state: &AppState) -> JoinHandle<()> {
    let fanout = state.fanout.clone();
    let period = state.settings.realtime.typing_sweep_interval();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let expired = fanout.expire_typing();
            if expired > 0 {
                tracing::debug!(expired, "Expired typing indicators");
            }
        }
    })
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    sweeper: JoinHandle<()>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let db = FlatFileDb::open(&settings.storage).await?;
        tracing::info!(
            persistent = db.is_persistent(),
            data_dir = %settings.storage.data_dir.display(),
            "Store opened"
        );

        let state = AppState::file_backed(settings.clone(), db);
        let sweeper = spawn_typing_sweeper(&state);

        // Build router with middleware
        let router = create_router(state)
            .layer(logging::create_trace_layer())
            .layer(cors::create_cors_layer(&settings.cors));

        let addr = settings.server.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            sweeper,
        })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        let result = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        self.sweeper.abort();
        result?;
        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
