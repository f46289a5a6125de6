//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.
//!
//! Connections are real gateway sessions whose outbound queue is an
//! `mpsc` receiver, so tests assert on the events actually emitted.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use axum::{body::Body, http::Request, Router};
use axum_test::TestServer;
use tokio::sync::mpsc;
use tower::ServiceExt;

use chat_relay::config::{
    CorsSettings, JwtSettings, RealtimeSettings, ServerSettings, Settings, StorageSettings,
    WebSocketSettings,
};
use chat_relay::domain::entities::{
    Channel, Chat, ChatRepository, Message, MessageRepository, User, UserRole,
};
use chat_relay::domain::value_objects::{
    ChannelId, ChatId, ConnectionId, MessageId, MessageStatus, UserId,
};
use chat_relay::infrastructure::database::FlatFileDb;
use chat_relay::infrastructure::repositories::Repositories;
use chat_relay::presentation::http::create_router;
use chat_relay::presentation::websocket::{ClientIntent, FanoutEngine, ServerEvent};
use chat_relay::shared::error::AppError;
use chat_relay::startup::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-characters";

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        storage: StorageSettings {
            data_dir: PathBuf::from("data"),
            in_memory: true,
        },
        jwt: JwtSettings {
            secret: TEST_JWT_SECRET.into(),
            access_token_expiry_minutes: 60,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        websocket: WebSocketSettings {
            max_message_size: 65536,
            max_frame_size: 16384,
            heartbeat_interval_ms: 25000,
            idle_timeout_ms: 60000,
        },
        realtime: RealtimeSettings {
            typing_ttl_secs: 10,
            typing_sweep_interval_ms: 1000,
        },
        environment: "test".into(),
    }
}

/// Test application over an in-memory store
pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_repos(|repos| repos)
    }

    /// Build the app after swapping repositories, e.g. for failure injection.
    pub fn with_repos(customize: impl FnOnce(Repositories) -> Repositories) -> Self {
        Self::with_settings(test_settings(), customize)
    }

    pub fn with_settings(
        settings: Settings,
        customize: impl FnOnce(Repositories) -> Repositories,
    ) -> Self {
        let db = FlatFileDb::in_memory();
        let repos = customize(Repositories::file_backed(db.clone()));
        Self {
            state: AppState::new(settings, db, repos),
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Make a GET request straight through the router
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router()
            .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }

    pub fn fanout(&self) -> Arc<FanoutEngine> {
        self.state.fanout.clone()
    }

    pub async fn create_user(&self, id: &str) -> User {
        let user = User::new(UserId::new(id), id);
        self.state.repos.users.create(&user).await.unwrap()
    }

    pub async fn create_staff(&self, id: &str) -> User {
        let user = User {
            role: UserRole::Admin,
            ..User::new(UserId::new(id), id)
        };
        self.state.repos.users.create(&user).await.unwrap()
    }

    pub async fn create_system_account(&self) -> User {
        let user = User::system(UserId::new("system"), "support");
        self.state.repos.users.create(&user).await.unwrap()
    }

    pub fn token(&self, user_id: &UserId) -> String {
        self.state.auth_service.issue_token(user_id).unwrap()
    }

    pub async fn open_chat(&self, a: &User, b: &User) -> Chat {
        let (chat, _) = self
            .state
            .chat_service
            .open_chat(&a.id, &b.id)
            .await
            .unwrap();
        chat
    }

    /// Channel owned by `owner`; `members` are joined but not admins.
    pub async fn create_channel(&self, owner: &User, username: &str, members: &[&User]) -> Channel {
        let channel = self
            .state
            .channel_service
            .create_channel(
                &owner.id,
                chat_relay::application::services::CreateChannelDto {
                    name: username.to_string(),
                    username: username.to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        for member in members {
            self.state
                .channel_service
                .join_channel(&channel.id, &member.id)
                .await
                .unwrap();
        }
        self.state
            .channel_service
            .get_channel(&channel.id)
            .await
            .unwrap()
    }

    /// Open a realtime connection for `user`.
    pub async fn connect(&self, user: &User) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        let fanout = self.fanout();
        fanout.connect(&connection_id, &user.id, tx).await;
        TestClient {
            connection_id,
            user_id: user.id.clone(),
            fanout,
            rx,
        }
    }

    pub async fn stored_message(&self, id: &MessageId) -> Option<Message> {
        self.state.repos.messages.find_by_id(id).await.unwrap()
    }

    pub async fn chat_messages(&self, chat_id: &ChatId) -> Vec<Message> {
        self.state.repos.messages.find_by_chat(chat_id).await.unwrap()
    }

    pub async fn channel_messages(&self, channel_id: &ChannelId) -> Vec<Message> {
        self.state
            .repos
            .messages
            .find_by_channel(channel_id)
            .await
            .unwrap()
    }
}

/// One live connection as seen by a test
pub struct TestClient {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    fanout: Arc<FanoutEngine>,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestClient {
    pub async fn send(&self, intent: ClientIntent) {
        self.fanout
            .handle(&self.connection_id, &self.user_id, intent)
            .await;
    }

    /// Send a raw frame the way the socket loop does.
    pub async fn send_text(&self, text: &str) {
        match ClientIntent::parse(text) {
            Ok(intent) => self.send(intent).await,
            Err(e) => self.fanout.reject_frame(&self.connection_id, e),
        }
    }

    pub async fn disconnect(&self) {
        self.fanout.disconnect(&self.connection_id).await;
    }

    /// Everything emitted to this connection so far.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn drain_names(&mut self) -> Vec<&'static str> {
        self.drain().iter().map(ServerEvent::event_name).collect()
    }
}

pub fn received_messages(events: &[ServerEvent]) -> Vec<&Message> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::MessageReceive(envelope) | ServerEvent::ChannelMessageReceive(envelope) => {
                Some(&envelope.message)
            }
            _ => None,
        })
        .collect()
}

pub fn statuses(events: &[ServerEvent]) -> Vec<MessageStatus> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::MessageStatus(status) => Some(status.status),
            _ => None,
        })
        .collect()
}

pub fn error_messages(events: &[ServerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::Error(error) => Some(error.message.clone()),
            _ => None,
        })
        .collect()
}

fn disk_full() -> AppError {
    AppError::Io(std::io::Error::other("disk full"))
}

/// Message repository that can be told to fail writes with an I/O error,
/// or to stall edits so other requests interleave with them.
pub struct FaultyMessageRepository {
    inner: Arc<dyn MessageRepository>,
    fail_creates: AtomicBool,
    fail_status: AtomicBool,
    edit_delay_ms: AtomicU64,
}

impl FaultyMessageRepository {
    pub fn wrap(inner: Arc<dyn MessageRepository>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_creates: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
            edit_delay_ms: AtomicU64::new(0),
        })
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_status_updates(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }

    pub fn delay_edits(&self, delay: Duration) {
        self.edit_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageRepository for FaultyMessageRepository {
    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_chat(&self, chat_id: &ChatId) -> Result<Vec<Message>, AppError> {
        self.inner.find_by_chat(chat_id).await
    }

    async fn find_by_channel(&self, channel_id: &ChannelId) -> Result<Vec<Message>, AppError> {
        self.inner.find_by_channel(channel_id).await
    }

    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.create(message).await
    }

    async fn edit(&self, id: &MessageId, content: &str) -> Result<Message, AppError> {
        let delay = self.edit_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.edit(id, content).await
    }

    async fn tombstone(&self, id: &MessageId) -> Result<(Message, bool), AppError> {
        self.inner.tombstone(id).await
    }

    async fn advance_status(&self, id: &MessageId, status: MessageStatus) -> Result<bool, AppError> {
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.advance_status(id, status).await
    }

    async fn mark_seen(&self, chat_id: &ChatId, reader_id: &UserId) -> Result<Vec<MessageId>, AppError> {
        self.inner.mark_seen(chat_id, reader_id).await
    }
}

/// Chat repository whose activity bump can be made to fail.
pub struct FaultyChatRepository {
    inner: Arc<dyn ChatRepository>,
    fail_touch: AtomicBool,
}

impl FaultyChatRepository {
    pub fn wrap(inner: Arc<dyn ChatRepository>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_touch: AtomicBool::new(false),
        })
    }

    pub fn fail_touch(&self, fail: bool) {
        self.fail_touch.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatRepository for FaultyChatRepository {
    async fn find_by_id(&self, id: &ChatId) -> Result<Option<Chat>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_participants(&self, a: &UserId, b: &UserId) -> Result<Option<Chat>, AppError> {
        self.inner.find_by_participants(a, b).await
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Chat>, AppError> {
        self.inner.find_by_user(user_id).await
    }

    async fn create(&self, chat: &Chat) -> Result<Chat, AppError> {
        self.inner.create(chat).await
    }

    async fn touch(&self, id: &ChatId, at: DateTime<Utc>) -> Result<(), AppError> {
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.touch(id, at).await
    }
}
