//! # Chat Relay Library
//!
//! Realtime message delivery and presence for one-to-one chats and
//! broadcast channels:
//! - WebSocket gateway with per-connection sessions, rooms and presence
//! - Delivery status tracking (`sent`, `delivered`, `seen`)
//! - Typing indicators with expiry
//! - Blocking and staff suspensions enforced on every send
//! - A thin authenticated HTTP API and health/metrics endpoints
//! - Client-side optimistic message reconciliation
//!
//! ## Architecture
//!
//! - **Domain Layer**: Entities, value objects, repository traits and access rules
//! - **Application Layer**: Conversation, channel and moderation services
//! - **Infrastructure Layer**: Flat-file store, typing cache, metrics
//! - **Presentation Layer**: HTTP handlers and the WebSocket gateway
//! - **Client**: Conversation stores that reconcile optimistic sends
//!
//! ## Module Structure
//!
//! ```text
//! chat_relay/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, and traits
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Store, cache and metrics
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- client/         Optimistic message stores
//! +-- shared/         Errors and validation helpers
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Client-side reconciliation
pub mod client;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
