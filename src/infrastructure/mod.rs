//! Infrastructure Layer
//!
//! Contains implementations for external concerns including:
//! - Flat-file JSON store and repositories
//! - In-process caches (typing indicators)
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod metrics;
pub mod repositories;
