//! HTTP Surface
//!
//! A thin authenticated API around the conversation services plus health
//! and metrics endpoints.

pub mod handlers;
pub mod routes;

pub use routes::create_router;
