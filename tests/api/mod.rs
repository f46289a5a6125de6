//! HTTP API tests

mod health_tests;
mod moderation_tests;
mod ws_auth_tests;
