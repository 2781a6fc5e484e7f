//! Polymarket data transfer objects.
//!
//! Contains types for API and WebSocket communication:
//! - WebSocket messages (subscriptions, books, level changes, tick sizes)
//! - REST API responses (order books, Gamma events)

pub mod message;
pub mod response;
