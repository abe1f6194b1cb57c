//! Presence relay for huddle sessions.
//!
//! The relay brokers room membership only: participants announce themselves
//! with `join-room`, learn about each other through `user-connected` /
//! `user-disconnected`, and then talk to each other directly. Media never
//! passes through here.

pub mod config;
pub mod error;
pub mod http;
pub mod room;
pub mod signaling;

pub use config::{Config, ConfigError};
pub use error::RegistryError;
pub use http::{AppState, router};
pub use room::*;
pub use signaling::*;
