//! Relay configuration.
//!
//! Every flag can also be supplied through the environment, which is how
//! hosted deployments pass the listening port.

use crate::room::DEFAULT_ROOM_MAILBOX;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "huddle_server=info,tower_http=info";

#[derive(Debug, Clone, Parser)]
#[command(name = "huddle-server", about = "Presence relay for peer-to-peer huddles")]
pub struct Config {
    /// Interface to listen on.
    #[arg(long, env = "HUDDLE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// TCP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Mailbox size of each room actor.
    #[arg(long, env = "HUDDLE_ROOM_MAILBOX", default_value_t = DEFAULT_ROOM_MAILBOX)]
    pub room_mailbox: usize,

    /// Fallback tracing filter.
    #[arg(long, env = "HUDDLE_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.room_mailbox == 0 {
            return Err(ConfigError::InvalidValue(
                "room mailbox must hold at least one command".to_string(),
            ));
        }
        Ok(self)
    }
}
