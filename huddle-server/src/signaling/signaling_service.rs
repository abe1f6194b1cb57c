use crate::signaling::{ConnectionId, SignalingOutput};
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

/// Registry of open sockets and their outbound queues.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
            }),
        }
    }

    pub fn add_connection(&self, connection: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(connection, tx);
    }

    pub fn remove_connection(&self, connection: &ConnectionId) {
        self.inner.connections.remove(connection);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn send_event(&self, connection: ConnectionId, event: &ServerEvent) {
        let Some(socket) = self.inner.connections.get(&connection) else {
            warn!(%connection, "Attempted to signal a closed connection");
            return;
        };

        match event.encode() {
            Ok(json) => {
                if let Err(e) = socket.send(Message::Text(json.into())) {
                    error!(%connection, "Failed to queue WS message: {:?}", e);
                }
            }
            Err(e) => error!("Failed to serialize server event: {}", e),
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, connection: ConnectionId, event: ServerEvent) {
        self.send_event(connection, &event);
    }
}
