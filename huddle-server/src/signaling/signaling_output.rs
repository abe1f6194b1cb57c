use crate::signaling::ConnectionId;
use async_trait::async_trait;
use huddle_core::ServerEvent;

/// Outbound side of the relay, as seen by the room actors.
///
/// Implemented by the WebSocket service in production and by a recording
/// mock in tests.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Send one event to one connection.
    async fn deliver(&self, connection: ConnectionId, event: ServerEvent);
}
