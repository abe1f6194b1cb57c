//! Contract of the peer-to-peer transport.
//!
//! The session only ever talks to these traits; the browser or native
//! WebRTC stack behind them is someone else's problem. Implementations must
//! not block: `dial` and `answer` return a handle at once and report
//! progress later as [`TransportEvent`]s on the channel the session reads.

use crate::errors::TransportError;
use crate::media::LocalMedia;
use huddle_core::PeerId;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identifies one transport-level connection attempt.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote stream descriptor handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMedia {
    pub stream_id: String,
}

/// A connection offered by a remote peer, not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCall {
    pub from: PeerId,
    pub connection_id: ConnectionId,
}

#[derive(Debug, Clone)]
pub enum TransportEvent {
    Incoming(IncomingCall),
    RemoteMedia {
        peer: PeerId,
        connection_id: ConnectionId,
        media: RemoteMedia,
    },
    Closed {
        peer: PeerId,
        connection_id: ConnectionId,
    },
    Error {
        peer: PeerId,
        connection_id: ConnectionId,
        reason: String,
    },
}

impl TransportEvent {
    pub fn peer(&self) -> &PeerId {
        match self {
            Self::Incoming(call) => &call.from,
            Self::RemoteMedia { peer, .. }
            | Self::Closed { peer, .. }
            | Self::Error { peer, .. } => peer,
        }
    }
}

/// Live connection handle.
pub trait CallHandle: Send + Sync {
    fn connection_id(&self) -> ConnectionId;

    /// Hang up. Must be safe to call on an already closed connection.
    fn close(&self);
}

pub trait Transport: Send + Sync + 'static {
    fn dial(
        &self,
        remote: &PeerId,
        media: Arc<LocalMedia>,
    ) -> Result<Box<dyn CallHandle>, TransportError>;

    fn answer(
        &self,
        incoming: IncomingCall,
        media: Arc<LocalMedia>,
    ) -> Result<Box<dyn CallHandle>, TransportError>;

    fn reject(&self, incoming: IncomingCall);
}
