use crate::call::CallState;
use crate::errors::CaptureError;
use crate::transport::{ConnectionId, RemoteMedia};
use huddle_core::PeerId;
use serde_json::Value;

/// What the session reports to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CaptureReady,
    /// Capture could not be acquired; the session ends without joining.
    CaptureFailed(CaptureError),
    PeerConnected {
        peer: PeerId,
        media: RemoteMedia,
    },
    /// The call with `peer` closed while the peer may still be in the room.
    CallEnded {
        peer: PeerId,
    },
    /// The relay reported that `peer` left the room.
    PeerDisconnected {
        peer: PeerId,
    },
    CodeChanged(Value),
    CodeOutput(Value),
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    Pending,
    Ready,
    Failed(CaptureError),
    Released,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSummary {
    pub peer: PeerId,
    pub connection_id: ConnectionId,
    pub state: CallState,
}

/// Point-in-time view of a session, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub capture: CaptureStatus,
    /// Sorted by peer.
    pub calls: Vec<CallSummary>,
    /// Peers announced before capture was ready, in arrival order.
    pub pending: Vec<PeerId>,
    /// Incoming calls waiting for capture, in arrival order.
    pub held: Vec<PeerId>,
    /// Peers the relay currently lists, sorted.
    pub roster: Vec<PeerId>,
}
