use huddle_core::PeerId;
use thiserror::Error;

/// Local capture could not be acquired. Fatal to the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture permission denied: {0}")]
    Denied(String),
    #[error("capture device unavailable: {0}")]
    Unavailable(String),
    #[error("capture timed out")]
    TimedOut,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to reach {peer}: {reason}")]
    Unreachable { peer: PeerId, reason: String },
    #[error("transport closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("local media is not ready")]
    MediaNotReady,
    #[error("session already torn down")]
    TornDown,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("signaling connection failed: {0}")]
    Connect(String),
    #[error("signaling link closed")]
    Closed,
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// The session task is gone (ended or panicked).
    #[error("session has ended")]
    Ended,
    #[error(transparent)]
    Signaling(#[from] SignalingError),
}
