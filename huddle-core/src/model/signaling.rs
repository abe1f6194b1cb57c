use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of `join-room` and `leave-room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPeer {
    pub room_id: RoomId,
    pub peer_id: PeerId,
}

impl RoomPeer {
    pub fn new(room_id: RoomId, peer_id: PeerId) -> Self {
        Self { room_id, peer_id }
    }
}

/// Frames a participant sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    JoinRoom(RoomPeer),
    LeaveRoom(RoomPeer),
    /// Editor content, forwarded untouched to the rest of the room.
    CodeChanged { room_id: RoomId, code: Value },
    /// Execution result, forwarded untouched as `code-output`.
    RunCode { room_id: RoomId, output: Value },
}

/// Frames the relay sends to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerEvent {
    UserConnected(PeerId),
    UserDisconnected(PeerId),
    CodeChanged(Value),
    CodeOutput(Value),
}

impl ClientEvent {
    pub fn join(room_id: RoomId, peer_id: PeerId) -> Self {
        Self::JoinRoom(RoomPeer::new(room_id, peer_id))
    }

    pub fn leave(room_id: RoomId, peer_id: PeerId) -> Self {
        Self::LeaveRoom(RoomPeer::new(room_id, peer_id))
    }

    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::JoinRoom(p) | Self::LeaveRoom(p) => &p.room_id,
            Self::CodeChanged { room_id, .. } | Self::RunCode { room_id, .. } => room_id,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl ServerEvent {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
