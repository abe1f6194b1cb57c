use crate::signaling::ConnectionId;
use huddle_core::{PeerId, ServerEvent};
use tokio::sync::oneshot;

/// Commands a room actor processes, one at a time, in mailbox order.
///
/// A reply sender that is dropped without an answer means the room retired
/// before handling the command.
#[derive(Debug)]
pub enum RoomCommand {
    /// Add a member. Replies with the members that were present before it.
    Join {
        peer_id: PeerId,
        connection: ConnectionId,
        reply: oneshot::Sender<Vec<PeerId>>,
    },

    /// Remove a member bound to `connection`. Replies whether anything changed.
    Leave {
        peer_id: PeerId,
        connection: ConnectionId,
        reply: oneshot::Sender<bool>,
    },

    /// Forward an opaque event to every member except the sender's connection.
    Relay {
        from: ConnectionId,
        event: ServerEvent,
    },

    /// Current members in join order.
    Snapshot { reply: oneshot::Sender<Vec<PeerId>> },
}
