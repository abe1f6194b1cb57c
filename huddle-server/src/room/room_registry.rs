use crate::error::RegistryError;
use crate::room::{Room, RoomCommand};
use crate::signaling::{ConnectionId, SignalingOutput};
use dashmap::DashMap;
use huddle_core::{PeerId, RoomId, ServerEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Default mailbox size of a room actor.
pub const DEFAULT_ROOM_MAILBOX: usize = 100;

/// How many times a join chases a room that retires underneath it.
const JOIN_ATTEMPTS: usize = 8;

pub(crate) struct RoomSlot {
    pub(crate) tx: mpsc::Sender<RoomCommand>,
    pub(crate) generation: u64,
}

/// Room key to room actor mapping.
///
/// Rooms are created by the first join and disappear as soon as their last
/// member leaves. Each room serializes its own commands; different rooms run
/// on independent tasks.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, RoomSlot>>,
    signaling: Arc<dyn SignalingOutput>,
    next_generation: Arc<AtomicU64>,
    mailbox: usize,
}

impl RoomRegistry {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self::with_mailbox(signaling, DEFAULT_ROOM_MAILBOX)
    }

    pub fn with_mailbox(signaling: Arc<dyn SignalingOutput>, mailbox: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
            next_generation: Arc::new(AtomicU64::new(0)),
            mailbox: mailbox.max(1),
        }
    }

    /// Adds `peer_id` to the room and returns the members present before it.
    ///
    /// The joiner is sent one `user-connected` per existing member and every
    /// existing member is sent `user-connected` for the joiner, all within the
    /// same room step. Joining twice is harmless.
    pub async fn join(
        &self,
        room_id: &RoomId,
        peer_id: PeerId,
        connection: ConnectionId,
    ) -> Result<Vec<PeerId>, RegistryError> {
        for attempt in 0..JOIN_ATTEMPTS {
            let tx = self.room_sender(room_id);
            let (reply, rx) = oneshot::channel();
            let cmd = RoomCommand::Join {
                peer_id: peer_id.clone(),
                connection,
                reply,
            };

            if tx.send(cmd).await.is_err() {
                debug!(room = %room_id, attempt, "Room retired before join was queued, retrying");
                continue;
            }

            match rx.await {
                Ok(existing) => return Ok(existing),
                Err(_) => {
                    debug!(room = %room_id, attempt, "Room retired before join was handled, retrying");
                }
            }
        }

        warn!(room = %room_id, peer = %peer_id, "Giving up on join");
        Err(RegistryError::RoomUnavailable(room_id.clone()))
    }

    /// Removes `peer_id` if it is bound to `connection`. Unknown rooms and
    /// absent peers are a no-op returning `false`.
    pub async fn leave(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        connection: ConnectionId,
    ) -> Result<bool, RegistryError> {
        let Some(tx) = self.existing_sender(room_id) else {
            return Ok(false);
        };

        let (reply, rx) = oneshot::channel();
        let cmd = RoomCommand::Leave {
            peer_id: peer_id.clone(),
            connection,
            reply,
        };
        if tx.send(cmd).await.is_err() {
            return Ok(false);
        }

        Ok(rx.await.unwrap_or(false))
    }

    /// Forwards `event` to everyone in the room except `from`. Does not
    /// create the room.
    pub async fn relay(
        &self,
        room_id: &RoomId,
        from: ConnectionId,
        event: ServerEvent,
    ) -> Result<(), RegistryError> {
        let Some(tx) = self.existing_sender(room_id) else {
            debug!(room = %room_id, "Relay to unknown room dropped");
            return Ok(());
        };

        if tx.send(RoomCommand::Relay { from, event }).await.is_err() {
            debug!(room = %room_id, "Relay to retired room dropped");
        }
        Ok(())
    }

    /// Members of the room in join order; empty when the room does not exist.
    pub async fn snapshot(&self, room_id: &RoomId) -> Result<Vec<PeerId>, RegistryError> {
        let Some(tx) = self.existing_sender(room_id) else {
            return Ok(Vec::new());
        };

        let (reply, rx) = oneshot::channel();
        if tx.send(RoomCommand::Snapshot { reply }).await.is_err() {
            return Ok(Vec::new());
        }

        Ok(rx.await.unwrap_or_default())
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn rooms(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    fn existing_sender(&self, room_id: &RoomId) -> Option<mpsc::Sender<RoomCommand>> {
        self.rooms.get(room_id).map(|slot| slot.tx.clone())
    }

    fn room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                info!(room = %room_id, generation, "Creating new room");

                let (tx, rx) = mpsc::channel(self.mailbox);
                let room = Room::new(
                    room_id.clone(),
                    generation,
                    rx,
                    self.rooms.clone(),
                    self.signaling.clone(),
                );
                tokio::spawn(room.run());

                RoomSlot { tx, generation }
            })
            .tx
            .clone()
    }
}
