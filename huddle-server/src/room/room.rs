use crate::room::room_command::RoomCommand;
use crate::room::room_registry::RoomSlot;
use crate::signaling::{ConnectionId, SignalingOutput};
use dashmap::DashMap;
use huddle_core::{PeerId, RoomId, ServerEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct Member {
    peer_id: PeerId,
    connection: ConnectionId,
}

/// Room actor.
///
/// Owns the member list of one room. Every mutation and every broadcast that
/// follows it happens inside a single command, so two concurrent joiners
/// always see each other: whichever is handled second finds the first in its
/// snapshot, and the first receives the second's announcement.
pub struct Room {
    id: RoomId,
    generation: u64,
    members: Vec<Member>,
    command_rx: mpsc::Receiver<RoomCommand>,
    rooms: Arc<DashMap<RoomId, RoomSlot>>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        generation: u64,
        command_rx: mpsc::Receiver<RoomCommand>,
        rooms: Arc<DashMap<RoomId, RoomSlot>>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            id,
            generation,
            members: Vec::new(),
            command_rx,
            rooms,
            signaling,
        }
    }

    pub async fn run(mut self) {
        info!(room = %self.id, generation = self.generation, "Room actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            if self.handle_command(cmd).await {
                break;
            }
        }

        self.retire().await;
        info!(room = %self.id, generation = self.generation, "Room actor finished");
    }

    /// Returns true once a leave has emptied the room.
    async fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                peer_id,
                connection,
                reply,
            } => {
                let existing = self.join(peer_id, connection).await;
                let _ = reply.send(existing);
                false
            }

            RoomCommand::Leave {
                peer_id,
                connection,
                reply,
            } => {
                let removed = self.leave(&peer_id, &connection).await;
                let emptied = removed && self.members.is_empty();
                if emptied {
                    // Unregister before answering so the caller never observes
                    // an empty room that is still listed.
                    self.unregister();
                }
                let _ = reply.send(removed);
                emptied
            }

            RoomCommand::Relay { from, event } => {
                for member in self.members.iter().filter(|m| m.connection != from) {
                    self.signaling
                        .deliver(member.connection, event.clone())
                        .await;
                }
                false
            }

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.peer_ids());
                false
            }
        }
    }

    async fn join(&mut self, peer_id: PeerId, connection: ConnectionId) -> Vec<PeerId> {
        let existing: Vec<PeerId> = self
            .members
            .iter()
            .filter(|m| m.peer_id != peer_id)
            .map(|m| m.peer_id.clone())
            .collect();

        let announce = match self.members.iter_mut().find(|m| m.peer_id == peer_id) {
            Some(member) if member.connection == connection => {
                debug!(room = %self.id, peer = %peer_id, "Duplicate join, re-sending snapshot");
                false
            }
            Some(member) => {
                info!(
                    room = %self.id,
                    peer = %peer_id,
                    old_connection = %member.connection,
                    new_connection = %connection,
                    "Peer rejoined from a new connection"
                );
                member.connection = connection;
                false
            }
            None => {
                self.members.push(Member {
                    peer_id: peer_id.clone(),
                    connection,
                });
                true
            }
        };

        for other in &existing {
            self.signaling
                .deliver(connection, ServerEvent::UserConnected(other.clone()))
                .await;
        }

        if announce {
            info!(room = %self.id, peer = %peer_id, members = self.members.len(), "Peer joined");
            for member in self.members.iter().filter(|m| m.peer_id != peer_id) {
                self.signaling
                    .deliver(
                        member.connection,
                        ServerEvent::UserConnected(peer_id.clone()),
                    )
                    .await;
            }
        }

        existing
    }

    async fn leave(&mut self, peer_id: &PeerId, connection: &ConnectionId) -> bool {
        let Some(pos) = self
            .members
            .iter()
            .position(|m| &m.peer_id == peer_id && &m.connection == connection)
        else {
            debug!(room = %self.id, peer = %peer_id, "Leave for absent member ignored");
            return false;
        };

        self.members.remove(pos);
        info!(room = %self.id, peer = %peer_id, members = self.members.len(), "Peer left");

        for member in &self.members {
            self.signaling
                .deliver(
                    member.connection,
                    ServerEvent::UserDisconnected(peer_id.clone()),
                )
                .await;
        }

        true
    }

    fn peer_ids(&self) -> Vec<PeerId> {
        self.members.iter().map(|m| m.peer_id.clone()).collect()
    }

    fn unregister(&self) {
        let generation = self.generation;
        self.rooms
            .remove_if(&self.id, |_, slot| slot.generation == generation);
    }

    /// Drops out of the registry and refuses whatever is still queued.
    ///
    /// Queued joins see their reply sender dropped and retry against a fresh
    /// actor; everything else concerns a room that has no members left.
    async fn retire(&mut self) {
        self.unregister();
        self.command_rx.close();

        let mut refused = 0usize;
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RoomCommand::Leave { reply, .. } => {
                    let _ = reply.send(false);
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(Vec::new());
                }
                RoomCommand::Join { .. } | RoomCommand::Relay { .. } => {}
            }
            refused += 1;
        }

        if refused > 0 {
            debug!(room = %self.id, refused, "Refused commands queued on a retired room");
        }
    }
}
