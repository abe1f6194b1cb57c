use crate::error::RegistryError;
use crate::room::RoomRegistry;
use crate::signaling::ConnectionId;
use huddle_core::{ClientEvent, PeerId, RoomId, RoomPeer, ServerEvent};
use tracing::{debug, info};

/// Where one signaling connection stands with respect to room membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket open, no room announced yet.
    Connected,
    Joined { room_id: RoomId, peer_id: PeerId },
    /// Explicitly left; may join again.
    Left,
    /// Socket gone. Terminal.
    Disconnected,
}

/// Everything a connection can feed into its session.
#[derive(Debug)]
pub enum Inbound {
    Event(ClientEvent),
    /// The socket closed, with or without a prior `leave-room`.
    TransportClosed,
}

/// Per-connection state machine of the signaling hub.
///
/// A dropped socket is handled as a `leave-room` for the last room and peer
/// the connection joined with, through the same code path.
pub struct ConnectionSession {
    connection: ConnectionId,
    state: ConnectionState,
    registry: RoomRegistry,
}

impl ConnectionSession {
    pub fn new(connection: ConnectionId, registry: RoomRegistry) -> Self {
        Self {
            connection,
            state: ConnectionState::Connected,
            registry,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub async fn handle(&mut self, inbound: Inbound) -> Result<(), RegistryError> {
        if self.state == ConnectionState::Disconnected {
            debug!(connection = %self.connection, "Input after disconnect ignored");
            return Ok(());
        }

        match inbound {
            Inbound::Event(ClientEvent::JoinRoom(RoomPeer { room_id, peer_id })) => {
                self.join(room_id, peer_id).await
            }

            Inbound::Event(ClientEvent::LeaveRoom(RoomPeer { room_id, peer_id })) => {
                self.leave(room_id, peer_id).await
            }

            Inbound::Event(ClientEvent::CodeChanged { room_id, code }) => {
                self.registry
                    .relay(&room_id, self.connection, ServerEvent::CodeChanged(code))
                    .await
            }

            Inbound::Event(ClientEvent::RunCode { room_id, output }) => {
                self.registry
                    .relay(&room_id, self.connection, ServerEvent::CodeOutput(output))
                    .await
            }

            Inbound::TransportClosed => {
                let result = match self.state.clone() {
                    ConnectionState::Joined { room_id, peer_id } => {
                        info!(
                            connection = %self.connection,
                            room = %room_id,
                            peer = %peer_id,
                            "Connection lost without leave, leaving on its behalf"
                        );
                        self.leave(room_id, peer_id).await
                    }
                    _ => Ok(()),
                };
                self.state = ConnectionState::Disconnected;
                result
            }
        }
    }

    async fn join(&mut self, room_id: RoomId, peer_id: PeerId) -> Result<(), RegistryError> {
        if let ConnectionState::Joined {
            room_id: current_room,
            peer_id: current_peer,
        } = self.state.clone()
        {
            if current_room != room_id || current_peer != peer_id {
                info!(
                    connection = %self.connection,
                    from = %current_room,
                    to = %room_id,
                    "Switching rooms"
                );
                self.leave(current_room, current_peer).await?;
            }
        }

        let existing = self
            .registry
            .join(&room_id, peer_id.clone(), self.connection)
            .await?;
        info!(
            connection = %self.connection,
            room = %room_id,
            peer = %peer_id,
            existing = existing.len(),
            "Joined room"
        );

        self.state = ConnectionState::Joined { room_id, peer_id };
        Ok(())
    }

    async fn leave(&mut self, room_id: RoomId, peer_id: PeerId) -> Result<(), RegistryError> {
        let removed = self
            .registry
            .leave(&room_id, &peer_id, self.connection)
            .await?;
        if !removed {
            debug!(
                connection = %self.connection,
                room = %room_id,
                peer = %peer_id,
                "Leave for a membership this connection does not hold"
            );
        }

        let matches_current = matches!(
            &self.state,
            ConnectionState::Joined { room_id: r, peer_id: p } if *r == room_id && *p == peer_id
        );
        if matches_current {
            self.state = ConnectionState::Left;
        }
        Ok(())
    }
}
