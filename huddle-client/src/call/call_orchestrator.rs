use crate::call::{CallRecord, CallState};
use crate::errors::{CallError, SignalingError};
use crate::media::{LocalMedia, TrackKind};
use crate::signaling::SignalingLink;
use crate::transport::{ConnectionId, IncomingCall, RemoteMedia, Transport, TransportEvent};
use huddle_core::{ClientEvent, PeerId, RoomId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What became of an incoming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingOutcome {
    /// No call with that peer existed; answered.
    Answered,
    /// Both sides dialed; this side sorts lower, so it answered and
    /// abandoned its own dial.
    CollisionAnswered,
    /// Both sides dialed; this side sorts higher, so it kept its own dial.
    CollisionRejected,
    /// The peer dialed again over an existing call; the old one was closed.
    Replaced,
    /// Same connection reported twice.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The remote end hung up.
    Remote,
    /// The transport failed.
    Failed(String),
}

/// Externally visible call changes produced by transport events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallUpdate {
    Connected { peer: PeerId, media: RemoteMedia },
    Closed { peer: PeerId, reason: CloseReason },
}

/// Keeps at most one call per remote peer.
///
/// Simultaneous dials are settled without negotiation: both sides compare
/// identities and the lower one answers, so the higher one's dial survives
/// on both ends.
pub struct CallOrchestrator {
    local: PeerId,
    room: RoomId,
    transport: Arc<dyn Transport>,
    signaling: Arc<dyn SignalingLink>,
    media: Option<Arc<LocalMedia>>,
    calls: HashMap<PeerId, CallRecord>,
    joined: bool,
    torn_down: bool,
}

impl CallOrchestrator {
    pub fn new(
        local: PeerId,
        room: RoomId,
        transport: Arc<dyn Transport>,
        signaling: Arc<dyn SignalingLink>,
    ) -> Self {
        Self {
            local,
            room,
            transport,
            signaling,
            media: None,
            calls: HashMap::new(),
            joined: false,
            torn_down: false,
        }
    }

    pub fn local_peer(&self) -> &PeerId {
        &self.local
    }

    pub fn attach_media(&mut self, media: Arc<LocalMedia>) {
        self.media = Some(media);
    }

    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// Announce this participant to the room.
    pub fn join_room(&mut self) -> Result<(), SignalingError> {
        self.signaling
            .send(ClientEvent::join(self.room.clone(), self.local.clone()))?;
        self.joined = true;
        info!(room = %self.room, peer = %self.local, "Joined room");
        Ok(())
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn call(&self, peer: &PeerId) -> Option<&CallRecord> {
        self.calls.get(peer)
    }

    pub fn calls(&self) -> impl Iterator<Item = &CallRecord> {
        self.calls.values()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Dial `peer` unless a call with it already exists. Returns whether a
    /// dial was started.
    pub fn notify_peer_present(&mut self, peer: PeerId) -> Result<bool, CallError> {
        if self.torn_down {
            return Err(CallError::TornDown);
        }
        if peer == self.local || self.calls.contains_key(&peer) {
            return Ok(false);
        }
        let media = self.media.clone().ok_or(CallError::MediaNotReady)?;

        let handle = self.transport.dial(&peer, media)?;
        info!(peer = %peer, connection = %handle.connection_id(), "Dialing");
        self.calls.insert(
            peer.clone(),
            CallRecord::new(peer, handle, CallState::Dialing),
        );
        Ok(true)
    }

    pub fn notify_incoming_call(&mut self, call: IncomingCall) -> Result<IncomingOutcome, CallError> {
        if self.torn_down {
            self.transport.reject(call);
            return Err(CallError::TornDown);
        }
        let Some(media) = self.media.clone() else {
            self.transport.reject(call);
            return Err(CallError::MediaNotReady);
        };

        let existing = self
            .calls
            .get(&call.from)
            .map(|r| (r.state(), r.connection_id()));

        let outcome = match existing {
            None => IncomingOutcome::Answered,
            Some((_, connection)) if connection == call.connection_id => {
                debug!(peer = %call.from, %connection, "Incoming call already known");
                return Ok(IncomingOutcome::Duplicate);
            }
            Some((CallState::Dialing, _)) if self.local < call.from => {
                IncomingOutcome::CollisionAnswered
            }
            Some((CallState::Dialing, _)) => {
                info!(
                    peer = %call.from,
                    connection = %call.connection_id,
                    "Mutual dial, keeping our own attempt"
                );
                self.transport.reject(call);
                return Ok(IncomingOutcome::CollisionRejected);
            }
            Some(_) => IncomingOutcome::Replaced,
        };

        let peer = call.from.clone();
        let handle = self.transport.answer(call, media)?;
        info!(peer = %peer, connection = %handle.connection_id(), ?outcome, "Answering");

        let record = CallRecord::new(peer.clone(), handle, CallState::Answering);
        if let Some(mut previous) = self.calls.insert(peer, record) {
            previous.close();
        }
        Ok(outcome)
    }

    /// Close the call with `peer`, if any. Returns whether one existed.
    pub fn notify_peer_absent(&mut self, peer: &PeerId) -> bool {
        let Some(mut record) = self.calls.remove(peer) else {
            return false;
        };
        info!(peer = %peer, connection = %record.connection_id(), "Closing call, peer left");
        record.close();
        true
    }

    /// Apply one transport event. Events for connections no longer tracked
    /// are stale and dropped.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> Option<CallUpdate> {
        match event {
            TransportEvent::Incoming(call) => {
                let peer = call.from.clone();
                if let Err(e) = self.notify_incoming_call(call) {
                    warn!(peer = %peer, "Incoming call not handled: {}", e);
                }
                None
            }

            TransportEvent::RemoteMedia {
                peer,
                connection_id,
                media,
            } => {
                let record = self.calls.get_mut(&peer)?;
                if record.connection_id() != connection_id {
                    debug!(peer = %peer, %connection_id, "Stale remote media ignored");
                    return None;
                }
                if !record.connect(media.clone()) {
                    return None;
                }
                info!(peer = %peer, %connection_id, "Call connected");
                Some(CallUpdate::Connected { peer, media })
            }

            TransportEvent::Closed {
                peer,
                connection_id,
            } => self.remove_matching(peer, connection_id, CloseReason::Remote),

            TransportEvent::Error {
                peer,
                connection_id,
                reason,
            } => {
                warn!(peer = %peer, %connection_id, "Transport error: {}", reason);
                self.remove_matching(peer, connection_id, CloseReason::Failed(reason))
            }
        }
    }

    pub fn mute_local_audio(&self) -> Option<bool> {
        self.media.as_ref()?.toggle(TrackKind::Audio)
    }

    pub fn mute_local_video(&self) -> Option<bool> {
        self.media.as_ref()?.toggle(TrackKind::Video)
    }

    /// Close every call, release local capture and leave the room if it was
    /// joined.
    ///
    /// Only the first call does anything. Returns how many calls were closed.
    pub fn teardown_all(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        self.torn_down = true;

        let closed = self.calls.len();
        for (_, mut record) in self.calls.drain() {
            record.close();
        }

        if let Some(media) = self.media.take() {
            media.release();
        }

        if self.joined {
            self.joined = false;
            if let Err(e) = self
                .signaling
                .send(ClientEvent::leave(self.room.clone(), self.local.clone()))
            {
                error!(room = %self.room, "Failed to send leave-room: {}", e);
            }
        }

        info!(room = %self.room, closed, "Session torn down");
        closed
    }

    fn remove_matching(
        &mut self,
        peer: PeerId,
        connection_id: ConnectionId,
        reason: CloseReason,
    ) -> Option<CallUpdate> {
        let matches = self
            .calls
            .get(&peer)
            .is_some_and(|r| r.connection_id() == connection_id);
        if !matches {
            debug!(peer = %peer, %connection_id, "Stale close ignored");
            return None;
        }

        if let Some(mut record) = self.calls.remove(&peer) {
            record.close();
        }
        info!(peer = %peer, %connection_id, ?reason, "Call closed");
        Some(CallUpdate::Closed { peer, reason })
    }
}
