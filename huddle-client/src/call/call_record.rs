use crate::transport::{CallHandle, ConnectionId, RemoteMedia};
use huddle_core::PeerId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Dialing,
    Answering,
    Connected,
    Closed,
}

/// Bookkeeping for the single connection kept with one remote peer.
pub struct CallRecord {
    peer_id: PeerId,
    handle: Box<dyn CallHandle>,
    state: CallState,
    remote_media: Option<RemoteMedia>,
}

impl CallRecord {
    pub(crate) fn new(peer_id: PeerId, handle: Box<dyn CallHandle>, state: CallState) -> Self {
        Self {
            peer_id,
            handle,
            state,
            remote_media: None,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.handle.connection_id()
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn remote_media(&self) -> Option<&RemoteMedia> {
        self.remote_media.as_ref()
    }

    pub(crate) fn connect(&mut self, media: RemoteMedia) -> bool {
        let first = self.state != CallState::Connected;
        self.state = CallState::Connected;
        self.remote_media = Some(media);
        first
    }

    pub(crate) fn close(&mut self) {
        if self.state != CallState::Closed {
            self.state = CallState::Closed;
            self.handle.close();
        }
    }
}

impl fmt::Debug for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRecord")
            .field("peer_id", &self.peer_id)
            .field("connection_id", &self.connection_id())
            .field("state", &self.state)
            .finish()
    }
}
