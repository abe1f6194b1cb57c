use huddle_client::{
    CallHandle, ConnectionId, IncomingCall, LocalMedia, RemoteMedia, Transport, TransportError,
    TransportEvent,
};
use huddle_core::PeerId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct DialRecord {
    pub from: PeerId,
    pub to: PeerId,
    pub connection_id: ConnectionId,
    pub at: Instant,
}

struct Link {
    caller: PeerId,
    callee: PeerId,
    open: bool,
    answered: bool,
}

#[derive(Default)]
struct NetworkState {
    endpoints: HashMap<PeerId, mpsc::UnboundedSender<TransportEvent>>,
    links: HashMap<ConnectionId, Link>,
    dials: Vec<DialRecord>,
    unreachable: HashSet<PeerId>,
    refuse_next: usize,
    refused: Vec<(PeerId, PeerId)>,
}

impl NetworkState {
    fn notify(&self, peer: &PeerId, event: TransportEvent) {
        if let Some(tx) = self.endpoints.get(peer) {
            let _ = tx.send(event);
        }
    }
}

/// In-memory transport fabric. Every endpoint gets its own event channel;
/// dialing, answering and hanging up produce the events a real transport
/// would, in FIFO order per endpoint.
#[derive(Clone, Default)]
pub struct LoopbackNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(
        &self,
        peer: &PeerId,
    ) -> (Arc<LoopbackTransport>, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .lock()
            .unwrap()
            .endpoints
            .insert(peer.clone(), tx);

        let transport = Arc::new(LoopbackTransport {
            local: peer.clone(),
            network: self.clone(),
        });
        (transport, rx)
    }

    pub fn dials(&self) -> Vec<DialRecord> {
        self.state.lock().unwrap().dials.clone()
    }

    pub fn dials_from(&self, peer: &PeerId) -> Vec<DialRecord> {
        self.dials().into_iter().filter(|d| d.from == *peer).collect()
    }

    /// Answered links still open, as (caller, callee, connection).
    pub fn open_links(&self) -> Vec<(PeerId, PeerId, ConnectionId)> {
        self.state
            .lock()
            .unwrap()
            .links
            .iter()
            .filter(|(_, link)| link.open && link.answered)
            .map(|(id, link)| (link.caller.clone(), link.callee.clone(), *id))
            .collect()
    }

    /// Dials towards `peer` fail immediately.
    pub fn set_unreachable(&self, peer: &PeerId, unreachable: bool) {
        let mut state = self.state.lock().unwrap();
        if unreachable {
            state.unreachable.insert(peer.clone());
        } else {
            state.unreachable.remove(peer);
        }
    }

    /// The next `count` dials fail synchronously, before any connection
    /// exists.
    pub fn refuse_next_dials(&self, count: usize) {
        self.state.lock().unwrap().refuse_next = count;
    }

    /// Dials refused synchronously, as (from, to).
    pub fn refused_dials(&self) -> Vec<(PeerId, PeerId)> {
        self.state.lock().unwrap().refused.clone()
    }

    fn try_refuse(&self, from: &PeerId, to: &PeerId) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.refuse_next == 0 {
            return false;
        }
        state.refuse_next -= 1;
        state.refused.push((from.clone(), to.clone()));
        true
    }

    /// Break every open link between `a` and `b`; both ends see an error.
    pub fn fail_between(&self, a: &PeerId, b: &PeerId, reason: &str) -> usize {
        let mut state = self.state.lock().unwrap();
        let broken: Vec<(ConnectionId, PeerId, PeerId)> = state
            .links
            .iter_mut()
            .filter(|(_, l)| {
                l.open && ((l.caller == *a && l.callee == *b) || (l.caller == *b && l.callee == *a))
            })
            .map(|(id, l)| {
                l.open = false;
                (*id, l.caller.clone(), l.callee.clone())
            })
            .collect();

        for (connection_id, caller, callee) in &broken {
            state.notify(
                caller,
                TransportEvent::Error {
                    peer: callee.clone(),
                    connection_id: *connection_id,
                    reason: reason.to_owned(),
                },
            );
            state.notify(
                callee,
                TransportEvent::Error {
                    peer: caller.clone(),
                    connection_id: *connection_id,
                    reason: reason.to_owned(),
                },
            );
        }
        broken.len()
    }

    fn dial(&self, from: &PeerId, to: &PeerId) -> ConnectionId {
        let connection_id = ConnectionId::new();
        let mut state = self.state.lock().unwrap();

        state.dials.push(DialRecord {
            from: from.clone(),
            to: to.clone(),
            connection_id,
            at: Instant::now(),
        });

        let reachable = state.endpoints.contains_key(to) && !state.unreachable.contains(to);
        state.links.insert(
            connection_id,
            Link {
                caller: from.clone(),
                callee: to.clone(),
                open: reachable,
                answered: false,
            },
        );

        if reachable {
            state.notify(
                to,
                TransportEvent::Incoming(IncomingCall {
                    from: from.clone(),
                    connection_id,
                }),
            );
        } else {
            state.notify(
                from,
                TransportEvent::Error {
                    peer: to.clone(),
                    connection_id,
                    reason: "unreachable".into(),
                },
            );
        }
        connection_id
    }

    fn answer(&self, connection_id: ConnectionId) {
        let mut state = self.state.lock().unwrap();
        let Some(link) = state.links.get_mut(&connection_id) else {
            return;
        };
        if !link.open {
            return;
        }
        link.answered = true;
        let (caller, callee) = (link.caller.clone(), link.callee.clone());

        state.notify(
            &caller,
            TransportEvent::RemoteMedia {
                peer: callee.clone(),
                connection_id,
                media: RemoteMedia {
                    stream_id: format!("{}-stream", callee),
                },
            },
        );
        state.notify(
            &callee,
            TransportEvent::RemoteMedia {
                peer: caller.clone(),
                connection_id,
                media: RemoteMedia {
                    stream_id: format!("{}-stream", caller),
                },
            },
        );
    }

    /// Close `connection_id` from `side`'s end; the other end sees `Closed`.
    fn hang_up(&self, side: &PeerId, connection_id: ConnectionId) {
        let mut state = self.state.lock().unwrap();
        let Some(link) = state.links.get_mut(&connection_id) else {
            return;
        };
        if !link.open {
            return;
        }
        link.open = false;
        let other = if link.caller == *side {
            link.callee.clone()
        } else {
            link.caller.clone()
        };

        state.notify(
            &other,
            TransportEvent::Closed {
                peer: side.clone(),
                connection_id,
            },
        );
    }
}

pub struct LoopbackTransport {
    local: PeerId,
    network: LoopbackNetwork,
}

struct LoopbackHandle {
    local: PeerId,
    connection_id: ConnectionId,
    network: LoopbackNetwork,
}

impl CallHandle for LoopbackHandle {
    fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    fn close(&self) {
        self.network.hang_up(&self.local, self.connection_id);
    }
}

impl Transport for LoopbackTransport {
    fn dial(
        &self,
        remote: &PeerId,
        _media: Arc<LocalMedia>,
    ) -> Result<Box<dyn CallHandle>, TransportError> {
        if self.network.try_refuse(&self.local, remote) {
            return Err(TransportError::Unreachable {
                peer: remote.clone(),
                reason: "no route".into(),
            });
        }
        let connection_id = self.network.dial(&self.local, remote);
        Ok(Box::new(LoopbackHandle {
            local: self.local.clone(),
            connection_id,
            network: self.network.clone(),
        }))
    }

    fn answer(
        &self,
        incoming: IncomingCall,
        _media: Arc<LocalMedia>,
    ) -> Result<Box<dyn CallHandle>, TransportError> {
        self.network.answer(incoming.connection_id);
        Ok(Box::new(LoopbackHandle {
            local: self.local.clone(),
            connection_id: incoming.connection_id,
            network: self.network.clone(),
        }))
    }

    fn reject(&self, incoming: IncomingCall) {
        self.network.hang_up(&self.local, incoming.connection_id);
    }
}
