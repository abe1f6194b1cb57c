use crate::call::{CallOrchestrator, CallUpdate, CloseReason};
use crate::config::ClientConfig;
use crate::errors::{CallError, CaptureError};
use crate::media::{CaptureDevice, LocalMedia};
use crate::session::{
    CallSummary, CaptureStatus, SessionCommand, SessionEvent, SessionHandle, SessionSnapshot,
};
use crate::signaling::SignalingLink;
use crate::transport::{IncomingCall, Transport, TransportEvent};
use futures::future::OptionFuture;
use huddle_core::{ClientEvent, PeerId, RoomId, ServerEvent};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Everything a session is wired to.
pub struct SessionSetup {
    pub local: PeerId,
    pub room: RoomId,
    pub config: ClientConfig,
    pub capture: Arc<dyn CaptureDevice>,
    pub transport: Arc<dyn Transport>,
    pub transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    pub signaling: Arc<dyn SignalingLink>,
    pub hub_events: mpsc::Receiver<ServerEvent>,
}

enum Flow {
    Continue,
    Stop,
}

/// One participant's session.
///
/// Local capture and relay presence arrive in no particular order. Peers
/// announced before capture is ready are queued and dialed, in arrival
/// order, once it is; the room is joined only at that point.
pub struct SessionController {
    local: PeerId,
    room: RoomId,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    signaling: Arc<dyn SignalingLink>,
    orchestrator: CallOrchestrator,
    capture: CaptureStatus,
    pending: VecDeque<PeerId>,
    held: VecDeque<IncomingCall>,
    roster: BTreeSet<PeerId>,
    redials: HashMap<PeerId, u32>,
    events: mpsc::UnboundedSender<SessionEvent>,
    ended: bool,
}

impl SessionController {
    /// Start the session on its own task.
    pub fn spawn(setup: SessionSetup) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let SessionSetup {
            local,
            room,
            config,
            capture,
            transport,
            transport_events,
            signaling,
            hub_events,
        } = setup;

        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let controller = Self {
            orchestrator: CallOrchestrator::new(
                local.clone(),
                room.clone(),
                transport.clone(),
                signaling.clone(),
            ),
            local: local.clone(),
            room: room.clone(),
            config,
            transport,
            signaling,
            capture: CaptureStatus::Pending,
            pending: VecDeque::new(),
            held: VecDeque::new(),
            roster: BTreeSet::new(),
            redials: HashMap::new(),
            events: events_tx,
            ended: false,
        };

        tokio::spawn(controller.run(capture, command_rx, hub_events, transport_events));

        (SessionHandle::new(local, room, command_tx), events_rx)
    }

    async fn run(
        mut self,
        device: Arc<dyn CaptureDevice>,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut hub_events: mpsc::Receiver<ServerEvent>,
        mut transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        info!(room = %self.room, peer = %self.local, "Session started");

        let mut capture_task = Some(self.start_capture(device));
        let mut transport_open = true;

        loop {
            tokio::select! {
                Some(joined) = OptionFuture::from(capture_task.as_mut()), if capture_task.is_some() => {
                    capture_task = None;
                    let result = joined
                        .unwrap_or_else(|e| Err(CaptureError::Unavailable(e.to_string())));
                    if let Flow::Stop = self.on_capture(result) {
                        break;
                    }
                }

                event = hub_events.recv() => match event {
                    Some(event) => self.on_hub_event(event),
                    None => {
                        warn!(room = %self.room, "Relay connection lost, ending session");
                        break;
                    }
                },

                event = transport_events.recv(), if transport_open => match event {
                    Some(event) => self.on_transport_event(event),
                    None => {
                        warn!(room = %self.room, "Transport event stream closed");
                        transport_open = false;
                    }
                },

                command = commands.recv() => match command {
                    Some(command) => {
                        if let Flow::Stop = self.on_command(command) {
                            break;
                        }
                    }
                    None => {
                        info!(room = %self.room, "All session handles dropped");
                        break;
                    }
                },
            }
        }

        drop(commands);
        if let Some(task) = capture_task {
            debug!(room = %self.room, "Aborting pending capture");
            task.abort();
        }
        self.teardown();
        self.emit(SessionEvent::Ended);
        info!(room = %self.room, peer = %self.local, "Session ended");
    }

    fn start_capture(
        &self,
        device: Arc<dyn CaptureDevice>,
    ) -> JoinHandle<Result<LocalMedia, CaptureError>> {
        let timeout = self.config.capture_timeout;
        tokio::spawn(async move {
            tokio::time::timeout(timeout, device.acquire())
                .await
                .unwrap_or(Err(CaptureError::TimedOut))
        })
    }

    fn on_capture(&mut self, result: Result<LocalMedia, CaptureError>) -> Flow {
        let media = match result {
            Ok(media) => media,
            Err(e) => {
                error!(room = %self.room, "Capture failed: {}", e);
                self.capture = CaptureStatus::Failed(e.clone());
                self.emit(SessionEvent::CaptureFailed(e));
                return Flow::Stop;
            }
        };

        info!(room = %self.room, tracks = media.tracks().len(), "Capture ready");
        self.orchestrator.attach_media(Arc::new(media));
        self.capture = CaptureStatus::Ready;
        self.emit(SessionEvent::CaptureReady);

        if let Err(e) = self.orchestrator.join_room() {
            error!(room = %self.room, "Failed to send join-room: {}", e);
            return Flow::Stop;
        }

        if !self.pending.is_empty() {
            debug!(count = self.pending.len(), "Draining peers announced before capture");
        }
        while let Some(peer) = self.pending.pop_front() {
            self.dial(peer);
        }
        while let Some(call) = self.held.pop_front() {
            self.answer(call);
        }

        Flow::Continue
    }

    fn on_hub_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::UserConnected(peer) => {
                if peer == self.local {
                    return;
                }
                debug!(peer = %peer, "Peer present");
                self.roster.insert(peer.clone());

                match self.capture {
                    CaptureStatus::Ready => self.dial(peer),
                    CaptureStatus::Pending => {
                        if !self.pending.contains(&peer) {
                            debug!(peer = %peer, "Capture not ready, queueing peer");
                            self.pending.push_back(peer);
                        }
                    }
                    CaptureStatus::Failed(_) | CaptureStatus::Released => {}
                }
            }

            ServerEvent::UserDisconnected(peer) => {
                let listed = self.roster.remove(&peer);
                self.redials.remove(&peer);
                self.pending.retain(|p| *p != peer);

                let (dropped, kept): (Vec<_>, Vec<_>) =
                    self.held.drain(..).partition(|call| call.from == peer);
                self.held = kept.into();
                for call in dropped {
                    self.transport.reject(call);
                }

                let closed = self.orchestrator.notify_peer_absent(&peer);
                debug!(peer = %peer, listed, closed, "Peer absent");
                if listed || closed {
                    self.emit(SessionEvent::PeerDisconnected { peer });
                }
            }

            ServerEvent::CodeChanged(code) => self.emit(SessionEvent::CodeChanged(code)),
            ServerEvent::CodeOutput(output) => self.emit(SessionEvent::CodeOutput(output)),
        }
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        match self.capture {
            CaptureStatus::Ready => {}
            CaptureStatus::Pending => {
                if let TransportEvent::Incoming(call) = event {
                    debug!(peer = %call.from, "Capture not ready, holding incoming call");
                    self.held.push_back(call);
                }
                return;
            }
            CaptureStatus::Failed(_) | CaptureStatus::Released => {
                if let TransportEvent::Incoming(call) = event {
                    self.transport.reject(call);
                }
                return;
            }
        }

        match self.orchestrator.handle_transport_event(event) {
            Some(CallUpdate::Connected { peer, media }) => {
                self.redials.remove(&peer);
                self.emit(SessionEvent::PeerConnected { peer, media });
            }
            Some(CallUpdate::Closed { peer, reason }) => {
                self.emit(SessionEvent::CallEnded { peer: peer.clone() });
                if let CloseReason::Failed(_) = reason {
                    self.redial(peer);
                }
            }
            None => {}
        }
    }

    fn on_command(&mut self, command: SessionCommand) -> Flow {
        match command {
            SessionCommand::MuteAudio { reply } => {
                let _ = reply.send(self.orchestrator.mute_local_audio());
            }
            SessionCommand::MuteVideo { reply } => {
                let _ = reply.send(self.orchestrator.mute_local_video());
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::Leave { reply } => {
                let closed = self.teardown();
                let _ = reply.send(closed);
                return Flow::Stop;
            }
            SessionCommand::SendCode { code, reply } => {
                let _ = reply.send(self.signaling.send(ClientEvent::CodeChanged {
                    room_id: self.room.clone(),
                    code,
                }));
            }
            SessionCommand::SendOutput { output, reply } => {
                let _ = reply.send(self.signaling.send(ClientEvent::RunCode {
                    room_id: self.room.clone(),
                    output,
                }));
            }
        }
        Flow::Continue
    }

    fn dial(&mut self, peer: PeerId) {
        match self.orchestrator.notify_peer_present(peer.clone()) {
            Ok(_) => {}
            Err(CallError::Transport(e)) => {
                warn!(peer = %peer, "Dial failed: {}", e);
                self.redial(peer);
            }
            Err(e) => warn!(peer = %peer, "Dial not started: {}", e),
        }
    }

    fn answer(&mut self, call: IncomingCall) {
        let peer = call.from.clone();
        if let Err(e) = self.orchestrator.notify_incoming_call(call) {
            warn!(peer = %peer, "Incoming call not answered: {}", e);
        }
    }

    fn redial(&mut self, peer: PeerId) {
        if !self.roster.contains(&peer) {
            return;
        }

        let attempts = self.redials.entry(peer.clone()).or_insert(0);
        *attempts += 1;
        if *attempts > self.config.max_redial_attempts {
            warn!(peer = %peer, attempts = *attempts - 1, "Giving up on peer");
            return;
        }

        info!(peer = %peer, attempt = *attempts, "Redialing after call failure");
        self.dial(peer);
    }

    fn teardown(&mut self) -> usize {
        if self.ended {
            return 0;
        }
        self.ended = true;

        self.pending.clear();
        for call in self.held.drain(..) {
            self.transport.reject(call);
        }

        let closed = self.orchestrator.teardown_all();
        if self.capture == CaptureStatus::Ready {
            self.capture = CaptureStatus::Released;
        }
        closed
    }

    fn snapshot(&self) -> SessionSnapshot {
        let mut calls: Vec<CallSummary> = self
            .orchestrator
            .calls()
            .map(|record| CallSummary {
                peer: record.peer_id().clone(),
                connection_id: record.connection_id(),
                state: record.state(),
            })
            .collect();
        calls.sort_by(|a, b| a.peer.cmp(&b.peer));

        SessionSnapshot {
            capture: self.capture.clone(),
            calls,
            pending: self.pending.iter().cloned().collect(),
            held: self.held.iter().map(|call| call.from.clone()).collect(),
            roster: self.roster.iter().cloned().collect(),
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session event receiver dropped");
        }
    }
}
