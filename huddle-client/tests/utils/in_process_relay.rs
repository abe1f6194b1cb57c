use async_trait::async_trait;
use huddle_client::{SignalingError, SignalingLink};
use huddle_core::{ClientEvent, ServerEvent};
use huddle_server::{ConnectionId, ConnectionSession, Inbound, RoomRegistry, SignalingOutput};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const HUB_CAPACITY: usize = 256;

#[derive(Default)]
struct Routes {
    by_connection: Mutex<HashMap<ConnectionId, mpsc::Sender<ServerEvent>>>,
}

#[async_trait]
impl SignalingOutput for Routes {
    async fn deliver(&self, connection: ConnectionId, event: ServerEvent) {
        let tx = self.by_connection.lock().unwrap().get(&connection).cloned();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }
}

/// The real relay state machine without the socket: each `connect` gets its
/// own `ConnectionSession` driven from a task, exactly like a WebSocket
/// would drive it.
pub struct InProcessRelay {
    registry: RoomRegistry,
    routes: Arc<Routes>,
}

impl InProcessRelay {
    pub fn new() -> Self {
        let routes = Arc::new(Routes::default());
        Self {
            registry: RoomRegistry::new(routes.clone()),
            routes,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn connect(&self) -> (Arc<RelayLink>, mpsc::Receiver<ServerEvent>) {
        let connection = ConnectionId::new();
        let (hub_tx, hub_rx) = mpsc::channel(HUB_CAPACITY);
        self.routes
            .by_connection
            .lock()
            .unwrap()
            .insert(connection, hub_tx);

        let (tx, mut rx) = mpsc::unbounded_channel::<ClientEvent>();
        let mut session = ConnectionSession::new(connection, self.registry.clone());
        let routes = self.routes.clone();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = session.handle(Inbound::Event(event)).await {
                    tracing::warn!("[InProcessRelay] {}", e);
                }
            }
            let _ = session.handle(Inbound::TransportClosed).await;
            routes.by_connection.lock().unwrap().remove(&connection);
        });

        (Arc::new(RelayLink { tx }), hub_rx)
    }
}

/// Client end of an in-process relay connection. Dropping it closes the
/// connection.
pub struct RelayLink {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl SignalingLink for RelayLink {
    fn send(&self, event: ClientEvent) -> Result<(), SignalingError> {
        self.tx.send(event).map_err(|_| SignalingError::Closed)
    }
}
