use crate::errors::SignalingError;
use crate::signaling::SignalingLink;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Capacity of the inbound relay event queue.
const INBOUND_CAPACITY: usize = 256;

/// WebSocket connection to the relay.
///
/// Dropping the link closes the socket once queued frames are flushed.
pub struct WsSignalingLink {
    tx: mpsc::UnboundedSender<Message>,
}

impl WsSignalingLink {
    /// Connect to `url` (e.g. `ws://host:3000/ws`). Returns the link and the
    /// stream of relay events; the stream ends when the socket does.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<ServerEvent>), SignalingError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| SignalingError::Connect(e.to_string()))?;
        info!(%url, "Connected to relay");

        let (mut sink, mut stream) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let (events_tx, events_rx) = mpsc::channel(INBOUND_CAPACITY);

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("Relay writer finished");
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => match ServerEvent::decode(text.as_str()) {
                        Ok(event) => {
                            if events_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid ServerEvent from relay: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Relay connection closed");
        });

        Ok((Self { tx }, events_rx))
    }
}

impl SignalingLink for WsSignalingLink {
    fn send(&self, event: ClientEvent) -> Result<(), SignalingError> {
        let json = event.encode()?;
        self.tx
            .send(Message::text(json))
            .map_err(|_| SignalingError::Closed)
    }
}
