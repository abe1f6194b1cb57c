use crate::http::AppState;
use crate::signaling::{ConnectionId, ConnectionSession, Inbound};
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::ClientEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection = ConnectionId::new();
    info!(%connection, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.add_connection(connection, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut session = ConnectionSession::new(connection, state.registry.clone());

    loop {
        tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => match ClientEvent::decode(text.as_str()) {
                    Ok(event) => match session.handle(Inbound::Event(event)).await {
                        Ok(()) => {}
                        Err(e) if e.closes_connection() => {
                            error!(%connection, "Closing connection: {}", e);
                            break;
                        }
                        Err(e) => error!(%connection, "Failed to handle client event: {}", e),
                    },
                    Err(e) => warn!(%connection, "Invalid ClientEvent: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!(%connection, "WebSocket receive error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },

            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    state.signaling.remove_connection(&connection);

    if let Err(e) = session.handle(Inbound::TransportClosed).await {
        error!(%connection, "Cleanup after disconnect failed: {}", e);
    }
    info!(%connection, "WebSocket disconnected");
}
