use crate::room::RoomRegistry;
use crate::signaling::{SignalingService, ws_handler};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use huddle_core::{PeerId, RoomId};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared state behind every route.
pub struct AppState {
    pub signaling: SignalingService,
    pub registry: RoomRegistry,
}

impl AppState {
    pub fn new(room_mailbox: usize) -> Self {
        let signaling = SignalingService::new();
        let registry = RoomRegistry::with_mailbox(Arc::new(signaling.clone()), room_mailbox);
        Self {
            signaling,
            registry,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/rooms", get(list_rooms))
        .route("/rooms/{room_id}", get(room_snapshot))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomId>> {
    Json(state.registry.rooms())
}

async fn room_snapshot(
    Path(room_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PeerId>>, StatusCode> {
    let room_id = RoomId::from(room_id);
    state.registry.snapshot(&room_id).await.map(Json).map_err(|e| {
        error!(room = %room_id, "Snapshot failed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })
}
