mod connection_id;
mod connection_session;
mod signaling_output;
mod signaling_service;
mod ws_handler;

pub use connection_id::ConnectionId;
pub use connection_session::{ConnectionSession, ConnectionState, Inbound};
pub use signaling_output::SignalingOutput;
pub use signaling_service::SignalingService;
pub use ws_handler::ws_handler;
