mod signaling_link;
mod ws_link;

pub use signaling_link::SignalingLink;
pub use ws_link::WsSignalingLink;
