use crate::errors::SignalingError;
use huddle_core::ClientEvent;

/// Outbound half of the relay connection.
///
/// Sending never waits on the network; frames are queued in order.
pub trait SignalingLink: Send + Sync {
    fn send(&self, event: ClientEvent) -> Result<(), SignalingError>;
}
