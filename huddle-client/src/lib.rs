//! Participant side of a huddle session.
//!
//! A [`SessionController`] owns local capture and reconciles it with the
//! presence stream coming from the relay; a [`CallOrchestrator`] keeps at
//! most one connection per remote peer on top of an external [`Transport`].

pub mod call;
pub mod config;
pub mod errors;
pub mod media;
pub mod session;
pub mod signaling;
pub mod transport;

pub use call::*;
pub use config::ClientConfig;
pub use errors::*;
pub use media::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;

pub use huddle_core::{ClientEvent, PeerId, RoomId, ServerEvent};
