use huddle_core::RoomId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The room actor kept retiring under us; the caller may try again.
    #[error("room {0} is unavailable")]
    RoomUnavailable(RoomId),
}

impl RegistryError {
    /// Whether the connection that hit this error can no longer be served.
    ///
    /// A client whose join failed would wait for presence that never comes;
    /// closing its socket lets it notice and start over.
    pub fn closes_connection(&self) -> bool {
        matches!(self, Self::RoomUnavailable(_))
    }
}
