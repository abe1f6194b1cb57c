use crate::errors::{SessionError, SignalingError};
use crate::session::{SessionCommand, SessionSnapshot};
use huddle_core::{PeerId, RoomId};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Cloneable front end of a running session.
///
/// The session tears itself down once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    local: PeerId,
    room: RoomId,
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(local: PeerId, room: RoomId, tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { local, room, tx }
    }

    pub fn local_peer(&self) -> &PeerId {
        &self.local
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn is_ended(&self) -> bool {
        self.tx.is_closed()
    }

    /// Toggle the microphone. `None` when there is no audio track (or no
    /// capture yet).
    pub async fn mute_audio(&self) -> Result<Option<bool>, SessionError> {
        self.request(|reply| SessionCommand::MuteAudio { reply })
            .await
    }

    pub async fn mute_video(&self) -> Result<Option<bool>, SessionError> {
        self.request(|reply| SessionCommand::MuteVideo { reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::Snapshot { reply })
            .await
    }

    /// Close every call, release capture and leave the room. Returns the
    /// number of calls closed; leaving an ended session returns 0.
    pub async fn leave(&self) -> Result<usize, SessionError> {
        match self.request(|reply| SessionCommand::Leave { reply }).await {
            Err(SessionError::Ended) => Ok(0),
            other => other,
        }
    }

    /// Relay editor content to the rest of the room.
    pub async fn send_code(&self, code: Value) -> Result<(), SessionError> {
        let sent: Result<(), SignalingError> = self
            .request(|reply| SessionCommand::SendCode { code, reply })
            .await?;
        Ok(sent?)
    }

    /// Relay an execution result to the rest of the room.
    pub async fn send_output(&self, output: Value) -> Result<(), SessionError> {
        let sent: Result<(), SignalingError> = self
            .request(|reply| SessionCommand::SendOutput { output, reply })
            .await?;
        Ok(sent?)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Ended)?;
        rx.await.map_err(|_| SessionError::Ended)
    }
}
