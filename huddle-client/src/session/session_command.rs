use crate::errors::SignalingError;
use crate::session::SessionSnapshot;
use serde_json::Value;
use tokio::sync::oneshot;

#[derive(Debug)]
pub(crate) enum SessionCommand {
    MuteAudio {
        reply: oneshot::Sender<Option<bool>>,
    },
    MuteVideo {
        reply: oneshot::Sender<Option<bool>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Leave {
        reply: oneshot::Sender<usize>,
    },
    SendCode {
        code: Value,
        reply: oneshot::Sender<Result<(), SignalingError>>,
    },
    SendOutput {
        output: Value,
        reply: oneshot::Sender<Result<(), SignalingError>>,
    },
}
