mod session_command;
mod session_controller;
mod session_event;
mod session_handle;

pub(crate) use session_command::SessionCommand;
pub use session_controller::{SessionController, SessionSetup};
pub use session_event::{CallSummary, CaptureStatus, SessionEvent, SessionSnapshot};
pub use session_handle::SessionHandle;
