use crate::errors::CaptureError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One locally captured track, provided by the capture backend.
pub trait MediaTrack: Send + Sync {
    fn kind(&self) -> TrackKind;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&self, enabled: bool);

    /// Stop capturing. Called at most once per track.
    fn stop(&self);
}

/// Capture backend (camera and microphone).
#[async_trait]
pub trait CaptureDevice: Send + Sync + 'static {
    async fn acquire(&self) -> Result<LocalMedia, CaptureError>;
}

/// The local capture resource.
///
/// Shared read-only by every call through an `Arc`; toggling enablement
/// never touches the calls. Released once, either explicitly or on drop.
pub struct LocalMedia {
    tracks: Vec<Arc<dyn MediaTrack>>,
    released: AtomicBool,
}

impl LocalMedia {
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            tracks,
            released: AtomicBool::new(false),
        }
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    /// Flip every track of `kind`. Returns the new state, or `None` when
    /// there is no such track.
    pub fn toggle(&self, kind: TrackKind) -> Option<bool> {
        let mut tracks = self.tracks.iter().filter(|t| t.kind() == kind).peekable();
        let enabled = !tracks.peek()?.is_enabled();
        for track in tracks {
            track.set_enabled(enabled);
        }
        Some(enabled)
    }

    pub fn is_enabled(&self, kind: TrackKind) -> Option<bool> {
        self.tracks
            .iter()
            .find(|t| t.kind() == kind)
            .map(|t| t.is_enabled())
    }

    /// Stops every track. Only the first call has an effect; returns whether
    /// this call was it.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        debug!(tracks = self.tracks.len(), "Releasing local capture");
        for track in &self.tracks {
            track.stop();
        }
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for LocalMedia {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for LocalMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMedia")
            .field("tracks", &self.tracks.len())
            .field("released", &self.is_released())
            .finish()
    }
}
