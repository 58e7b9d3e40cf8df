use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Hardware state of the camera track, as the media pipeline reports it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackState {
    pub live: bool,
    pub enabled: bool,
    pub muted: bool,
}

impl TrackState {
    pub const LIVE: TrackState = TrackState {
        live: true,
        enabled: true,
        muted: false,
    };

    pub const ENDED: TrackState = TrackState {
        live: false,
        enabled: false,
        muted: false,
    };

    /// Live, enabled and delivering frames.
    pub fn is_active(&self) -> bool {
        self.live && self.enabled && !self.muted
    }
}

impl Default for TrackState {
    fn default() -> Self {
        TrackState::LIVE
    }
}

/// Writer half, held by the media pipeline. Monitors only ever read through
/// `subscribe`.
#[derive(Clone)]
pub struct CameraTrack {
    tx: watch::Sender<TrackState>,
}

impl CameraTrack {
    pub fn new(initial: TrackState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn status(&self) -> TrackState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackState> {
        self.tx.subscribe()
    }

    pub fn set(&self, state: TrackState) {
        self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    /// The track's `ended` event.
    pub fn end(&self) {
        self.set(TrackState::ENDED);
    }

    pub fn set_muted(&self, muted: bool) {
        self.set(TrackState {
            muted,
            ..self.status()
        });
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.set(TrackState {
            enabled,
            ..self.status()
        });
    }
}

impl Default for CameraTrack {
    fn default() -> Self {
        Self::new(TrackState::LIVE)
    }
}
