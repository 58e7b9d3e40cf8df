//! Signal monitors. Each one turns raw detections into `MonitorSignal`s and
//! knows nothing about strikes.

pub mod browser;
pub mod clipboard;
pub mod face;
pub mod face_loop;

use tokio::sync::mpsc;

use crate::models::{ProctorNotice, ViolationKind};

pub use browser::{BrowserMonitor, BrowserOutcome};
pub use clipboard::ClipboardGuard;
pub use face::FaceMonitor;
pub use face_loop::face_monitor_loop;

/// A debounced condition that fired, before the ledger has seen it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedViolation {
    pub kind: ViolationKind,
    pub message: String,
}

impl DetectedViolation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorSignal {
    Violation(DetectedViolation),
    Notice(ProctorNotice),
}

pub type SignalSender = mpsc::UnboundedSender<MonitorSignal>;
pub type SignalReceiver = mpsc::UnboundedReceiver<MonitorSignal>;
