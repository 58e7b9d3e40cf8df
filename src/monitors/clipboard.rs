use crate::detection::{BrowserEvent, ClipboardAction, KeyChord, Platform};
use crate::models::ProctorNotice;

/// Blocks copy, cut and paste. Blocking is feedback only: an accidental key
/// chord never costs a strike, and the action is already neutralised.
#[derive(Debug, Clone, Copy)]
pub struct ClipboardGuard {
    platform: Platform,
}

impl ClipboardGuard {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// The clipboard action `event` would perform, if any.
    pub fn classify(&self, event: &BrowserEvent) -> Option<ClipboardAction> {
        match event {
            BrowserEvent::Clipboard { action } => Some(*action),
            BrowserEvent::KeyDown { chord } => self.classify_chord(chord),
            BrowserEvent::VisibilityChanged { .. } => None,
        }
    }

    /// Returns the notice to show when `event` had to be blocked.
    pub fn intercept(&self, event: &BrowserEvent) -> Option<ProctorNotice> {
        self.classify(event).map(notice_for)
    }

    fn classify_chord(&self, chord: &KeyChord) -> Option<ClipboardAction> {
        let primary = match self.platform {
            Platform::MacOs => chord.meta,
            Platform::Other => chord.ctrl,
        };
        let key = chord.key.to_ascii_lowercase();

        if primary && !chord.alt {
            match key.as_str() {
                "c" => return Some(ClipboardAction::Copy),
                "x" => return Some(ClipboardAction::Cut),
                "v" => return Some(ClipboardAction::Paste),
                _ => {}
            }
        }

        // Legacy Insert/Delete shortcuts only exist off macOS.
        if self.platform == Platform::Other {
            match key.as_str() {
                "insert" if chord.ctrl && !chord.shift => return Some(ClipboardAction::Copy),
                "insert" if chord.shift && !chord.ctrl => return Some(ClipboardAction::Paste),
                "delete" if chord.shift && !chord.ctrl => return Some(ClipboardAction::Cut),
                _ => {}
            }
        }

        None
    }
}

pub fn notice_for(action: ClipboardAction) -> ProctorNotice {
    match action {
        ClipboardAction::Copy => ProctorNotice::CopyBlocked,
        ClipboardAction::Cut => ProctorNotice::CutBlocked,
        ClipboardAction::Paste => ProctorNotice::PasteBlocked,
    }
}
