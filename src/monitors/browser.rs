use std::time::Duration;
use tokio::time::Instant;

use super::{clipboard::ClipboardGuard, DetectedViolation, MonitorSignal};
use crate::config::ProctorConfig;
use crate::detection::{BrowserEvent, EventDisposition, Platform};
use crate::models::{ProctorNotice, ViolationKind};
use crate::tracker::ViolationTracker;

const TAB_SWITCH_MESSAGE: &str = "You switched away from the interview tab.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOutcome {
    pub disposition: EventDisposition,
    pub signal: Option<MonitorSignal>,
}

impl BrowserOutcome {
    fn allow() -> Self {
        Self {
            disposition: EventDisposition::Allow,
            signal: None,
        }
    }
}

/// Tab visibility and clipboard policy for one active session.
///
/// The first hide is a grace event (notice only); every later hide is a
/// `tab-switch` violation, cooldown-gated by the tracker. Clipboard actions
/// are always blocked and never penalised.
pub struct BrowserMonitor {
    tracker: ViolationTracker,
    clipboard: ClipboardGuard,
    grace_enabled: bool,
    grace_consumed: bool,
}

impl BrowserMonitor {
    pub fn new(config: &ProctorConfig, platform: Platform) -> Self {
        Self {
            tracker: ViolationTracker::new(config.cooldown()),
            clipboard: ClipboardGuard::new(platform),
            grace_enabled: config.tab_switch_grace,
            grace_consumed: false,
        }
    }

    pub fn grace_consumed(&self) -> bool {
        self.grace_consumed
    }

    pub fn handle_event(&mut self, event: &BrowserEvent, now: Instant) -> BrowserOutcome {
        match event {
            BrowserEvent::VisibilityChanged { hidden: true } => BrowserOutcome {
                disposition: EventDisposition::Allow,
                signal: self.on_hidden(now),
            },
            BrowserEvent::VisibilityChanged { hidden: false } => {
                self.tracker.reset_timing(ViolationKind::TabSwitch);
                BrowserOutcome::allow()
            }
            BrowserEvent::Clipboard { .. } | BrowserEvent::KeyDown { .. } => {
                match self.clipboard.intercept(event) {
                    Some(notice) => BrowserOutcome {
                        disposition: EventDisposition::PreventDefault,
                        signal: Some(MonitorSignal::Notice(notice)),
                    },
                    None => BrowserOutcome::allow(),
                }
            }
        }
    }

    fn on_hidden(&mut self, now: Instant) -> Option<MonitorSignal> {
        if self.grace_enabled && !self.grace_consumed {
            self.grace_consumed = true;
            return Some(MonitorSignal::Notice(ProctorNotice::TabSwitchGrace));
        }

        // Fires on the transition itself, so the sustain threshold is zero.
        self.tracker
            .observe(ViolationKind::TabSwitch, true, Duration::ZERO, now)
            .then(|| {
                MonitorSignal::Violation(DetectedViolation::new(
                    ViolationKind::TabSwitch,
                    TAB_SWITCH_MESSAGE,
                ))
            })
    }

    /// Restores the one-time grace and clears the cooldown.
    pub fn reset(&mut self) {
        self.tracker.reset_all();
        self.grace_consumed = false;
    }
}
