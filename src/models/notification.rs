use serde::{Deserialize, Serialize};

use super::ViolationKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Warning,
    Final,
    Terminal,
}

impl Severity {
    /// Severity of the strike that brings the counter to `count`.
    pub fn for_count(count: u32, max_strikes: u32) -> Self {
        if count >= max_strikes {
            Severity::Terminal
        } else if count + 1 == max_strikes {
            Severity::Final
        } else {
            Severity::Warning
        }
    }
}

/// What the presentation layer renders: toasts for `Warning`/`Final`, a
/// blocking modal for `Terminal`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub severity: Severity,
    pub kind: ViolationKind,
    pub title: String,
    pub body: String,
    pub dismissible: bool,
    /// Always `None`: every strike has to be acknowledged by hand.
    pub auto_dismiss_after_ms: Option<u64>,
}

impl Notification {
    pub fn for_strike(kind: ViolationKind, message: &str, count: u32, max_strikes: u32) -> Self {
        let severity = Severity::for_count(count, max_strikes);
        let body = match severity {
            Severity::Terminal => "Your interview session has been terminated due to repeated \
                 proctoring violations."
                .to_string(),
            Severity::Final => format!(
                "{message} This is your final warning. One more violation will end your \
                 interview session."
            ),
            Severity::Warning => {
                let remaining = max_strikes.saturating_sub(count);
                let noun = if remaining == 1 { "warning" } else { "warnings" };
                format!("{message} You have {remaining} {noun} remaining.")
            }
        };

        Self {
            severity,
            kind,
            title: kind.title().to_string(),
            body,
            dismissible: severity != Severity::Terminal,
            auto_dismiss_after_ms: None,
        }
    }
}

/// Non-penalty feedback. Never touches the strike counter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProctorNotice {
    TabSwitchGrace,
    CopyBlocked,
    CutBlocked,
    PasteBlocked,
}

impl ProctorNotice {
    pub fn message(&self) -> &'static str {
        match self {
            ProctorNotice::TabSwitchGrace => {
                "Please stay on this tab. Further tab switches will count as violations."
            }
            ProctorNotice::CopyBlocked => "Copying is disabled during the interview.",
            ProctorNotice::CutBlocked => "Cutting is disabled during the interview.",
            ProctorNotice::PasteBlocked => "Pasting is disabled during the interview.",
        }
    }
}
