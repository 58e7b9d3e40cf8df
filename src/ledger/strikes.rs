use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::state::LedgerState;
use crate::models::{Notification, Severity, Violation};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "strike_ledger";

use crate::{log_error, log_info, log_warn};

pub type TerminationCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub state: LedgerState,
    pub strike_count: u32,
    pub max_strikes: u32,
    pub notification: Option<Notification>,
    pub violation_count: usize,
    pub termination_pending: bool,
}

/// The strike counter, the append-only violation log and the current
/// notification. Nothing else mutates them.
pub struct StrikeLedger {
    state: LedgerState,
    max_strikes: u32,
    violations: Vec<Violation>,
    notification: Option<Notification>,
    termination_delay: Duration,
    on_terminate: Option<TerminationCallback>,
    termination_timer: Option<JoinHandle<()>>,
}

impl StrikeLedger {
    /// `max_strikes` is clamped to at least one.
    pub fn new(max_strikes: u32, termination_delay: Duration) -> Self {
        Self {
            state: LedgerState::default(),
            max_strikes: max_strikes.max(1),
            violations: Vec::new(),
            notification: None,
            termination_delay,
            on_terminate: None,
            termination_timer: None,
        }
    }

    pub fn with_termination_callback(mut self, callback: TerminationCallback) -> Self {
        self.on_terminate = Some(callback);
        self
    }

    pub fn state(&self) -> LedgerState {
        self.state
    }

    pub fn max_strikes(&self) -> u32 {
        self.max_strikes
    }

    pub fn strike_count(&self) -> u32 {
        match self.state {
            LedgerState::Active { strikes } => strikes,
            LedgerState::Terminated => self.max_strikes,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }

    /// Accepted violations in arrival order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Severity of the most recent strike, if any.
    pub fn last_severity(&self) -> Option<Severity> {
        self.violations
            .last()
            .map(|_| Severity::for_count(self.strike_count(), self.max_strikes))
    }

    pub fn termination_pending(&self) -> bool {
        self.termination_timer
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Accept one violation: log it, advance the counter and replace the
    /// notification in a single step. Returns `None` once terminated.
    ///
    /// Reaching the last strike schedules the termination callback after the
    /// termination delay; this needs to run inside a Tokio runtime.
    pub fn add_strike(&mut self, violation: Violation) -> Option<&Notification> {
        if self.is_terminated() {
            log_warn!(
                "ignoring {} after termination",
                violation.kind.as_str()
            );
            return None;
        }

        self.state = self.state.advance(self.max_strikes);
        let count = self.strike_count();
        let notification =
            Notification::for_strike(violation.kind, &violation.message, count, self.max_strikes);

        log_info!(
            "strike {}/{} ({:?}) for {}: {}",
            count,
            self.max_strikes,
            notification.severity,
            violation.kind.as_str(),
            violation.message
        );

        self.violations.push(violation);
        self.notification = Some(notification);

        if self.is_terminated() {
            self.schedule_termination();
        }

        self.notification.as_ref()
    }

    /// Terminal notifications stay put; returns whether anything was cleared.
    pub fn dismiss_notification(&mut self) -> bool {
        let dismissible = self
            .notification
            .as_ref()
            .is_some_and(|notification| notification.dismissible);
        if dismissible {
            self.notification = None;
        }
        dismissible
    }

    /// Back to `Active(0)` with an empty log, cancelling any pending
    /// termination.
    pub fn reset(&mut self) {
        self.cancel_termination();
        self.state = LedgerState::default();
        self.violations.clear();
        self.notification = None;
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            state: self.state,
            strike_count: self.strike_count(),
            max_strikes: self.max_strikes,
            notification: self.notification.clone(),
            violation_count: self.violations.len(),
            termination_pending: self.termination_pending(),
        }
    }

    fn schedule_termination(&mut self) {
        if self.termination_timer.is_some() {
            return;
        }
        let Some(callback) = self.on_terminate.clone() else {
            return;
        };

        let delay = self.termination_delay;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                self.termination_timer = Some(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    log_info!("terminating session");
                    callback();
                }));
            }
            Err(_) => {
                log_error!("no async runtime to delay termination; terminating immediately");
                callback();
            }
        }
    }

    fn cancel_termination(&mut self) {
        if let Some(handle) = self.termination_timer.take() {
            if !handle.is_finished() {
                log_info!("cancelling pending termination");
            }
            handle.abort();
        }
    }
}

impl Drop for StrikeLedger {
    fn drop(&mut self) {
        self.cancel_termination();
    }
}
