//! Per-signal debounce and cooldown gating.
//!
//! A `ViolationTracker` turns a boolean condition sampled over time into a
//! "should this fire now" decision for each `ViolationKind`. It knows nothing
//! about policy: callers pass the sustain threshold on every call, the
//! tracker only owns the cooldown.

use std::time::Duration;
use tokio::time::Instant;

use crate::models::ViolationKind;

#[derive(Debug, Clone, Copy, Default)]
struct TrackerEntry {
    /// Set while the condition has held continuously since this instant.
    start_time: Option<Instant>,
    last_fired_time: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct ViolationTracker {
    entries: [TrackerEntry; ViolationKind::COUNT],
    cooldown: Duration,
}

impl ViolationTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            entries: [TrackerEntry::default(); ViolationKind::COUNT],
            cooldown,
        }
    }

    /// Record `now` as the start of the condition unless it is already being
    /// timed.
    pub fn start_timing(&mut self, kind: ViolationKind, now: Instant) {
        let entry = &mut self.entries[kind.index()];
        if entry.start_time.is_none() {
            entry.start_time = Some(now);
        }
    }

    /// The condition is no longer true; drop the accumulated duration.
    pub fn reset_timing(&mut self, kind: ViolationKind) {
        self.entries[kind.index()].start_time = None;
    }

    pub fn is_timing(&self, kind: ViolationKind) -> bool {
        self.entries[kind.index()].start_time.is_some()
    }

    pub fn duration(&self, kind: ViolationKind, now: Instant) -> Duration {
        self.entries[kind.index()]
            .start_time
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO)
    }

    /// True when the condition has been sustained for `threshold` and the
    /// cooldown since the last firing of `kind` has elapsed.
    pub fn should_fire(&self, kind: ViolationKind, threshold: Duration, now: Instant) -> bool {
        let entry = &self.entries[kind.index()];
        let Some(start) = entry.start_time else {
            return false;
        };

        if now.saturating_duration_since(start) < threshold {
            return false;
        }

        entry
            .last_fired_time
            .map(|fired| now.saturating_duration_since(fired) >= self.cooldown)
            .unwrap_or(true)
    }

    /// Leaves `start_time` alone so a sustained condition can fire again once
    /// the cooldown has passed.
    pub fn mark_fired(&mut self, kind: ViolationKind, now: Instant) {
        self.entries[kind.index()].last_fired_time = Some(now);
    }

    pub fn reset_all(&mut self) {
        self.entries = [TrackerEntry::default(); ViolationKind::COUNT];
    }

    /// Convenience for the common per-tick shape: time the condition while it
    /// holds, reset it otherwise, and report whether it fires this tick.
    /// Marks the kind as fired when it does.
    pub fn observe(
        &mut self,
        kind: ViolationKind,
        condition: bool,
        threshold: Duration,
        now: Instant,
    ) -> bool {
        if !condition {
            self.reset_timing(kind);
            return false;
        }

        self.start_timing(kind, now);
        if self.should_fire(kind, threshold, now) {
            self.mark_fired(kind, now);
            true
        } else {
            false
        }
    }
}
