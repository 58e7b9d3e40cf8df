use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::frame::FrameAnalysis;

/// A live video frame source with a face detector behind it.
///
/// The detector is an owned resource of the implementation: it is loaded in
/// `ensure_ready` (which must be cheap once it has succeeded) and released
/// in `teardown`.
#[async_trait]
pub trait FrameSource: Send {
    async fn ensure_ready(&mut self) -> Result<()>;

    /// Sample and analyse the current frame.
    async fn analyze_frame(&mut self) -> Result<FrameAnalysis>;

    async fn teardown(&mut self) {}
}

/// What a scripted source reports from a point in time onwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FrameScript {
    Frame(FrameAnalysis),
    DetectorError { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimedFrame {
    pub from_ms: u64,
    pub script: FrameScript,
}

/// Plays back a timeline of frame analyses relative to the moment the source
/// became ready. Drives the replay binary and the monitor tests.
pub struct TimelineFrameSource {
    timeline: Vec<TimedFrame>,
    ready_at: Option<Instant>,
    fail_ready: bool,
    teardowns: Arc<AtomicU32>,
}

impl TimelineFrameSource {
    pub fn new(mut timeline: Vec<TimedFrame>) -> Self {
        timeline.sort_by_key(|entry| entry.from_ms);
        Self {
            timeline,
            ready_at: None,
            fail_ready: false,
            teardowns: Arc::new(AtomicU32::new(0)),
        }
    }

    /// A source whose detector never loads.
    pub fn unavailable() -> Self {
        Self {
            fail_ready: true,
            ..Self::new(Vec::new())
        }
    }

    /// Shared count of `teardown` calls; stays readable after the source has
    /// been boxed and handed to a sampling loop.
    pub fn teardown_counter(&self) -> Arc<AtomicU32> {
        self.teardowns.clone()
    }

    fn script_at(&self, elapsed: Duration) -> Option<&FrameScript> {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.timeline
            .iter()
            .take_while(|entry| entry.from_ms <= elapsed_ms)
            .last()
            .map(|entry| &entry.script)
    }
}

#[async_trait]
impl FrameSource for TimelineFrameSource {
    async fn ensure_ready(&mut self) -> Result<()> {
        if self.fail_ready {
            bail!("face detector failed to load");
        }
        if self.ready_at.is_none() {
            self.ready_at = Some(Instant::now());
        }
        Ok(())
    }

    async fn analyze_frame(&mut self) -> Result<FrameAnalysis> {
        let ready_at = self
            .ready_at
            .ok_or_else(|| anyhow!("frame source used before ensure_ready"))?;

        match self.script_at(ready_at.elapsed()) {
            None => Ok(FrameAnalysis::empty()),
            Some(FrameScript::Frame(analysis)) => Ok(analysis.clone()),
            Some(FrameScript::DetectorError { reason }) => Err(anyhow!("{reason}")),
        }
    }

    async fn teardown(&mut self) {
        self.ready_at = None;
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}
