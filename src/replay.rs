//! Scripted sessions: a JSON scenario drives a `ProctorController` with a
//! timeline frame source and timed browser/camera steps.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::Instant;

use crate::config::ProctorConfig;
use crate::detection::{BrowserEvent, CameraTrack, Platform, TimedFrame, TimelineFrameSource, TrackState};
use crate::models::{ProctorNotice, ViolationKind};
use crate::proctor::{ProctorController, ProctorSnapshot};
use crate::sink::ViolationSink;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "replay";

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScenarioAction {
    Activate,
    Deactivate,
    Browser { event: BrowserEvent },
    Camera { state: TrackState },
    Violation { kind: ViolationKind, message: String },
    Dismiss,
    Reset,
    BeginQuestion,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStep {
    pub at_ms: u64,
    pub action: ScenarioAction,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    pub session_id: Option<String>,
    /// Falls back to the caller's config when absent.
    pub config: Option<ProctorConfig>,
    pub platform: Option<Platform>,
    pub frames: Vec<TimedFrame>,
    pub steps: Vec<ScenarioStep>,
    /// Keep running until this offset even after the last step.
    pub end_ms: u64,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayViolation {
    pub kind: ViolationKind,
    pub message: String,
    pub offset_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub snapshot: ProctorSnapshot,
    pub violations: Vec<ReplayViolation>,
    pub notices: Vec<ProctorNotice>,
    pub terminated_at_ms: Option<u64>,
}

fn offset_ms(started: Instant, at: Instant) -> u64 {
    u64::try_from(at.saturating_duration_since(started).as_millis()).unwrap_or(u64::MAX)
}

fn drain_notices(notices: &mut broadcast::Receiver<ProctorNotice>, into: &mut Vec<ProctorNotice>) {
    loop {
        match notices.try_recv() {
            Ok(notice) => into.push(notice),
            Err(TryRecvError::Lagged(skipped)) => {
                log_debug!("notice stream lagged by {skipped}");
            }
            Err(_) => break,
        }
    }
}

/// Play `scenario` in (tokio) real time and report what the candidate would
/// have seen.
pub async fn run_scenario(
    scenario: Scenario,
    fallback_config: ProctorConfig,
    sink: Option<Arc<dyn ViolationSink>>,
) -> Result<ReplayReport> {
    let config = scenario.config.unwrap_or(fallback_config);
    let camera = CameraTrack::default();
    let started = Instant::now();
    let terminated_at = Arc::new(StdMutex::new(None));

    let mut builder = ProctorController::builder(config, TimelineFrameSource::new(scenario.frames))
        .camera(&camera);
    if let Some(platform) = scenario.platform {
        builder = builder.platform(platform);
    }
    if let Some(session_id) = scenario.session_id {
        builder = builder.session_id(session_id);
    }
    if let Some(sink) = sink {
        builder = builder.sink(sink);
    }
    let recorder = terminated_at.clone();
    let proctor = builder
        .on_terminate(move || {
            if let Ok(mut slot) = recorder.lock() {
                slot.get_or_insert(offset_ms(started, Instant::now()));
            }
        })
        .build()?;

    let mut notice_rx = proctor.subscribe_notices();
    let mut notices = Vec::new();
    let mut steps = scenario.steps;
    steps.sort_by_key(|step| step.at_ms);
    let last_ms = steps.last().map_or(0, |step| step.at_ms);

    log_info!(
        "replaying {} steps for session {}",
        steps.len(),
        proctor.session_id()
    );

    for step in steps {
        tokio::time::sleep_until(started + Duration::from_millis(step.at_ms)).await;
        log_debug!("{}ms: {:?}", step.at_ms, step.action);
        match step.action {
            ScenarioAction::Activate => proctor.set_active(true).await?,
            ScenarioAction::Deactivate => proctor.set_active(false).await?,
            ScenarioAction::Browser { event } => {
                proctor.handle_browser_event(&event).await;
            }
            ScenarioAction::Camera { state } => camera.set(state),
            ScenarioAction::Violation { kind, message } => {
                proctor.handle_violation(kind, message).await;
            }
            ScenarioAction::Dismiss => {
                proctor.dismiss_notification().await;
            }
            ScenarioAction::Reset => proctor.reset().await,
            ScenarioAction::BeginQuestion => {
                proctor.begin_question().await;
            }
        }
        drain_notices(&mut notice_rx, &mut notices);
    }

    tokio::time::sleep_until(started + Duration::from_millis(scenario.end_ms.max(last_ms))).await;
    drain_notices(&mut notice_rx, &mut notices);

    let snapshot = proctor.snapshot().await;
    let violations = proctor
        .violations()
        .await
        .into_iter()
        .map(|violation| ReplayViolation {
            offset_ms: offset_ms(started, violation.occurred_at),
            kind: violation.kind,
            message: violation.message,
        })
        .collect();
    proctor.set_active(false).await?;

    let terminated_at_ms = terminated_at.lock().ok().and_then(|slot| *slot);
    Ok(ReplayReport {
        snapshot,
        violations,
        notices,
        terminated_at_ms,
    })
}
