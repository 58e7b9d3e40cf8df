use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{ProctorConfig, SessionMode};
use crate::detection::{BrowserEvent, CameraTrack, EventDisposition, FrameSource, Platform};
use crate::ledger::{LedgerSnapshot, StrikeLedger, TerminationCallback};
use crate::models::{Notification, ProctorNotice, Violation, ViolationKind, ViolationRecord};
use crate::monitors::face_loop::SharedFrameSource;
use crate::monitors::{
    face_monitor_loop, BrowserMonitor, FaceMonitor, MonitorSignal, SignalReceiver,
};
use crate::sink::ViolationSink;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "proctor";

use crate::{log_debug, log_info, log_warn};

const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctorSnapshot {
    pub session_id: String,
    pub mode: SessionMode,
    pub active: bool,
    pub tab_grace_consumed: bool,
    pub ledger: LedgerSnapshot,
}

pub struct ProctorBuilder {
    config: ProctorConfig,
    source: Box<dyn FrameSource>,
    camera: CameraTrack,
    platform: Platform,
    sink: Option<Arc<dyn ViolationSink>>,
    on_terminate: Option<TerminationCallback>,
    session_id: Option<String>,
}

impl ProctorBuilder {
    /// Share the candidate's camera track; defaults to an always-live track.
    pub fn camera(mut self, camera: &CameraTrack) -> Self {
        self.camera = camera.clone();
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn ViolationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn on_terminate<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_terminate = Some(Arc::new(callback));
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn build(self) -> Result<ProctorController> {
        self.config
            .validate()
            .context("invalid proctoring configuration")?;

        let mut ledger =
            StrikeLedger::new(self.config.max_strikes, self.config.termination_delay());
        if let Some(callback) = self.on_terminate {
            ledger = ledger.with_termination_callback(callback);
        }

        let session_id = self
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let (notifications, _) = watch::channel(None);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        log_info!(
            "session {} ready ({:?} mode, {} strikes)",
            session_id,
            self.config.mode,
            self.config.max_strikes
        );

        Ok(ProctorController {
            inner: Arc::new(ControllerInner {
                session_id,
                started_at: Instant::now(),
                platform: self.platform,
                camera: self.camera,
                source: Arc::new(Mutex::new(self.source)),
                sink: self.sink,
                config: self.config,
                ledger: Mutex::new(ledger),
                activation: Mutex::new(None),
                notifications,
                notices,
            }),
        })
    }
}

/// Monitor state for one active stretch. Built on activation, dropped on
/// deactivation, so a reactivation never sees stale timing.
struct Activation {
    browser: BrowserMonitor,
    cancel_token: CancellationToken,
    face_task: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl Activation {
    async fn shutdown(mut self) -> Result<()> {
        self.cancel_token.cancel();
        if let Some(task) = self.face_task.take() {
            task.await.context("face monitor task failed")?;
        }
        if let Some(task) = self.dispatcher.take() {
            task.await.context("signal dispatcher failed")?;
        }
        Ok(())
    }
}

impl Drop for Activation {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

struct ControllerInner {
    session_id: String,
    config: ProctorConfig,
    platform: Platform,
    started_at: Instant,
    camera: CameraTrack,
    source: SharedFrameSource,
    sink: Option<Arc<dyn ViolationSink>>,
    ledger: Mutex<StrikeLedger>,
    activation: Mutex<Option<Activation>>,
    notifications: watch::Sender<Option<Notification>>,
    notices: broadcast::Sender<ProctorNotice>,
}

/// Wires the face and browser monitors into one strike ledger.
///
/// Every violation, from either monitor or from outside, goes through
/// [`ProctorController::handle_violation`]. Grace and clipboard notices are
/// published on a separate stream and never count as strikes.
#[derive(Clone)]
pub struct ProctorController {
    inner: Arc<ControllerInner>,
}

impl ProctorController {
    pub fn builder(config: ProctorConfig, source: impl FrameSource + 'static) -> ProctorBuilder {
        ProctorBuilder {
            config,
            source: Box::new(source),
            camera: CameraTrack::default(),
            platform: Platform::current(),
            sink: None,
            on_terminate: None,
            session_id: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub async fn is_active(&self) -> bool {
        self.inner.activation.lock().await.is_some()
    }

    /// Start or stop monitoring. Stopping waits for the sampling task to
    /// exit; the ledger is left untouched.
    pub async fn set_active(&self, active: bool) -> Result<()> {
        let mut activation = self.inner.activation.lock().await;
        match (active, activation.take()) {
            (true, None) => {
                *activation = Some(self.activate());
                log_info!("monitoring started for session {}", self.inner.session_id);
            }
            (false, Some(current)) => {
                current.shutdown().await?;
                log_info!("monitoring stopped for session {}", self.inner.session_id);
            }
            (true, current) => *activation = current,
            (false, None) => {}
        }
        Ok(())
    }

    fn activate(&self) -> Activation {
        let inner = &self.inner;
        let cancel_token = CancellationToken::new();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let face_task = tokio::spawn(face_monitor_loop(
            FaceMonitor::new(&inner.config),
            inner.source.clone(),
            inner.camera.subscribe(),
            signal_tx,
            inner.config.sample_interval(),
            cancel_token.clone(),
        ));
        let dispatcher = tokio::spawn(dispatch_signals(Arc::downgrade(inner), signal_rx));

        Activation {
            browser: BrowserMonitor::new(&inner.config, inner.platform),
            cancel_token,
            face_task: Some(face_task),
            dispatcher: Some(dispatcher),
        }
    }

    /// The single acceptance path for violations. Returns the notification
    /// the strike produced, or `None` once the session is terminated.
    pub async fn handle_violation(
        &self,
        kind: ViolationKind,
        message: impl Into<String>,
    ) -> Option<Notification> {
        let violation = Violation::new(kind, message, Instant::now());
        let record =
            ViolationRecord::from_violation(&self.inner.session_id, &violation, self.inner.started_at);

        let notification = {
            let mut ledger = self.inner.ledger.lock().await;
            if ledger.is_terminated() {
                log_debug!("session terminated; dropping {}", kind.as_str());
                return None;
            }
            let notification = ledger.add_strike(violation).cloned();
            self.inner.notifications.send_replace(notification.clone());
            notification
        };

        self.persist(record);
        notification
    }

    fn persist(&self, record: ViolationRecord) {
        let Some(sink) = self.inner.sink.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = sink.log(&record).await {
                log_warn!(
                    "failed to record {} violation: {err:#}",
                    record.kind.as_str()
                );
            }
        });
    }

    /// Feed one document event through the browser monitor. Everything is
    /// allowed while monitoring is off.
    pub async fn handle_browser_event(&self, event: &BrowserEvent) -> EventDisposition {
        let outcome = {
            let mut activation = self.inner.activation.lock().await;
            match activation.as_mut() {
                Some(current) => current.browser.handle_event(event, Instant::now()),
                None => return EventDisposition::Allow,
            }
        };

        if let Some(signal) = outcome.signal {
            self.route(signal).await;
        }
        outcome.disposition
    }

    async fn route(&self, signal: MonitorSignal) {
        match signal {
            MonitorSignal::Violation(detected) => {
                self.handle_violation(detected.kind, detected.message).await;
            }
            MonitorSignal::Notice(notice) => self.publish_notice(notice),
        }
    }

    fn publish_notice(&self, notice: ProctorNotice) {
        log_debug!("notice: {}", notice.message());
        if self.inner.notices.send(notice).is_err() {
            log_debug!("no notice subscribers");
        }
    }

    pub async fn dismiss_notification(&self) -> bool {
        let mut ledger = self.inner.ledger.lock().await;
        let cleared = ledger.dismiss_notification();
        if cleared {
            self.inner.notifications.send_replace(None);
        }
        cleared
    }

    /// Full reset back to zero strikes, cancelling a pending termination.
    pub async fn reset(&self) {
        let mut ledger = self.inner.ledger.lock().await;
        ledger.reset();
        self.inner.notifications.send_replace(None);
        log_info!("session {} reset", self.inner.session_id);
    }

    /// Called when the candidate moves to a new question. Only practice
    /// sessions start each question with a clean ledger.
    pub async fn begin_question(&self) -> bool {
        if self.inner.config.mode != SessionMode::Practice {
            return false;
        }
        self.reset().await;
        true
    }

    pub async fn violations(&self) -> Vec<Violation> {
        self.inner.ledger.lock().await.violations().to_vec()
    }

    pub async fn snapshot(&self) -> ProctorSnapshot {
        let (active, tab_grace_consumed) = {
            let activation = self.inner.activation.lock().await;
            (
                activation.is_some(),
                activation
                    .as_ref()
                    .is_some_and(|current| current.browser.grace_consumed()),
            )
        };
        let ledger = self.inner.ledger.lock().await.snapshot();

        ProctorSnapshot {
            session_id: self.inner.session_id.clone(),
            mode: self.inner.config.mode,
            active,
            tab_grace_consumed,
            ledger,
        }
    }

    pub fn subscribe_notifications(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.notifications.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<ProctorNotice> {
        self.inner.notices.subscribe()
    }
}

/// Applies monitor signals in arrival order. Runs until the face loop drops
/// its sender, so anything it forwarded before stopping is still applied.
/// Holds only a weak handle so a dropped controller shuts the pipeline down.
async fn dispatch_signals(inner: Weak<ControllerInner>, mut signals: SignalReceiver) {
    while let Some(signal) = signals.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        ProctorController { inner }.route(signal).await;
    }
    log_debug!("signal dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{
        BoundingBox, ClipboardAction, DetectedFace, FaceLandmarks, FrameAnalysis, FrameScript,
        HeadPose, KeyChord, Point, TimedFrame, TimelineFrameSource,
    };
    use crate::error::ConfigError;
    use crate::ledger::LedgerState;
    use crate::models::Severity;
    use crate::monitors::DetectedViolation;
    use crate::sink::MemoryViolationSink;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn face(pose: HeadPose) -> FrameAnalysis {
        FrameAnalysis {
            faces: vec![DetectedFace {
                bounding_box: BoundingBox {
                    x: 10.0,
                    y: 10.0,
                    width: 120.0,
                    height: 140.0,
                },
                landmarks: FaceLandmarks {
                    nose: Point::new(70.0, 80.0),
                    left_ear: Point::new(30.0, 70.0),
                    right_ear: Point::new(110.0, 70.0),
                },
                pose,
            }],
        }
    }

    fn timeline(entries: Vec<(u64, FrameAnalysis)>) -> TimelineFrameSource {
        TimelineFrameSource::new(
            entries
                .into_iter()
                .map(|(from_ms, analysis)| TimedFrame {
                    from_ms,
                    script: FrameScript::Frame(analysis),
                })
                .collect(),
        )
    }

    fn steady() -> TimelineFrameSource {
        timeline(vec![(0, face(HeadPose::Center))])
    }

    fn hide() -> BrowserEvent {
        BrowserEvent::VisibilityChanged { hidden: true }
    }

    fn show() -> BrowserEvent {
        BrowserEvent::VisibilityChanged { hidden: false }
    }

    fn current(proctor: &ProctorController) -> Option<Notification> {
        proctor.subscribe_notifications().borrow().clone()
    }

    struct FailingSink;

    #[async_trait]
    impl ViolationSink for FailingSink {
        async fn log(&self, _record: &ViolationRecord) -> Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn escalates_to_termination_across_signal_sources() {
        let t0 = Instant::now();
        let terminated_at = Arc::new(StdMutex::new(Vec::new()));
        let recorder = terminated_at.clone();

        let proctor = ProctorController::builder(
            ProctorConfig::default(),
            timeline(vec![
                (0, face(HeadPose::Center)),
                (2_000, FrameAnalysis::empty()),
                (13_000, face(HeadPose::LookingLeft)),
            ]),
        )
        .platform(Platform::Other)
        .on_terminate(move || recorder.lock().unwrap().push(Instant::now()))
        .build()
        .unwrap();
        let mut notices = proctor.subscribe_notices();
        proctor.set_active(true).await.unwrap();

        // First hide is the grace event.
        assert_eq!(proctor.handle_browser_event(&hide()).await, EventDisposition::Allow);
        proctor.handle_browser_event(&show()).await;
        assert_eq!(notices.try_recv().unwrap(), ProctorNotice::TabSwitchGrace);
        assert!(current(&proctor).is_none());

        tokio::time::sleep(Duration::from_secs(1)).await;
        proctor.handle_browser_event(&hide()).await;
        proctor.handle_browser_event(&show()).await;
        let first = current(&proctor).unwrap();
        assert_eq!(first.kind, ViolationKind::TabSwitch);
        assert_eq!(first.severity, Severity::Warning);

        tokio::time::sleep_until(t0 + Duration::from_millis(12_100)).await;
        let second = current(&proctor).unwrap();
        assert_eq!(second.kind, ViolationKind::NoFace);
        assert_eq!(second.severity, Severity::Final);

        tokio::time::sleep_until(t0 + Duration::from_millis(15_100)).await;
        let third = current(&proctor).unwrap();
        assert_eq!(third.kind, ViolationKind::LookingAway);
        assert_eq!(third.severity, Severity::Terminal);
        assert!(!proctor.dismiss_notification().await);
        assert!(terminated_at.lock().unwrap().is_empty());

        tokio::time::sleep_until(t0 + Duration::from_millis(18_100)).await;
        assert_eq!(
            *terminated_at.lock().unwrap(),
            vec![t0 + Duration::from_secs(18)]
        );

        let snapshot = proctor.snapshot().await;
        assert_eq!(snapshot.ledger.state, LedgerState::Terminated);
        assert_eq!(snapshot.ledger.violation_count, 3);
        assert!(proctor
            .handle_violation(ViolationKind::CameraOff, "late")
            .await
            .is_none());

        proctor.set_active(false).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn clipboard_is_blocked_but_never_penalised() {
        let proctor = ProctorController::builder(ProctorConfig::default(), steady())
            .platform(Platform::Other)
            .build()
            .unwrap();
        let mut notices = proctor.subscribe_notices();

        let paste = BrowserEvent::Clipboard {
            action: ClipboardAction::Paste,
        };
        assert_eq!(proctor.handle_browser_event(&paste).await, EventDisposition::Allow);
        assert!(notices.try_recv().is_err());

        proctor.set_active(true).await.unwrap();
        for _ in 0..5 {
            assert_eq!(
                proctor.handle_browser_event(&paste).await,
                EventDisposition::PreventDefault
            );
        }
        let copy = BrowserEvent::KeyDown {
            chord: KeyChord::new("c").with_ctrl(),
        };
        assert_eq!(
            proctor.handle_browser_event(&copy).await,
            EventDisposition::PreventDefault
        );

        let mut received = Vec::new();
        while let Ok(notice) = notices.try_recv() {
            received.push(notice);
        }
        assert_eq!(received.len(), 6);
        assert_eq!(received.last(), Some(&ProctorNotice::CopyBlocked));
        assert_eq!(proctor.snapshot().await.ledger.strike_count, 0);

        proctor.set_active(false).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_discards_monitor_state() {
        let source = timeline(vec![(0, face(HeadPose::LookingLeft))]);
        let teardowns = source.teardown_counter();
        let proctor = ProctorController::builder(ProctorConfig::default(), source)
            .platform(Platform::Other)
            .build()
            .unwrap();
        let mut notices = proctor.subscribe_notices();

        proctor.set_active(true).await.unwrap();
        proctor.handle_browser_event(&hide()).await;
        proctor.handle_browser_event(&show()).await;
        assert!(proctor.snapshot().await.tab_grace_consumed);
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        proctor.set_active(false).await.unwrap();
        assert!(!proctor.is_active().await);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        proctor.set_active(true).await.unwrap();

        // Grace is available again after reactivation.
        proctor.handle_browser_event(&hide()).await;
        proctor.handle_browser_event(&show()).await;
        assert_eq!(notices.try_recv().unwrap(), ProctorNotice::TabSwitchGrace);
        assert_eq!(notices.try_recv().unwrap(), ProctorNotice::TabSwitchGrace);

        // Looking away restarts from zero rather than resuming at 1.5s.
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(proctor.snapshot().await.ledger.strike_count, 0);
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(proctor.snapshot().await.ledger.strike_count, 1);

        proctor.set_active(false).await.unwrap();
        assert_eq!(teardowns.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatcher_drains_signals_sent_before_shutdown() {
        let proctor = ProctorController::builder(ProctorConfig::default(), steady())
            .build()
            .unwrap();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        for kind in [ViolationKind::NoFace, ViolationKind::MultipleFaces] {
            signal_tx
                .send(MonitorSignal::Violation(DetectedViolation::new(kind, "fired")))
                .unwrap();
        }
        // The sampler has exited; its queued violations must still land.
        drop(signal_tx);
        dispatch_signals(Arc::downgrade(&proctor.inner), signal_rx).await;

        let kinds: Vec<_> = proctor
            .violations()
            .await
            .into_iter()
            .map(|violation| violation.kind)
            .collect();
        assert_eq!(kinds, vec![ViolationKind::NoFace, ViolationKind::MultipleFaces]);
    }

    #[tokio::test(start_paused = true)]
    async fn sink_failures_never_reach_the_ledger() {
        let proctor = ProctorController::builder(ProctorConfig::default(), steady())
            .sink(Arc::new(FailingSink))
            .build()
            .unwrap();

        let first = proctor
            .handle_violation(ViolationKind::NoFace, "No face detected.")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = proctor
            .handle_violation(ViolationKind::MultipleFaces, "Multiple faces detected.")
            .await
            .unwrap();

        assert_eq!(first.severity, Severity::Warning);
        assert_eq!(second.severity, Severity::Final);
        assert_eq!(proctor.snapshot().await.ledger.strike_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_violations_reach_the_sink() {
        let sink = Arc::new(MemoryViolationSink::new());
        let proctor = ProctorController::builder(ProctorConfig::default(), steady())
            .sink(sink.clone())
            .session_id("interview-42")
            .build()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        proctor
            .handle_violation(ViolationKind::TabSwitch, "You switched away from the interview tab.")
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].session_id, "interview-42");
        assert_eq!(records[0].kind, ViolationKind::TabSwitch);
        assert_eq!(records[0].offset_ms, 500);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_pending_termination() {
        let fired = Arc::new(StdMutex::new(0u32));
        let counter = fired.clone();
        let config = ProctorConfig {
            max_strikes: 1,
            ..ProctorConfig::default()
        };
        let proctor = ProctorController::builder(config, steady())
            .on_terminate(move || *counter.lock().unwrap() += 1)
            .build()
            .unwrap();
        let notifications = proctor.subscribe_notifications();

        let only = proctor
            .handle_violation(ViolationKind::CameraOff, "Camera turned off.")
            .await
            .unwrap();
        assert_eq!(only.severity, Severity::Terminal);

        tokio::time::sleep(Duration::from_secs(2)).await;
        proctor.reset().await;
        assert!(notifications.borrow().is_none());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*fired.lock().unwrap(), 0);

        let snapshot = proctor.snapshot().await;
        assert_eq!(snapshot.ledger.state, LedgerState::Active { strikes: 0 });
        assert_eq!(snapshot.ledger.violation_count, 0);
        assert!(!snapshot.ledger.termination_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn dismissing_a_warning_clears_the_published_notification() {
        let proctor = ProctorController::builder(ProctorConfig::default(), steady())
            .build()
            .unwrap();
        let notifications = proctor.subscribe_notifications();

        proctor
            .handle_violation(ViolationKind::NoFace, "No face detected.")
            .await;
        assert!(notifications.borrow().is_some());

        assert!(proctor.dismiss_notification().await);
        assert!(notifications.borrow().is_none());
        assert!(!proctor.dismiss_notification().await);
        assert_eq!(proctor.snapshot().await.ledger.strike_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn only_practice_sessions_reset_between_questions() {
        let practice = ProctorController::builder(
            ProctorConfig {
                mode: SessionMode::Practice,
                ..ProctorConfig::default()
            },
            steady(),
        )
        .build()
        .unwrap();
        let real = ProctorController::builder(ProctorConfig::default(), steady())
            .build()
            .unwrap();

        for proctor in [&practice, &real] {
            proctor
                .handle_violation(ViolationKind::LookingAway, "Looking left.")
                .await;
        }

        assert!(practice.begin_question().await);
        assert!(!real.begin_question().await);
        assert_eq!(practice.snapshot().await.ledger.strike_count, 0);
        assert_eq!(real.snapshot().await.ledger.strike_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_detector_costs_one_strike() {
        let proctor =
            ProctorController::builder(ProctorConfig::default(), TimelineFrameSource::unavailable())
                .build()
                .unwrap();

        proctor.set_active(true).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let violations = proctor.violations().await;
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::CameraOff);

        proctor.set_active(false).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn camera_loss_is_a_strike() {
        let camera = CameraTrack::default();
        let proctor = ProctorController::builder(ProctorConfig::default(), steady())
            .camera(&camera)
            .build()
            .unwrap();

        proctor.set_active(true).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        camera.end();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let notification = current(&proctor).unwrap();
        assert_eq!(notification.kind, ViolationKind::CameraOff);
        assert_eq!(proctor.snapshot().await.ledger.strike_count, 1);

        proctor.set_active(false).await.unwrap();
    }

    #[test]
    fn build_rejects_invalid_config() {
        let err = ProctorController::builder(
            ProctorConfig {
                max_strikes: 0,
                ..ProctorConfig::default()
            },
            steady(),
        )
        .build()
        .err()
        .unwrap();

        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::ZeroStrikes));
    }

    #[tokio::test]
    async fn snapshot_serializes_for_the_presentation_layer() {
        let proctor = ProctorController::builder(ProctorConfig::default(), steady())
            .session_id("s-1")
            .build()
            .unwrap();
        let value = serde_json::to_value(proctor.snapshot().await).unwrap();

        assert_eq!(value["sessionId"], "s-1");
        assert_eq!(value["mode"], "real");
        assert_eq!(value["ledger"]["state"]["status"], "active");
        assert_eq!(value["ledger"]["maxStrikes"], 3);
    }
}
