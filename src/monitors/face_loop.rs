use anyhow::anyhow;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{face::FaceMonitor, DetectedViolation, MonitorSignal, SignalSender};
use crate::detection::{FrameSource, TrackState};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "face_loop";

use crate::{log_debug, log_info, log_warn};

/// Upper bound on one detector call; an overrun counts as a failure.
const DETECTION_TIMEOUT: Duration = Duration::from_secs(2);

pub type SharedFrameSource = Arc<Mutex<Box<dyn FrameSource>>>;

/// Sample the frame source every `sample_interval` until cancelled, feeding
/// `monitor` and forwarding whatever it fires. Camera track changes are
/// judged as soon as they arrive.
pub async fn face_monitor_loop(
    mut monitor: FaceMonitor,
    source: SharedFrameSource,
    mut camera: watch::Receiver<TrackState>,
    signals: SignalSender,
    sample_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut source = source.lock().await;

    let ready = tokio::select! {
        result = source.ensure_ready() => result,
        _ = cancel_token.cancelled() => {
            source.teardown().await;
            return;
        }
    };

    if let Err(err) = ready {
        log_warn!("face detector unavailable: {err:#}");
        if let Some(violation) = monitor.on_detection_unavailable() {
            forward(&signals, violation);
        }
        source.teardown().await;
        return;
    }

    log_info!(
        "sampling frames every {}ms",
        sample_interval.as_millis()
    );

    let mut ticker = tokio::time::interval(sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut camera_open = true;

    loop {
        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                log_info!("face loop shutting down");
                break;
            }
            changed = camera.changed(), if camera_open => {
                let state = if changed.is_ok() {
                    *camera.borrow_and_update()
                } else {
                    // The media pipeline dropped the track.
                    camera_open = false;
                    TrackState::ENDED
                };
                log_debug!("camera track changed: {state:?}");
                if let Some(violation) = monitor.on_camera_change(state, Instant::now()) {
                    forward(&signals, violation);
                }
            }
            tick = ticker.tick() => {
                let camera_state = if camera_open { *camera.borrow() } else { TrackState::ENDED };
                if !camera_state.is_active() {
                    if let Some(violation) = monitor.on_camera_inactive(tick) {
                        forward(&signals, violation);
                    }
                    continue;
                }

                let result = tokio::select! {
                    result = tokio::time::timeout(DETECTION_TIMEOUT, source.analyze_frame()) => {
                        result.unwrap_or_else(|_| Err(anyhow!("face detection timed out after {}ms", DETECTION_TIMEOUT.as_millis())))
                    }
                    _ = cancel_token.cancelled() => break,
                };

                for violation in monitor.on_frame(result.as_ref(), tick) {
                    forward(&signals, violation);
                }

                if monitor.is_disabled() {
                    break;
                }
            }
        }

        if signals.is_closed() {
            log_warn!("violation receiver dropped; stopping face loop");
            break;
        }
    }

    source.teardown().await;
}

fn forward(signals: &SignalSender, violation: DetectedViolation) {
    log_info!("{} fired: {}", violation.kind.as_str(), violation.message);
    if signals.send(MonitorSignal::Violation(violation)).is_err() {
        log_warn!("dropped violation: receiver closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProctorConfig;
    use crate::detection::{
        BoundingBox, CameraTrack, DetectedFace, FaceLandmarks, FrameAnalysis, FrameScript,
        HeadPose, Point, TimedFrame, TimelineFrameSource,
    };
    use crate::models::ViolationKind;
    use crate::monitors::face::{CAMERA_OFF_MESSAGE, DETECTION_UNAVAILABLE_MESSAGE};
    use std::sync::atomic::Ordering;
    use tokio::sync::mpsc;

    fn looking(pose: HeadPose) -> FrameScript {
        FrameScript::Frame(FrameAnalysis {
            faces: vec![DetectedFace {
                bounding_box: BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 100.0,
                },
                landmarks: FaceLandmarks {
                    nose: Point::new(50.0, 60.0),
                    left_ear: Point::new(20.0, 50.0),
                    right_ear: Point::new(80.0, 50.0),
                },
                pose,
            }],
        })
    }

    fn shared(source: TimelineFrameSource) -> SharedFrameSource {
        Arc::new(Mutex::new(Box::new(source)))
    }

    fn spawn_loop(
        source: SharedFrameSource,
        camera: &CameraTrack,
    ) -> (
        mpsc::UnboundedReceiver<MonitorSignal>,
        CancellationToken,
        tokio::task::JoinHandle<()>,
    ) {
        let config = ProctorConfig::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let handle = tokio::spawn(face_monitor_loop(
            FaceMonitor::new(&config),
            source,
            camera.subscribe(),
            tx,
            config.sample_interval(),
            token.clone(),
        ));
        (rx, token, handle)
    }

    fn violation(signal: Option<MonitorSignal>) -> DetectedViolation {
        match signal {
            Some(MonitorSignal::Violation(v)) => v,
            other => panic!("expected a violation, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sustained_look_away_surfaces_after_two_seconds() {
        let camera = CameraTrack::default();
        let source = shared(TimelineFrameSource::new(vec![
            TimedFrame {
                from_ms: 0,
                script: looking(HeadPose::Center),
            },
            TimedFrame {
                from_ms: 1_000,
                script: looking(HeadPose::LookingLeft),
            },
        ]));
        let started = Instant::now();
        let (mut rx, token, handle) = spawn_loop(source, &camera);

        let fired = violation(rx.recv().await);
        assert_eq!(fired.kind, ViolationKind::LookingAway);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3_000), "fired after {elapsed:?}");
        assert!(elapsed < Duration::from_millis(3_300), "fired after {elapsed:?}");

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn camera_end_is_reported_without_waiting_for_a_tick() {
        let camera = CameraTrack::default();
        let timeline = TimelineFrameSource::new(vec![TimedFrame {
            from_ms: 0,
            script: looking(HeadPose::Center),
        }]);
        let teardowns = timeline.teardown_counter();
        let (mut rx, token, handle) = spawn_loop(shared(timeline), &camera);

        tokio::time::sleep(Duration::from_millis(500)).await;
        camera.end();

        let fired = violation(rx.recv().await);
        assert_eq!(fired.kind, ViolationKind::CameraOff);
        assert_eq!(fired.message, CAMERA_OFF_MESSAGE);

        assert_eq!(teardowns.load(Ordering::SeqCst), 0);
        token.cancel();
        handle.await.unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_detector_errors_disable_the_loop() {
        let camera = CameraTrack::default();
        let timeline = TimelineFrameSource::new(vec![TimedFrame {
            from_ms: 0,
            script: FrameScript::DetectorError {
                reason: "backend lost".into(),
            },
        }]);
        let teardowns = timeline.teardown_counter();
        let source = shared(timeline);
        let (mut rx, _token, handle) = spawn_loop(source.clone(), &camera);

        let fired = violation(rx.recv().await);
        assert_eq!(fired.message, DETECTION_UNAVAILABLE_MESSAGE);

        // The loop exits on its own and releases the detector.
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
        assert!(source.try_lock().is_ok());
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn detector_that_never_loads_reports_once() {
        let camera = CameraTrack::default();
        let unavailable = TimelineFrameSource::unavailable();
        let teardowns = unavailable.teardown_counter();
        let (mut rx, _token, handle) = spawn_loop(shared(unavailable), &camera);

        let fired = violation(rx.recv().await);
        assert_eq!(fired.kind, ViolationKind::CameraOff);
        assert_eq!(fired.message, DETECTION_UNAVAILABLE_MESSAGE);
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }
}
