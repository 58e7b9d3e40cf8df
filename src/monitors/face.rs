use anyhow::Error;
use std::time::Duration;
use tokio::time::Instant;

use super::DetectedViolation;
use crate::config::ProctorConfig;
use crate::detection::{FrameAnalysis, HeadPose, TrackState};
use crate::models::ViolationKind;
use crate::tracker::ViolationTracker;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "face_monitor";

use crate::{log_debug, log_warn};

pub const CAMERA_OFF_MESSAGE: &str = "Your camera appears to be turned off or disconnected.";
pub const DETECTION_UNAVAILABLE_MESSAGE: &str =
    "Face detection is unavailable, so camera monitoring is degraded for the rest of this session.";

#[derive(Debug, Clone, Copy)]
struct FacePolicy {
    no_face: Duration,
    multiple_faces: Duration,
    looking_away: Duration,
    camera_off: Duration,
    failure_limit: u32,
}

/// Per-tick face/pose policy. Owns its tracker; one instance per activation.
pub struct FaceMonitor {
    tracker: ViolationTracker,
    policy: FacePolicy,
    consecutive_failures: u32,
    disabled: bool,
}

impl FaceMonitor {
    pub fn new(config: &ProctorConfig) -> Self {
        Self {
            tracker: ViolationTracker::new(config.cooldown()),
            policy: FacePolicy {
                no_face: config.no_face_threshold(),
                multiple_faces: config.multiple_faces_threshold(),
                looking_away: config.looking_away_threshold(),
                camera_off: config.camera_off_threshold(),
                failure_limit: config.detection_failure_limit,
            },
            consecutive_failures: 0,
            disabled: false,
        }
    }

    /// Set after the detector has failed too often; no further signals.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// A tick while the camera track is active: `result` is the detector's
    /// verdict on the current frame.
    pub fn on_frame(
        &mut self,
        result: Result<&FrameAnalysis, &Error>,
        now: Instant,
    ) -> Vec<DetectedViolation> {
        if self.disabled {
            return Vec::new();
        }

        self.tracker.reset_timing(ViolationKind::CameraOff);

        let analysis = match result {
            Ok(analysis) => {
                self.consecutive_failures = 0;
                analysis
            }
            Err(err) => return self.on_detector_error(err).into_iter().collect(),
        };

        let mut fired = Vec::new();
        let face_count = analysis.face_count();

        let no_face_for = self.tracker.duration(ViolationKind::NoFace, now);
        if self.tracker.observe(
            ViolationKind::NoFace,
            face_count == 0,
            self.policy.no_face,
            now,
        ) {
            let seconds = no_face_for.max(self.policy.no_face).as_secs();
            fired.push(DetectedViolation::new(
                ViolationKind::NoFace,
                format!("No face has been visible in the camera for {seconds} seconds."),
            ));
        }

        if self.tracker.observe(
            ViolationKind::MultipleFaces,
            face_count > 1,
            self.policy.multiple_faces,
            now,
        ) {
            fired.push(DetectedViolation::new(
                ViolationKind::MultipleFaces,
                format!("{face_count} faces were detected in the camera frame."),
            ));
        }

        let pose = analysis.single_pose();
        let looking_away = pose.is_some_and(|pose| pose.is_suspicious());
        if self.tracker.observe(
            ViolationKind::LookingAway,
            looking_away,
            self.policy.looking_away,
            now,
        ) {
            let direction = match pose {
                Some(HeadPose::LookingDown) => "down",
                Some(HeadPose::LookingLeft) => "to the left",
                _ => "to the right",
            };
            fired.push(DetectedViolation::new(
                ViolationKind::LookingAway,
                format!("You appear to be looking {direction}, away from the screen."),
            ));
        }

        fired
    }

    /// A tick (or track event) while the camera is not live. Face conditions
    /// cannot be judged without frames, so their timing is dropped.
    pub fn on_camera_inactive(&mut self, now: Instant) -> Option<DetectedViolation> {
        if self.disabled {
            return None;
        }

        self.reset_face_timing();
        self.tracker
            .observe(ViolationKind::CameraOff, true, self.policy.camera_off, now)
            .then(|| DetectedViolation::new(ViolationKind::CameraOff, CAMERA_OFF_MESSAGE))
    }

    /// A camera track event. Inactive transitions are judged immediately
    /// instead of waiting for the next tick.
    pub fn on_camera_change(&mut self, state: TrackState, now: Instant) -> Option<DetectedViolation> {
        if state.is_active() {
            self.tracker.reset_timing(ViolationKind::CameraOff);
            None
        } else {
            self.on_camera_inactive(now)
        }
    }

    /// The detector could not be brought up at all.
    pub fn on_detection_unavailable(&mut self) -> Option<DetectedViolation> {
        if self.disabled {
            return None;
        }
        Some(self.disable())
    }

    fn on_detector_error(&mut self, err: &Error) -> Option<DetectedViolation> {
        // An unknown frame is not evidence of any face condition.
        self.reset_face_timing();
        self.consecutive_failures += 1;
        log_warn!(
            "face detection failed ({}/{}): {err:#}",
            self.consecutive_failures,
            self.policy.failure_limit
        );

        (self.consecutive_failures >= self.policy.failure_limit).then(|| self.disable())
    }

    /// Bypasses the cooldown: a blind spot must always surface once.
    fn disable(&mut self) -> DetectedViolation {
        log_debug!("disabling face monitor for the rest of the session");
        self.disabled = true;
        self.tracker.reset_all();
        DetectedViolation::new(ViolationKind::CameraOff, DETECTION_UNAVAILABLE_MESSAGE)
    }

    fn reset_face_timing(&mut self) {
        self.tracker.reset_timing(ViolationKind::NoFace);
        self.tracker.reset_timing(ViolationKind::MultipleFaces);
        self.tracker.reset_timing(ViolationKind::LookingAway);
    }
}
