use serde::{Deserialize, Serialize};

use super::frame::FaceLandmarks;
use crate::config::PoseThresholds;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HeadPose {
    Center,
    LookingUp,
    LookingDown,
    LookingLeft,
    LookingRight,
}

impl HeadPose {
    /// Quantise landmarks into a coarse pose.
    ///
    /// Yaw is the horizontal offset of the nose from the ear midpoint, pitch
    /// the vertical drop of the nose below the ear line; both are divided by
    /// the ear-to-ear distance. Left/right are in image coordinates. A
    /// sideways turn takes precedence over up/down.
    pub fn classify(landmarks: &FaceLandmarks, thresholds: &PoseThresholds) -> HeadPose {
        let FaceLandmarks {
            nose,
            left_ear,
            right_ear,
        } = *landmarks;

        let span = (right_ear.x - left_ear.x).hypot(right_ear.y - left_ear.y);
        if !span.is_finite() || span <= f32::EPSILON {
            // Degenerate landmarks carry no pose information.
            return HeadPose::Center;
        }

        let mid_x = (left_ear.x + right_ear.x) / 2.0;
        let mid_y = (left_ear.y + right_ear.y) / 2.0;
        let yaw = (nose.x - mid_x) / span;
        let pitch = (nose.y - mid_y) / span;

        if yaw > thresholds.yaw {
            HeadPose::LookingRight
        } else if yaw < -thresholds.yaw {
            HeadPose::LookingLeft
        } else if pitch > thresholds.pitch_down {
            HeadPose::LookingDown
        } else if pitch < thresholds.pitch_up {
            HeadPose::LookingUp
        } else {
            HeadPose::Center
        }
    }

    /// Whether this pose counts towards `looking-away`. Looking up is a
    /// natural thinking gesture and never does.
    pub fn is_suspicious(&self) -> bool {
        matches!(
            self,
            HeadPose::LookingDown | HeadPose::LookingLeft | HeadPose::LookingRight
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Point;

    fn landmarks(nose: (f32, f32)) -> FaceLandmarks {
        FaceLandmarks {
            nose: Point::new(nose.0, nose.1),
            left_ear: Point::new(100.0, 100.0),
            right_ear: Point::new(200.0, 100.0),
        }
    }

    fn classify(nose: (f32, f32)) -> HeadPose {
        HeadPose::classify(&landmarks(nose), &PoseThresholds::default())
    }

    #[test]
    fn nose_between_ears_slightly_low_is_center() {
        assert_eq!(classify((150.0, 125.0)), HeadPose::Center);
    }

    #[test]
    fn horizontal_offset_maps_to_left_and_right() {
        assert_eq!(classify((185.0, 125.0)), HeadPose::LookingRight);
        assert_eq!(classify((115.0, 125.0)), HeadPose::LookingLeft);
    }

    #[test]
    fn vertical_offset_maps_to_up_and_down() {
        assert_eq!(classify((150.0, 170.0)), HeadPose::LookingDown);
        assert_eq!(classify((150.0, 90.0)), HeadPose::LookingUp);
    }

    #[test]
    fn sideways_turn_wins_over_pitch() {
        assert_eq!(classify((190.0, 80.0)), HeadPose::LookingRight);
    }

    #[test]
    fn collapsed_ears_fall_back_to_center() {
        let lm = FaceLandmarks {
            nose: Point::new(10.0, 10.0),
            left_ear: Point::new(50.0, 50.0),
            right_ear: Point::new(50.0, 50.0),
        };
        assert_eq!(
            HeadPose::classify(&lm, &PoseThresholds::default()),
            HeadPose::Center
        );
    }

    #[test]
    fn only_down_left_right_are_suspicious() {
        assert!(!HeadPose::Center.is_suspicious());
        assert!(!HeadPose::LookingUp.is_suspicious());
        assert!(HeadPose::LookingDown.is_suspicious());
        assert!(HeadPose::LookingLeft.is_suspicious());
        assert!(HeadPose::LookingRight.is_suspicious());
    }
}
