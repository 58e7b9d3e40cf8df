use serde::{Deserialize, Serialize};

use super::pose::HeadPose;
use crate::config::PoseThresholds;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The three reference points pose estimation needs, in image coordinates
/// (x grows rightwards, y grows downwards).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaceLandmarks {
    pub nose: Point,
    pub left_ear: Point,
    pub right_ear: Point,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFace {
    pub bounding_box: BoundingBox,
    pub landmarks: FaceLandmarks,
    pub pose: HeadPose,
}

impl DetectedFace {
    /// Build a face from raw detector output, deriving the pose.
    pub fn from_landmarks(
        bounding_box: BoundingBox,
        landmarks: FaceLandmarks,
        thresholds: &PoseThresholds,
    ) -> Self {
        Self {
            bounding_box,
            landmarks,
            pose: HeadPose::classify(&landmarks, thresholds),
        }
    }
}

/// Result of analysing one video frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameAnalysis {
    pub faces: Vec<DetectedFace>,
}

impl FrameAnalysis {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Pose of the only face in frame, if there is exactly one.
    pub fn single_pose(&self) -> Option<HeadPose> {
        match self.faces.as_slice() {
            [face] => Some(face.pose),
            _ => None,
        }
    }
}
