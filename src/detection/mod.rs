pub mod browser;
pub mod camera;
pub mod frame;
pub mod pose;
pub mod source;

pub use browser::{BrowserEvent, ClipboardAction, EventDisposition, KeyChord, Platform};
pub use camera::{CameraTrack, TrackState};
pub use frame::{BoundingBox, DetectedFace, FaceLandmarks, FrameAnalysis, Point};
pub use pose::HeadPose;
pub use source::{FrameScript, FrameSource, TimedFrame, TimelineFrameSource};
