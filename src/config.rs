use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::error::ConfigError;

/// Head-pose quantisation thresholds, expressed as ratios of the ear-to-ear
/// span so they are independent of how far the candidate sits from the camera.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoseThresholds {
    /// |yaw| above this is looking left/right.
    pub yaw: f32,
    /// Pitch above this (nose well below the ear line) is looking down.
    pub pitch_down: f32,
    /// Pitch below this (nose at or above the ear line) is looking up.
    pub pitch_up: f32,
}

impl Default for PoseThresholds {
    fn default() -> Self {
        Self {
            yaw: 0.25,
            pitch_down: 0.55,
            pitch_up: -0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    /// Practice runs: each new question starts with a clean ledger.
    Practice,
    Real,
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::Real
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProctorConfig {
    pub mode: SessionMode,
    pub max_strikes: u32,
    pub cooldown_ms: u64,
    pub no_face_threshold_ms: u64,
    pub multiple_faces_threshold_ms: u64,
    pub looking_away_threshold_ms: u64,
    pub camera_off_threshold_ms: u64,
    pub sample_interval_ms: u64,
    pub termination_delay_ms: u64,
    pub detection_failure_limit: u32,
    pub tab_switch_grace: bool,
    pub pose: PoseThresholds,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::Real,
            max_strikes: 3,
            cooldown_ms: 7_500,
            no_face_threshold_ms: 10_000,
            multiple_faces_threshold_ms: 0,
            looking_away_threshold_ms: 2_000,
            camera_off_threshold_ms: 0,
            sample_interval_ms: 200,
            termination_delay_ms: 3_000,
            detection_failure_limit: 5,
            tab_switch_grace: true,
            pose: PoseThresholds::default(),
        }
    }
}

impl ProctorConfig {
    /// Load from a JSON file. A missing file yields the defaults; a present
    /// but unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read proctor config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse proctor config {}", path.display()))?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_strikes == 0 {
            return Err(ConfigError::ZeroStrikes);
        }
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        if self.detection_failure_limit == 0 {
            return Err(ConfigError::ZeroFailureLimit);
        }
        if !(self.pose.yaw.is_finite() && self.pose.yaw > 0.0) {
            return Err(ConfigError::InvalidPoseThreshold("yaw"));
        }
        if !(self.pose.pitch_down.is_finite() && self.pose.pitch_down > self.pose.pitch_up) {
            return Err(ConfigError::InvalidPoseThreshold("pitch_down"));
        }
        if !self.pose.pitch_up.is_finite() {
            return Err(ConfigError::InvalidPoseThreshold("pitch_up"));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn termination_delay(&self) -> Duration {
        Duration::from_millis(self.termination_delay_ms)
    }

    pub fn no_face_threshold(&self) -> Duration {
        Duration::from_millis(self.no_face_threshold_ms)
    }

    pub fn multiple_faces_threshold(&self) -> Duration {
        Duration::from_millis(self.multiple_faces_threshold_ms)
    }

    pub fn looking_away_threshold(&self) -> Duration {
        Duration::from_millis(self.looking_away_threshold_ms)
    }

    pub fn camera_off_threshold(&self) -> Duration {
        Duration::from_millis(self.camera_off_threshold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProctorConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ProctorConfig::default());
        assert_eq!(config.cooldown(), Duration::from_millis(7_500));
    }

    #[test]
    fn partial_file_keeps_unset_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proctor.json");
        fs::write(&path, r#"{ "max_strikes": 5, "mode": "practice" }"#).unwrap();

        let config = ProctorConfig::load(&path).unwrap();
        assert_eq!(config.max_strikes, 5);
        assert_eq!(config.mode, SessionMode::Practice);
        assert_eq!(config.looking_away_threshold_ms, 2_000);
    }

    #[test]
    fn zero_strike_budget_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proctor.json");
        fs::write(&path, r#"{ "max_strikes": 0 }"#).unwrap();

        let err = ProctorConfig::load(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroStrikes)
        );
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proctor.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ProctorConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("proctor.json"));
    }
}
