use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::error::RecordError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    NoFace,
    MultipleFaces,
    LookingAway,
    CameraOff,
    TabSwitch,
}

impl ViolationKind {
    pub const COUNT: usize = 5;

    pub const ALL: [ViolationKind; Self::COUNT] = [
        ViolationKind::NoFace,
        ViolationKind::MultipleFaces,
        ViolationKind::LookingAway,
        ViolationKind::CameraOff,
        ViolationKind::TabSwitch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::NoFace => "no-face",
            ViolationKind::MultipleFaces => "multiple-faces",
            ViolationKind::LookingAway => "looking-away",
            ViolationKind::CameraOff => "camera-off",
            ViolationKind::TabSwitch => "tab-switch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Notification title shown to the candidate.
    pub fn title(&self) -> &'static str {
        match self {
            ViolationKind::NoFace => "Face Not Detected",
            ViolationKind::MultipleFaces => "Multiple Faces Detected",
            ViolationKind::LookingAway => "Looking Away Detected",
            ViolationKind::CameraOff => "Camera Turned Off",
            ViolationKind::TabSwitch => "Tab Switch Detected",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// One accepted rule break. Created by a monitor when a debounced condition
/// fires and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Violation {
    pub kind: ViolationKind,
    pub occurred_at: Instant,
    /// Wall-clock twin of `occurred_at`, only used for persistence.
    pub recorded_at: DateTime<Utc>,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>, occurred_at: Instant) -> Self {
        Self {
            kind,
            occurred_at,
            recorded_at: Utc::now(),
            message: message.into(),
        }
    }
}

/// Persisted / wire shape of a violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    pub session_id: String,
    pub kind: ViolationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds since the proctoring session started.
    pub offset_ms: u64,
}

impl ViolationRecord {
    pub fn from_violation(session_id: &str, violation: &Violation, session_started: Instant) -> Self {
        let offset = violation
            .occurred_at
            .saturating_duration_since(session_started)
            .as_millis();

        Self {
            session_id: session_id.to_string(),
            kind: violation.kind,
            message: violation.message.clone(),
            timestamp: violation.recorded_at,
            offset_ms: u64::try_from(offset).unwrap_or(u64::MAX),
        }
    }

    /// Validate a record arriving from outside the process. Field-level
    /// errors name the offending field so the caller can report it.
    pub fn from_json(value: &Value) -> Result<Self, RecordError> {
        let object = value.as_object().ok_or(RecordError::NotAnObject)?;

        let session_id = required_str(object, "sessionId")?;
        if session_id.trim().is_empty() {
            return Err(RecordError::invalid("sessionId", "must not be empty"));
        }

        let kind_raw = required_str(object, "kind")?;
        let kind = ViolationKind::parse(kind_raw)
            .ok_or_else(|| RecordError::invalid("kind", format!("unknown violation kind '{kind_raw}'")))?;

        let message = required_str(object, "message")?;

        let timestamp_raw = required_str(object, "timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|err| RecordError::invalid("timestamp", err.to_string()))?;

        let offset_ms = match object.get("offsetMs") {
            None | Some(Value::Null) => 0,
            Some(raw) => raw
                .as_u64()
                .ok_or_else(|| RecordError::invalid("offsetMs", "must be a non-negative integer"))?,
        };

        Ok(Self {
            session_id: session_id.to_string(),
            kind,
            message: message.to_string(),
            timestamp,
            offset_ms,
        })
    }
}

fn required_str<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, RecordError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(RecordError::MissingField(field)),
        Some(value) => value
            .as_str()
            .ok_or_else(|| RecordError::invalid(field, "must be a string")),
    }
}
