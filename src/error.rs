use thiserror::Error;

/// Rejection of an externally supplied violation record. Nothing is stored
/// when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("violation record must be a JSON object")]
    NotAnObject,
    #[error("violation record is missing field `{0}`")]
    MissingField(&'static str),
    #[error("violation record field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl RecordError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RecordError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_strikes must be at least 1")]
    ZeroStrikes,
    #[error("sample_interval_ms must be greater than zero")]
    ZeroSampleInterval,
    #[error("detection_failure_limit must be at least 1")]
    ZeroFailureLimit,
    #[error("pose threshold `{0}` must be a finite positive number")]
    InvalidPoseThreshold(&'static str),
}
