//! Error types for mood capture, history and recommendations.
//!
//! None of these are fatal: every variant is recoverable at the caller's
//! boundary. The sampler swallows the per-sample variants
//! ([`MoodError::SampleFailure`], [`MoodError::SampleTimeout`]) and only
//! surfaces them through [`crate::sampler::SampleBatch::dropped`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MoodError {
    #[error("Mood sample failed: {0}")]
    SampleFailure(String),

    #[error("Mood sample timed out after {timeout_ms}ms")]
    SampleTimeout { timeout_ms: u64 },

    #[error("Insufficient samples: need {required}, have {available}")]
    InsufficientSamples { required: usize, available: usize },

    #[error("Detector unavailable: {0}. Check camera access and try again.")]
    DetectorUnavailable(String),

    #[error("Mood capture cancelled")]
    Cancelled,

    #[error("Unknown emotion label: '{0}'")]
    UnknownEmotion(String),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Unsupported mood history version {0}")]
    UnsupportedHistoryVersion(u32),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MoodError {
    /// Whether the sampler may drop this error and keep going.
    #[must_use]
    pub const fn is_sample_local(&self) -> bool {
        matches!(self, Self::SampleFailure(_) | Self::SampleTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, MoodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_local_classification() {
        assert!(MoodError::SampleFailure("blurry".into()).is_sample_local());
        assert!(MoodError::SampleTimeout { timeout_ms: 10 }.is_sample_local());
        assert!(!MoodError::Cancelled.is_sample_local());
        assert!(!MoodError::DetectorUnavailable("no camera".into()).is_sample_local());
    }

    #[test]
    fn test_error_messages() {
        let err = MoodError::InsufficientSamples { required: 1, available: 0 };
        assert_eq!(err.to_string(), "Insufficient samples: need 1, have 0");

        let err = MoodError::DetectorUnavailable("permission denied".into());
        assert!(err.to_string().contains("try again"));
    }
}
