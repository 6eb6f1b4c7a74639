//! Error taxonomy.
//!
//! `DetectError` is what a request can terminate with. Frame and segment
//! failures have their own types because they are recovered where they occur:
//! they are logged and counted, never returned to the caller.

use thiserror::Error;

/// Request-terminating failure.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Classifier, label table or preprocessing capability missing.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    /// Payload could not be opened as a video.
    #[error("could not open video: {0}")]
    Decode(String),
    /// Decode succeeded but produced no usable frames.
    #[error("no frames extracted from video")]
    EmptyInput,
    /// No segment produced a prediction above the confidence threshold.
    #[error("no signs detected with sufficient confidence")]
    NoDetection,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Coarse status class reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ClientInput,
    NoResult,
    Dependency,
    Internal,
}

impl ErrorCategory {
    /// HTTP-style status code for the category.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorCategory::ClientInput | ErrorCategory::NoResult => 400,
            ErrorCategory::Dependency => 503,
            ErrorCategory::Internal => 500,
        }
    }
}

impl DetectError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DetectError::Decode(_) | DetectError::EmptyInput => ErrorCategory::ClientInput,
            DetectError::NoDetection => ErrorCategory::NoResult,
            DetectError::DependencyUnavailable(_) => ErrorCategory::Dependency,
            DetectError::Config(_) | DetectError::Internal(_) => ErrorCategory::Internal,
        }
    }
}

/// A single frame dropped from a comparison or a segment.
#[derive(Debug, Error)]
#[error("frame {index}: {cause:#}")]
pub struct FrameProcessingError {
    pub index: u64,
    pub cause: anyhow::Error,
}

impl FrameProcessingError {
    pub fn new(index: u64, cause: anyhow::Error) -> Self {
        Self { index, cause }
    }
}

/// Why a segment produced no prediction.
#[derive(Debug, Error)]
pub enum SegmentFailure {
    #[error("no valid frames after preprocessing")]
    NoValidFrames,
    #[error("classifier failed: {0:#}")]
    Classifier(anyhow::Error),
}

/// A whole segment skipped without failing the request.
#[derive(Debug, Error)]
#[error("segment {segment}: {reason}")]
pub struct SegmentProcessingError {
    pub segment: usize,
    pub reason: SegmentFailure,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn categories_separate_client_and_server_failures() {
        assert_eq!(
            DetectError::Decode("bad".into()).category(),
            ErrorCategory::ClientInput
        );
        assert_eq!(DetectError::EmptyInput.category(), ErrorCategory::ClientInput);
        assert_eq!(DetectError::NoDetection.category(), ErrorCategory::NoResult);
        assert_eq!(
            DetectError::DependencyUnavailable("model".into())
                .category()
                .status_code(),
            503
        );
        assert_eq!(
            DetectError::from(anyhow!("boom")).category().status_code(),
            500
        );
    }

    #[test]
    fn segment_error_mentions_index_and_reason() {
        let err = SegmentProcessingError {
            segment: 3,
            reason: SegmentFailure::NoValidFrames,
        };
        assert_eq!(
            err.to_string(),
            "segment 3: no valid frames after preprocessing"
        );
    }
}
