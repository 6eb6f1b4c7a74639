//! Externally visible response bodies.

use serde::Serialize;

use crate::classify::Prediction;
use crate::error::{DetectError, ErrorCategory};
use crate::pipeline::DetectionReport;

/// `{"detected_signs": [{"predicted_class": ..., "confidence_score": ...}]}`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionResponse {
    pub detected_signs: Vec<Prediction>,
}

impl From<DetectionReport> for DetectionResponse {
    fn from(report: DetectionReport) -> Self {
        Self {
            detected_signs: report.detected_signs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub status: ErrorCategory,
    pub status_code: u16,
    pub detail: String,
}

impl From<&DetectError> for ErrorResponse {
    fn from(err: &DetectError) -> Self {
        let status = err.category();
        Self {
            status,
            status_code: status.status_code(),
            detail: err.to_string(),
        }
    }
}
