//! Confidence filtering and result assembly.

use crate::classify::Prediction;
use crate::error::DetectError;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.05;

/// Collects per-segment predictions in the order they are offered.
#[derive(Debug)]
pub struct ResultAggregator {
    threshold: f32,
    detected: Vec<Prediction>,
    below_threshold: usize,
}

impl ResultAggregator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            detected: Vec::new(),
            below_threshold: 0,
        }
    }

    /// Keep `prediction` if its confidence is strictly above the threshold.
    pub fn offer(&mut self, prediction: Prediction) -> bool {
        if prediction.confidence_score > self.threshold {
            log::info!(
                "accepted {} ({:.3})",
                prediction.predicted_class,
                prediction.confidence_score
            );
            self.detected.push(prediction);
            true
        } else {
            log::info!(
                "rejected {} ({:.3} <= {:.3})",
                prediction.predicted_class,
                prediction.confidence_score,
                self.threshold
            );
            self.below_threshold += 1;
            false
        }
    }

    pub fn detected(&self) -> &[Prediction] {
        &self.detected
    }

    pub fn below_threshold(&self) -> usize {
        self.below_threshold
    }

    /// The final ordered result, or `NoDetection` when nothing was kept.
    pub fn finish(self) -> Result<Vec<Prediction>, DetectError> {
        if self.detected.is_empty() {
            Err(DetectError::NoDetection)
        } else {
            Ok(self.detected)
        }
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}
