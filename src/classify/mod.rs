//! Segment classification.
//!
//! A normalized segment is stacked into a batch of one, scored by a
//! [`SequenceClassifier`] backend, and reduced to the single most probable
//! class. Backends return raw logits; softmax and arg-max happen here so every
//! backend reports confidence on the same scale.

pub mod backend;
pub mod backends;
pub mod labels;
pub mod registry;
pub mod result;

pub use backend::{SequenceBatch, SequenceClassifier};
pub use labels::ClassLabels;
pub use registry::ClassifierRegistry;
pub use result::Prediction;

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::error::SegmentFailure;
use crate::preprocess::NormalizedSegment;

/// Numerically stable softmax. Fails on empty or non-finite input.
pub fn softmax(logits: &[f32]) -> Result<Vec<f32>> {
    if logits.is_empty() {
        return Err(anyhow!("classifier returned no scores"));
    }
    if logits.iter().any(|v| !v.is_finite()) {
        return Err(anyhow!("classifier returned non-finite scores"));
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    Ok(exps.into_iter().map(|v| v / sum).collect())
}

/// Index and value of the largest entry; the first one wins ties.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

/// Classifier plus label table, shared read-only across segments and requests.
#[derive(Clone)]
pub struct SegmentClassifier {
    backend: Arc<dyn SequenceClassifier>,
    labels: Arc<ClassLabels>,
}

impl SegmentClassifier {
    pub fn new(backend: Arc<dyn SequenceClassifier>, labels: Arc<ClassLabels>) -> Self {
        Self { backend, labels }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// Top class and its softmax probability for one segment.
    pub fn classify(&self, segment: &NormalizedSegment) -> Result<Prediction, SegmentFailure> {
        self.try_classify(segment).map_err(SegmentFailure::Classifier)
    }

    fn try_classify(&self, segment: &NormalizedSegment) -> Result<Prediction> {
        let batch = SequenceBatch::stack(segment)?;
        let logits = self.backend.classify(&batch)?;
        if logits.len() != self.labels.len() {
            return Err(anyhow!(
                "classifier returned {} scores for {} labels",
                logits.len(),
                self.labels.len()
            ));
        }
        let probabilities = softmax(&logits)?;
        let (class_index, confidence_score) =
            argmax(&probabilities).ok_or_else(|| anyhow!("classifier returned no scores"))?;
        let predicted_class = self
            .labels
            .get(class_index)
            .ok_or_else(|| anyhow!("no label for class {}", class_index))?
            .to_string();
        Ok(Prediction {
            predicted_class,
            confidence_score,
            class_index,
        })
    }
}
