use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::classify::backend::{SequenceBatch, SequenceClassifier};

type ScoreFn = dyn Fn(&SequenceBatch) -> Result<Vec<f32>> + Send + Sync;

enum Scoring {
    Fixed(Vec<f32>),
    Bands(usize),
    Custom(Arc<ScoreFn>),
}

/// Deterministic classifier for tests and model-free runs.
///
/// No weights are loaded. `bands` splits the mean activation of the batch
/// into evenly spaced class centres, so brighter or darker gestures land on
/// different classes while identical input always gives identical scores.
pub struct StubClassifier {
    scoring: Scoring,
}

impl StubClassifier {
    /// Always return the same logits.
    pub fn fixed(logits: Vec<f32>) -> Self {
        Self {
            scoring: Scoring::Fixed(logits),
        }
    }

    /// Logits whose softmax puts `confidence` on `class` and spreads the
    /// rest evenly over the other `classes - 1` entries.
    pub fn with_confidence(classes: usize, class: usize, confidence: f32) -> Result<Self> {
        if classes < 2 || class >= classes {
            return Err(anyhow!(
                "class {} is out of range for {} classes",
                class,
                classes
            ));
        }
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(anyhow!("confidence must be in (0, 1), got {}", confidence));
        }
        let rest = ((1.0 - confidence) / (classes - 1) as f32).ln();
        let mut logits = vec![rest; classes];
        logits[class] = confidence.ln();
        Ok(Self::fixed(logits))
    }

    /// Score by mean activation, one band per class.
    pub fn bands(classes: usize) -> Self {
        Self {
            scoring: Scoring::Bands(classes.max(1)),
        }
    }

    /// Delegate scoring to a closure.
    pub fn from_fn<F>(scorer: F) -> Self
    where
        F: Fn(&SequenceBatch) -> Result<Vec<f32>> + Send + Sync + 'static,
    {
        Self {
            scoring: Scoring::Custom(Arc::new(scorer)),
        }
    }
}

impl SequenceClassifier for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn classify(&self, batch: &SequenceBatch) -> Result<Vec<f32>> {
        match &self.scoring {
            Scoring::Fixed(logits) => Ok(logits.clone()),
            Scoring::Bands(classes) => {
                let mean = if batch.data.is_empty() {
                    0.0
                } else {
                    batch.data.iter().sum::<f32>() / batch.data.len() as f32
                };
                let classes = *classes;
                Ok((0..classes)
                    .map(|k| {
                        // Centres spread over the normalized range [-1, 1].
                        let centre = if classes == 1 {
                            0.0
                        } else {
                            -1.0 + 2.0 * k as f32 / (classes - 1) as f32
                        };
                        -8.0 * (mean - centre).powi(2)
                    })
                    .collect())
            }
            Scoring::Custom(scorer) => scorer(batch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::softmax;

    fn batch(value: f32) -> SequenceBatch {
        SequenceBatch {
            shape: [1, 2, 1, 2, 2],
            data: vec![value; 8],
        }
    }

    #[test]
    fn with_confidence_round_trips_through_softmax() -> Result<()> {
        let stub = StubClassifier::with_confidence(4, 2, 0.7)?;
        let probs = softmax(&stub.classify(&batch(0.0))?)?;
        assert!((probs[2] - 0.7).abs() < 1e-5);
        assert!((probs[0] - 0.1).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn bands_follow_mean_activation() -> Result<()> {
        let stub = StubClassifier::bands(3);
        let dark = stub.classify(&batch(-1.0))?;
        let bright = stub.classify(&batch(1.0))?;
        assert!(dark[0] > dark[2]);
        assert!(bright[2] > bright[0]);
        assert_eq!(stub.classify(&batch(0.3))?, stub.classify(&batch(0.3))?);
        Ok(())
    }

    #[test]
    fn invalid_confidence_is_rejected() {
        assert!(StubClassifier::with_confidence(3, 0, 1.0).is_err());
        assert!(StubClassifier::with_confidence(1, 0, 0.5).is_err());
        assert!(StubClassifier::with_confidence(3, 3, 0.5).is_err());
    }
}
