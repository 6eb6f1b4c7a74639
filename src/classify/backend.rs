use anyhow::{anyhow, Result};

use crate::preprocess::NormalizedSegment;

/// A normalized segment stacked into a batch of one:
/// `[1, sequence_length, channels, height, width]`, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceBatch {
    pub shape: [usize; 5],
    pub data: Vec<f32>,
}

impl SequenceBatch {
    pub fn stack(segment: &NormalizedSegment) -> Result<Self> {
        let tensors = segment.tensors();
        let first = tensors
            .first()
            .ok_or_else(|| anyhow!("cannot stack an empty sequence"))?;
        let [channels, height, width] = first.shape;
        let mut data = Vec::with_capacity(tensors.len() * first.len());
        for tensor in tensors {
            if tensor.shape != first.shape {
                return Err(anyhow!(
                    "sequence mixes tensor shapes {:?} and {:?}",
                    first.shape,
                    tensor.shape
                ));
            }
            data.extend_from_slice(&tensor.data);
        }
        Ok(Self {
            shape: [1, tensors.len(), channels, height, width],
            data,
        })
    }

    pub fn sequence_length(&self) -> usize {
        self.shape[1]
    }
}

/// Sequence classifier capability.
///
/// Implementations hold read-only weights and run inference only: no
/// gradients, no state carried between calls. `classify` takes `&self` so a
/// single instance can be shared across requests and worker threads.
pub trait SequenceClassifier: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Raw class scores (logits) for the batch, one per class.
    fn classify(&self, batch: &SequenceBatch) -> Result<Vec<f32>>;
}
