use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::classify::backend::{SequenceBatch, SequenceClassifier};

/// ONNX sequence classifier run through tract.
///
/// The model takes `[1, sequence_length, channels, height, width]` f32 input
/// and returns one logit per class. The plan is built once and shared; runs
/// are inference-only and keep no state between calls.
pub struct TractClassifier {
    model: TypedRunnableModel<TypedModel>,
    input_shape: [usize; 5],
}

impl TractClassifier {
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        sequence_length: usize,
        channels: usize,
        height: usize,
        width: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let input_shape = [1, sequence_length, channels, height, width];
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, sequence_length, channels, height, width),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!(
            "loaded classifier {} with input {:?}",
            model_path.display(),
            input_shape
        );
        Ok(Self { model, input_shape })
    }

    fn build_input(&self, batch: &SequenceBatch) -> Result<Tensor> {
        if batch.shape != self.input_shape {
            return Err(anyhow!(
                "batch shape {:?} does not match model input {:?}",
                batch.shape,
                self.input_shape
            ));
        }
        let [n, s, c, h, w] = batch.shape;
        let input = tract_ndarray::Array5::from_shape_vec((n, s, c, h, w), batch.data.clone())
            .context("batch data does not fill its shape")?;
        Ok(input.into_tensor())
    }
}

impl SequenceClassifier for TractClassifier {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn classify(&self, batch: &SequenceBatch) -> Result<Vec<f32>> {
        let input = self.build_input(batch)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        Ok(scores.iter().copied().collect())
    }
}
