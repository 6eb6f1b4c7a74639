use serde::Serialize;

/// Top class for one segment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_class: String,
    /// Softmax probability of `predicted_class`, in `[0, 1]`.
    pub confidence_score: f32,
    #[serde(skip)]
    pub class_index: usize,
}
