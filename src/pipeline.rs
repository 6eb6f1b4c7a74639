//! Request orchestration.
//!
//! One payload in, one ordered list of predictions out. Shared state (the
//! classifier, its label table and the preprocessing collaborators) is built
//! once and held behind `Arc`; nothing on the request path mutates it, so a
//! single `SignDetector` serves concurrent requests.

use std::sync::Arc;

use rayon::prelude::*;

use crate::aggregate::ResultAggregator;
use crate::classify::{ClassLabels, ClassifierRegistry, Prediction, SegmentClassifier};
use crate::config::DetectorConfig;
use crate::error::{DetectError, SegmentProcessingError};
use crate::frame::Frame;
use crate::ingest::{read_all_frames, VideoDecoder};
use crate::preprocess::{FramePreprocessor, GrayscaleMasker, ResizeNormalize};
use crate::segment::{MotionSegmenter, Segment, SegmenterConfig};
use crate::sequence;

/// Label count used by the stub classifier when no label file is configured.
pub const DEFAULT_STUB_CLASSES: usize = 8;

/// Per-request counters reported alongside the result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectionStats {
    pub frames_read: usize,
    pub segments_found: usize,
    pub segments_classified: usize,
    pub segments_skipped: usize,
    pub below_threshold: usize,
    pub skipped_comparisons: usize,
    /// The whole video was classified as one segment.
    pub fallback: bool,
}

#[derive(Clone, Debug)]
pub struct DetectionReport {
    pub detected_signs: Vec<Prediction>,
    pub stats: DetectionStats,
}

/// Scalar pipeline settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineSettings {
    pub segmenter: SegmenterConfig,
    pub sequence_length: usize,
    pub confidence_threshold: f32,
    pub parallel_segments: bool,
}

impl From<&DetectorConfig> for PipelineSettings {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            segmenter: config.segmenter.clone(),
            sequence_length: config.sequence_length,
            confidence_threshold: config.confidence_threshold,
            parallel_segments: config.parallel_segments,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&DetectorConfig::default())
    }
}

pub struct SignDetector {
    segmenter: MotionSegmenter,
    preprocessor: FramePreprocessor,
    classifier: SegmentClassifier,
    sequence_length: usize,
    confidence_threshold: f32,
    parallel_segments: bool,
}

impl SignDetector {
    pub fn new(
        settings: PipelineSettings,
        preprocessor: FramePreprocessor,
        classifier: SegmentClassifier,
    ) -> Result<Self, DetectError> {
        if settings.sequence_length == 0 {
            return Err(DetectError::Config(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            segmenter: MotionSegmenter::new(settings.segmenter),
            preprocessor,
            classifier,
            sequence_length: settings.sequence_length,
            confidence_threshold: settings.confidence_threshold,
            parallel_segments: settings.parallel_segments,
        })
    }

    /// Build every shared dependency from configuration.
    ///
    /// A missing label table, model file or backend is `DependencyUnavailable`.
    pub fn from_config(config: &DetectorConfig) -> Result<Self, DetectError> {
        config
            .validate()
            .map_err(|e| DetectError::Config(format!("{:#}", e)))?;
        let labels = load_labels(config)?;
        let registry = default_registry(config, &labels)?;
        let backend = registry.resolve(Some(&config.classifier.backend))?;
        let classifier = SegmentClassifier::new(backend, labels);

        let transform = ResizeNormalize {
            width: config.preprocess.input_width,
            height: config.preprocess.input_height,
            mean: config.preprocess.normalize_mean,
            std: config.preprocess.normalize_std,
        };
        let preprocessor = FramePreprocessor::new(
            config.preprocess.rotation,
            Arc::new(GrayscaleMasker),
            Arc::new(transform),
        );
        log::info!(
            "detector ready - classifier: {}, labels: {}, sequence length: {}",
            classifier.backend_name(),
            classifier.labels().len(),
            config.sequence_length
        );
        Self::new(PipelineSettings::from(config), preprocessor, classifier)
    }

    pub fn classifier(&self) -> &SegmentClassifier {
        &self.classifier
    }

    /// Decode `payload` and run the full pipeline.
    ///
    /// The frame source, and any spool file it owns, is dropped before
    /// classification starts.
    pub fn detect_video(
        &self,
        decoder: &dyn VideoDecoder,
        payload: &[u8],
    ) -> Result<DetectionReport, DetectError> {
        let frames = {
            let mut source = decoder.open(payload)?;
            let properties = source.properties();
            log::info!(
                "{} source - fps: {:.2}, frames: {}, duration: {:.2}s",
                decoder.name(),
                properties.frame_rate,
                properties.frame_count,
                properties.duration_secs()
            );
            read_all_frames(source.as_mut())?
        };
        self.detect_frames(&frames)
    }

    /// Run segmentation, classification and aggregation over decoded frames.
    pub fn detect_frames(&self, frames: &[Frame]) -> Result<DetectionReport, DetectError> {
        if frames.is_empty() {
            return Err(DetectError::EmptyInput);
        }

        let segmentation = self.segmenter.segment(frames);
        let segments = &segmentation.segments;

        let outcomes: Vec<Result<Prediction, SegmentProcessingError>> = if self.parallel_segments {
            segments
                .par_iter()
                .enumerate()
                .map(|(index, segment)| self.process_segment(index, segment))
                .collect()
        } else {
            segments
                .iter()
                .enumerate()
                .map(|(index, segment)| self.process_segment(index, segment))
                .collect()
        };

        let mut stats = DetectionStats {
            frames_read: frames.len(),
            segments_found: segments.len(),
            skipped_comparisons: segmentation.skipped_comparisons,
            fallback: segmentation.fallback,
            ..Default::default()
        };
        let mut aggregator = ResultAggregator::new(self.confidence_threshold);
        for outcome in outcomes {
            match outcome {
                Ok(prediction) => {
                    stats.segments_classified += 1;
                    aggregator.offer(prediction);
                }
                Err(err) => {
                    log::warn!("skipping {}", err);
                    stats.segments_skipped += 1;
                }
            }
        }
        stats.below_threshold = aggregator.below_threshold();

        log::info!(
            "classified {} of {} segments ({} skipped, {} below threshold)",
            stats.segments_classified,
            stats.segments_found,
            stats.segments_skipped,
            stats.below_threshold
        );
        let detected_signs = aggregator.finish()?;
        log::info!("returning {} detected signs", detected_signs.len());
        Ok(DetectionReport {
            detected_signs,
            stats,
        })
    }

    fn process_segment(
        &self,
        index: usize,
        segment: &Segment<'_>,
    ) -> Result<Prediction, SegmentProcessingError> {
        let selected = sequence::resample(segment, self.sequence_length);
        let normalized = self
            .preprocessor
            .prepare_segment(&selected, self.sequence_length)
            .map_err(|reason| SegmentProcessingError {
                segment: index,
                reason,
            })?;
        if normalized.skipped_frames() > 0 {
            log::info!(
                "segment {}: {} frames dropped, {} padded",
                index,
                normalized.skipped_frames(),
                normalized.padding().len()
            );
        }
        let prediction = self
            .classifier
            .classify(&normalized)
            .map_err(|reason| SegmentProcessingError {
                segment: index,
                reason,
            })?;
        log::debug!("segment {} frames: {:?}", index, segment.frame_indices());
        log::info!(
            "segment {} ({} frames): {} - {:.3}",
            index,
            segment.len(),
            prediction.predicted_class,
            prediction.confidence_score
        );
        Ok(prediction)
    }
}

/// Load the label table named by the config.
///
/// The stub backend falls back to numbered labels; other backends need a file.
pub fn load_labels(config: &DetectorConfig) -> Result<Arc<ClassLabels>, DetectError> {
    let labels = match &config.labels_path {
        Some(path) => ClassLabels::load(path),
        None if config.classifier.backend == "stub" => {
            ClassLabels::numbered(DEFAULT_STUB_CLASSES)
        }
        None => {
            return Err(DetectError::DependencyUnavailable(format!(
                "the {} classifier needs a label table (labels_path)",
                config.classifier.backend
            )))
        }
    };
    labels
        .map(Arc::new)
        .map_err(|e| DetectError::DependencyUnavailable(format!("{:#}", e)))
}

/// Registry holding the stub backend plus any backend the config selects.
pub fn default_registry(
    config: &DetectorConfig,
    labels: &ClassLabels,
) -> Result<ClassifierRegistry, DetectError> {
    let mut registry = ClassifierRegistry::new();
    registry.register(crate::classify::backends::StubClassifier::bands(labels.len()));

    #[cfg(feature = "backend-tract")]
    {
        if config.classifier.backend == "tract" {
            let model_path = config.classifier.model_path.as_ref().ok_or_else(|| {
                DetectError::DependencyUnavailable(
                    "the tract classifier needs a model_path".to_string(),
                )
            })?;
            let classifier = crate::classify::backends::TractClassifier::new(
                model_path,
                config.sequence_length,
                1,
                config.preprocess.input_height as usize,
                config.preprocess.input_width as usize,
            )
            .map_err(|e| DetectError::DependencyUnavailable(format!("{:#}", e)))?;
            registry.register(classifier);
        }
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        if config.classifier.backend == "tract" {
            log::warn!("the tract classifier requires the backend-tract feature");
        }
    }

    Ok(registry)
}
