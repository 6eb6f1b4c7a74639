//! Sign-language video classification.
//!
//! A video payload is decoded into frames, split into gesture segments by
//! inter-frame motion, each segment is resampled to a fixed length and
//! classified, and confident predictions are returned in segment order.
//!
//! # Pipeline
//!
//! 1. **Frame source** (`ingest`): `VideoDecoder::open` yields a `FrameSource`;
//!    unreadable frames are skipped, zero frames is `EmptyInput`.
//! 2. **Motion segmenter** (`segment`): mean absolute difference between
//!    neighbours drives an explicit state machine; the whole video is used
//!    when no run qualifies.
//! 3. **Segment normalizer** (`sequence`): evenly spaced index selection to
//!    exactly `sequence_length` frames.
//! 4. **Frame preprocessor** (`preprocess`): rotation, RGB conversion,
//!    masking, tensor normalization; failed frames are dropped and the
//!    sequence is zero-padded.
//! 5. **Segment classifier** (`classify`): softmax over backend logits,
//!    arg-max label and probability.
//! 6. **Result aggregator** (`aggregate`): strict confidence threshold,
//!    segment order preserved; nothing kept is `NoDetection`.
//!
//! Frame and segment failures are absorbed and logged. Decode, dependency
//! and empty-result failures end the request with a `DetectError`.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod preprocess;
pub mod response;
pub mod segment;
pub mod sequence;
pub mod ui;

pub use aggregate::{ResultAggregator, DEFAULT_CONFIDENCE_THRESHOLD};
pub use classify::{
    ClassLabels, ClassifierRegistry, Prediction, SegmentClassifier, SequenceBatch,
    SequenceClassifier,
};
pub use config::DetectorConfig;
pub use error::{
    DetectError, ErrorCategory, FrameProcessingError, SegmentFailure, SegmentProcessingError,
};
pub use frame::{Frame, FrameTensor, GrayFrame, PixelFormat};
pub use ingest::{
    read_all_frames, FrameSource, MemoryDecoder, MemorySource, PayloadDecoder, StreamProperties,
    SyntheticSource, VideoDecoder,
};
pub use pipeline::{DetectionReport, DetectionStats, PipelineSettings, SignDetector};
pub use preprocess::{
    FramePreprocessor, GrayscaleMasker, HandMasker, NormalizedSegment, ResizeNormalize, Rotation,
    TensorTransform,
};
pub use response::{DetectionResponse, ErrorResponse};
pub use segment::{MotionSegmenter, Segment, SegmenterConfig, Segmentation};
pub use sequence::DEFAULT_SEQUENCE_LENGTH;
