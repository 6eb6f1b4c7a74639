use std::sync::Arc;

use anyhow::{anyhow, Result};

use sign_detect::classify::backends::StubClassifier;
use sign_detect::sequence::{resample, sample_indices};
use sign_detect::{
    ClassLabels, DetectError, DetectionReport, Frame, FramePreprocessor, MemoryDecoder,
    MotionSegmenter, PayloadDecoder, PipelineSettings, SegmentClassifier, SignDetector,
};

fn labels(count: usize) -> Result<Arc<ClassLabels>> {
    Ok(Arc::new(ClassLabels::numbered(count)?))
}

fn detector(classifier: StubClassifier, classes: usize, threshold: f32) -> Result<SignDetector> {
    let settings = PipelineSettings {
        confidence_threshold: threshold,
        ..Default::default()
    };
    SignDetector::new(
        settings,
        FramePreprocessor::default(),
        SegmentClassifier::new(Arc::new(classifier), labels(classes)?),
    )
    .map_err(|e| anyhow!("{}", e))
}

fn frames(levels: &[u8]) -> Result<Vec<Frame>> {
    levels
        .iter()
        .enumerate()
        .map(|(i, &v)| Ok(Frame::filled_rgb(16, 12, [v, v, v])?.with_index(i as u64)))
        .collect()
}

fn run(detector: &SignDetector, payload: &[u8]) -> Result<DetectionReport, DetectError> {
    detector.detect_video(&PayloadDecoder::new(), payload)
}

#[test]
fn same_input_gives_same_result() -> Result<()> {
    let detector = detector(StubClassifier::bands(4), 4, 0.05)?;
    let first = run(&detector, b"stub://gesture?frames=60").map_err(|e| anyhow!("{}", e))?;
    let second = run(&detector, b"stub://gesture?frames=60").map_err(|e| anyhow!("{}", e))?;
    assert_eq!(first.detected_signs, second.detected_signs);
    assert_eq!(first.stats, second.stats);
    assert!(!first.stats.fallback);
    assert_eq!(first.stats.segments_found, 1);
    Ok(())
}

#[test]
fn normalized_length_is_fixed_for_any_segment_length() -> Result<()> {
    let preprocessor = FramePreprocessor::default();
    for len in [1usize, 7, 16, 10_000] {
        let input: Vec<Frame> = (0..len)
            .map(|i| Ok(Frame::filled_rgb(2, 2, [30, 30, 30])?.with_index(i as u64)))
            .collect::<Result<_>>()?;
        let segmentation = MotionSegmenter::default().segment(&input);
        let segment = &segmentation.segments[0];
        assert_eq!(segment.len(), len);

        let selected = resample(segment, 16);
        assert_eq!(selected.len(), 16);
        let normalized = preprocessor
            .prepare_segment(&selected, 16)
            .map_err(|e| anyhow!("{}", e))?;
        assert_eq!(normalized.len(), 16);
    }
    Ok(())
}

#[test]
fn non_empty_input_always_segments() -> Result<()> {
    let cases: [&[u8]; 5] = [
        &[10],
        &[10, 10, 10],
        &[0, 255, 0, 255, 0, 255],
        &[0, 100, 100, 100],
        &[0, 1, 2, 3, 4, 5],
    ];
    for levels in cases {
        let input = frames(levels)?;
        let segmentation = MotionSegmenter::default().segment(&input);
        assert!(!segmentation.segments.is_empty(), "no segment for {:?}", levels);
        assert!(segmentation.segments.iter().all(|s| !s.is_empty()));
    }
    Ok(())
}

#[test]
fn raising_threshold_never_adds_detections() -> Result<()> {
    // Three separated bursts at different brightness.
    let input = frames(&[0, 60, 0, 0, 0, 150, 0, 0, 0, 250, 0, 0])?;
    let mut previous = usize::MAX;
    for threshold in [0.0f32, 0.2, 0.4, 0.6, 0.8, 0.95, 1.0] {
        let detector = detector(StubClassifier::bands(5), 5, threshold)?;
        let count = match detector.detect_frames(&input) {
            Ok(report) => report.detected_signs.len(),
            Err(DetectError::NoDetection) => 0,
            Err(e) => return Err(anyhow!("unexpected error: {}", e)),
        };
        assert!(count <= previous, "threshold {} grew the result", threshold);
        previous = count;
    }
    assert_eq!(previous, 0);
    Ok(())
}

#[test]
fn short_segment_is_padded_after_real_frames() -> Result<()> {
    let input = frames(&[200, 200, 200])?;
    let refs: Vec<&Frame> = input.iter().collect();
    let normalized = FramePreprocessor::default()
        .prepare_segment(&refs, 8)
        .map_err(|e| anyhow!("{}", e))?;
    assert_eq!(normalized.len(), 8);
    assert_eq!(normalized.real_frames(), 3);
    assert!(normalized.tensors()[..3].iter().all(|t| !t.is_zero()));
    assert!(normalized.tensors()[3..].iter().all(|t| t.is_zero()));
    assert!(normalized
        .tensors()
        .iter()
        .all(|t| t.shape == normalized.tensors()[0].shape));
    Ok(())
}

#[test]
fn identical_frames_fall_back_to_whole_video() -> Result<()> {
    let input = frames(&[80; 30])?;
    let segmentation = MotionSegmenter::default().segment(&input);
    assert!(segmentation.fallback);
    assert_eq!(segmentation.segments.len(), 1);
    assert_eq!(segmentation.segments[0].len(), 30);

    let detector = detector(StubClassifier::bands(3), 3, 0.05)?;
    let report = detector.detect_frames(&input).map_err(|e| anyhow!("{}", e))?;
    assert!(report.stats.fallback);
    assert_eq!(report.detected_signs.len(), 1);
    Ok(())
}

#[test]
fn burst_in_frames_three_to_six_is_the_only_segment() -> Result<()> {
    let input = frames(&[20, 20, 20, 220, 20, 220, 20, 20, 20, 20])?;
    let segmentation = MotionSegmenter::default().segment(&input);
    assert!(!segmentation.fallback);
    assert_eq!(segmentation.segments.len(), 1);
    assert_eq!(segmentation.segments[0].frame_indices(), vec![3, 4, 5, 6]);
    Ok(())
}

#[test]
fn low_confidence_everywhere_is_no_detection() -> Result<()> {
    // Top class at 0.02, the other 59 share the rest slightly below it.
    let detector = detector(StubClassifier::with_confidence(60, 7, 0.02)?, 60, 0.05)?;
    let input = frames(&[0, 120, 0, 0, 0, 200, 0, 0])?;
    assert!(matches!(
        detector.detect_frames(&input),
        Err(DetectError::NoDetection)
    ));
    Ok(())
}

#[test]
fn empty_stream_is_distinct_from_unopenable_payload() -> Result<()> {
    let detector = detector(StubClassifier::bands(2), 2, 0.05)?;
    assert!(matches!(
        run(&detector, b"stub://static?frames=0"),
        Err(DetectError::EmptyInput)
    ));
    assert!(matches!(run(&detector, b""), Err(DetectError::Decode(_))));
    assert!(matches!(
        run(&detector, b"stub://not-a-pattern"),
        Err(DetectError::Decode(_))
    ));
    Ok(())
}

#[test]
fn unreadable_frames_are_skipped() -> Result<()> {
    let mut stream: Vec<Option<Frame>> = frames(&[0, 0, 200, 0, 200, 0, 0])?
        .into_iter()
        .map(Some)
        .collect();
    stream.insert(3, None);
    let decoder = MemoryDecoder::with_gaps(stream);
    let detector = detector(StubClassifier::bands(2), 2, 0.05)?;
    let report = detector
        .detect_video(&decoder, b"memory")
        .map_err(|e| anyhow!("{}", e))?;
    assert_eq!(report.stats.frames_read, 7);
    assert_eq!(report.detected_signs.len(), 1);

    let all_gaps = MemoryDecoder::with_gaps(vec![None, None]);
    assert!(matches!(
        detector.detect_video(&all_gaps, b"memory"),
        Err(DetectError::EmptyInput)
    ));
    Ok(())
}

#[test]
fn sample_indices_cover_both_ends() {
    let indices = sample_indices(40, 16);
    assert_eq!(indices.first(), Some(&0));
    assert_eq!(indices.last(), Some(&39));
}
