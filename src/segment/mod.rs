//! Motion segmentation.
//!
//! Consecutive frames are compared by mean absolute difference. A run of
//! frames whose score exceeds the threshold becomes a candidate segment; the
//! run closes on the first still frame, and is kept only if it reached the
//! configured minimum length. When nothing survives, the whole video becomes
//! a single segment so there is always something to classify.

mod score;
mod state;

pub use score::{motion_score, MotionStats};
pub use state::{SegmentAction, SegmenterState};

use crate::error::FrameProcessingError;
use crate::frame::Frame;

pub const DEFAULT_MOTION_THRESHOLD: f32 = 5.0;
pub const DEFAULT_MIN_SEGMENT_FRAMES: usize = 1;

#[derive(Clone, Debug, PartialEq)]
pub struct SegmenterConfig {
    /// Scores strictly above this count as motion.
    pub motion_threshold: f32,
    /// Shortest run kept as a segment.
    pub min_segment_frames: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            min_segment_frames: DEFAULT_MIN_SEGMENT_FRAMES,
        }
    }
}

/// Frames believed to contain one gesture. Never empty.
#[derive(Clone, Debug)]
pub struct Segment<'a> {
    frames: Vec<&'a Frame>,
}

impl<'a> Segment<'a> {
    fn new(frames: Vec<&'a Frame>) -> Option<Self> {
        if frames.is_empty() {
            None
        } else {
            Some(Self { frames })
        }
    }

    pub fn frames(&self) -> &[&'a Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Stream positions of the frames in this segment.
    pub fn frame_indices(&self) -> Vec<u64> {
        self.frames.iter().map(|f| f.index).collect()
    }
}

/// Output of one segmentation pass.
#[derive(Debug)]
pub struct Segmentation<'a> {
    pub segments: Vec<Segment<'a>>,
    /// True when no run qualified and the whole video was used instead.
    pub fallback: bool,
    pub stats: MotionStats,
    /// Comparisons skipped because a frame could not be scored.
    pub skipped_comparisons: usize,
}

pub struct MotionSegmenter {
    config: SegmenterConfig,
}

impl MotionSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Partition `frames` into segments.
    ///
    /// Non-empty input always yields at least one segment.
    pub fn segment<'a>(&self, frames: &'a [Frame]) -> Segmentation<'a> {
        let threshold = f64::from(self.config.motion_threshold);
        let min_frames = self.config.min_segment_frames;

        let mut segments = Vec::new();
        let mut state = SegmenterState::new();
        let mut current: Vec<&'a Frame> = Vec::new();
        let mut previous: Option<&'a Frame> = None;
        let mut stats = MotionStats::default();
        let mut skipped_comparisons = 0usize;

        for frame in frames {
            let Some(prev) = previous else {
                previous = Some(frame);
                continue;
            };

            let motion = match motion_score(frame, prev) {
                Ok(motion) => motion,
                Err(cause) => {
                    // The reference frame stays put so the next frame is
                    // compared against the last good one.
                    let err = FrameProcessingError::new(frame.index, cause);
                    log::warn!("skipping motion comparison: {}", err);
                    skipped_comparisons += 1;
                    continue;
                }
            };
            stats.record(motion);

            let (next, action) = state.transition(motion > threshold, min_frames);
            match action {
                SegmentAction::Extend => {
                    log::debug!("motion at frame {} - value: {:.2}", frame.index, motion);
                    current.push(frame);
                }
                SegmentAction::Close => {
                    log::info!(
                        "segment closed at frame {} with {} frames",
                        frame.index,
                        current.len()
                    );
                    segments.extend(Segment::new(std::mem::take(&mut current)));
                }
                SegmentAction::Discard => {
                    log::info!(
                        "discarding run at frame {} - too short ({} frames)",
                        frame.index,
                        current.len()
                    );
                    current.clear();
                }
                SegmentAction::Ignore => {}
            }
            state = next;
            previous = Some(frame);
        }

        if state.finish(min_frames) == SegmentAction::Close {
            log::info!("adding final segment with {} frames", current.len());
            segments.extend(Segment::new(current));
        }

        if stats.count > 0 {
            log::info!(
                "motion analysis - avg: {:.2}, max: {:.2}, min: {:.2} over {} comparisons",
                stats.average(),
                stats.max,
                stats.min,
                stats.count
            );
        }

        let mut fallback = false;
        if segments.is_empty() {
            if let Some(whole) = Segment::new(frames.iter().collect()) {
                log::info!(
                    "no motion segments detected, using entire video ({} frames)",
                    whole.len()
                );
                segments.push(whole);
                fallback = true;
            }
        }
        log::info!("detected {} candidate segments", segments.len());

        Segmentation {
            segments,
            fallback,
            stats,
            skipped_comparisons,
        }
    }
}

impl Default for MotionSegmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn frames_from_levels(levels: &[u8]) -> Result<Vec<Frame>> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| {
                Ok(Frame::filled_rgb(8, 8, [level, level, level])?.with_index(i as u64))
            })
            .collect()
    }

    #[test]
    fn static_video_falls_back_to_whole_video() -> Result<()> {
        let frames = frames_from_levels(&[50; 30])?;
        let result = MotionSegmenter::default().segment(&frames);
        assert!(result.fallback);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].len(), 30);
        Ok(())
    }

    #[test]
    fn burst_in_the_middle_is_one_segment() -> Result<()> {
        let frames = frames_from_levels(&[0, 0, 0, 200, 50, 200, 50, 50, 50, 50])?;
        let result = MotionSegmenter::default().segment(&frames);
        assert!(!result.fallback);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].frame_indices(), vec![3, 4, 5, 6]);
        Ok(())
    }

    #[test]
    fn two_bursts_make_two_segments() -> Result<()> {
        let frames = frames_from_levels(&[0, 100, 0, 0, 0, 100, 0, 100, 100])?;
        let result = MotionSegmenter::default().segment(&frames);
        let indices: Vec<Vec<u64>> = result.segments.iter().map(|s| s.frame_indices()).collect();
        assert_eq!(indices, vec![vec![1, 2], vec![5, 6, 7]]);
        Ok(())
    }

    #[test]
    fn open_run_at_end_is_kept() -> Result<()> {
        let frames = frames_from_levels(&[0, 0, 100, 0, 100])?;
        let result = MotionSegmenter::default().segment(&frames);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].frame_indices(), vec![2, 3, 4]);
        Ok(())
    }

    #[test]
    fn runs_below_minimum_are_dropped() -> Result<()> {
        let segmenter = MotionSegmenter::new(SegmenterConfig {
            min_segment_frames: 3,
            ..Default::default()
        });
        // Run of 2 (dropped), then run of 3 (kept).
        let frames = frames_from_levels(&[0, 100, 0, 0, 100, 0, 100, 100])?;
        let result = segmenter.segment(&frames);
        assert!(!result.fallback);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].frame_indices(), vec![4, 5, 6]);
        Ok(())
    }

    #[test]
    fn constant_motion_closes_at_end_of_stream() -> Result<()> {
        let levels: Vec<u8> = (0..12).map(|i| if i % 2 == 0 { 0 } else { 120 }).collect();
        let frames = frames_from_levels(&levels)?;
        let result = MotionSegmenter::default().segment(&frames);
        assert!(!result.fallback);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].len(), 11);
        Ok(())
    }

    #[test]
    fn unscorable_frame_is_skipped_without_breaking_run() -> Result<()> {
        let mut frames = frames_from_levels(&[0, 100, 0, 100])?;
        frames.insert(2, Frame::filled_rgb(4, 4, [9, 9, 9])?.with_index(99));
        let result = MotionSegmenter::default().segment(&frames);
        assert_eq!(result.skipped_comparisons, 1);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].frame_indices(), vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn single_frame_video_falls_back() -> Result<()> {
        let frames = frames_from_levels(&[10])?;
        let result = MotionSegmenter::default().segment(&frames);
        assert!(result.fallback);
        assert_eq!(result.segments[0].len(), 1);
        assert_eq!(result.stats.count, 0);
        Ok(())
    }

    #[test]
    fn empty_input_yields_no_segments() {
        let result = MotionSegmenter::default().segment(&[]);
        assert!(result.segments.is_empty());
        assert!(!result.fallback);
    }
}
