/// Segmenter state between two frame comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmenterState {
    /// No motion run in progress.
    Idle,
    /// Inside a motion run of `run` consecutive moving frames.
    Accumulating { run: usize },
}

/// What to do with the current frame and the open run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentAction {
    /// Still frame with nothing open.
    Ignore,
    /// Append the frame to the open run.
    Extend,
    /// The run ended and is long enough: emit it as a segment.
    Close,
    /// The run ended too early: drop it.
    Discard,
}

impl SegmenterState {
    pub fn new() -> Self {
        SegmenterState::Idle
    }

    /// Advance on one comparison. `moving` is `motion > threshold`.
    ///
    /// The minimum-length check only happens when a run ends on a still frame;
    /// the still frame itself never joins a segment.
    pub fn transition(&self, moving: bool, min_segment_frames: usize) -> (Self, SegmentAction) {
        match (*self, moving) {
            (SegmenterState::Idle, true) => {
                (SegmenterState::Accumulating { run: 1 }, SegmentAction::Extend)
            }
            (SegmenterState::Accumulating { run }, true) => (
                SegmenterState::Accumulating { run: run + 1 },
                SegmentAction::Extend,
            ),
            (SegmenterState::Accumulating { run }, false) if run >= min_segment_frames => {
                (SegmenterState::Idle, SegmentAction::Close)
            }
            (SegmenterState::Accumulating { .. }, false) => {
                (SegmenterState::Idle, SegmentAction::Discard)
            }
            (SegmenterState::Idle, false) => (SegmenterState::Idle, SegmentAction::Ignore),
        }
    }

    /// End-of-stream decision for whatever run is still open.
    pub fn finish(&self, min_segment_frames: usize) -> SegmentAction {
        match *self {
            SegmenterState::Accumulating { run } if run >= min_segment_frames => {
                SegmentAction::Close
            }
            SegmenterState::Accumulating { .. } => SegmentAction::Discard,
            SegmenterState::Idle => SegmentAction::Ignore,
        }
    }
}

impl Default for SegmenterState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_opens_and_extends_a_run() {
        let (state, action) = SegmenterState::Idle.transition(true, 3);
        assert_eq!(state, SegmenterState::Accumulating { run: 1 });
        assert_eq!(action, SegmentAction::Extend);

        let (state, action) = state.transition(true, 3);
        assert_eq!(state, SegmenterState::Accumulating { run: 2 });
        assert_eq!(action, SegmentAction::Extend);
    }

    #[test]
    fn short_run_is_discarded() {
        let state = SegmenterState::Accumulating { run: 2 };
        let (next, action) = state.transition(false, 3);
        assert_eq!(next, SegmenterState::Idle);
        assert_eq!(action, SegmentAction::Discard);
    }

    #[test]
    fn long_enough_run_closes() {
        let state = SegmenterState::Accumulating { run: 3 };
        let (next, action) = state.transition(false, 3);
        assert_eq!(next, SegmenterState::Idle);
        assert_eq!(action, SegmentAction::Close);
    }

    #[test]
    fn idle_still_frame_is_ignored() {
        assert_eq!(
            SegmenterState::Idle.transition(false, 1),
            (SegmenterState::Idle, SegmentAction::Ignore)
        );
    }

    #[test]
    fn finish_applies_minimum() {
        assert_eq!(
            SegmenterState::Accumulating { run: 1 }.finish(1),
            SegmentAction::Close
        );
        assert_eq!(
            SegmenterState::Accumulating { run: 1 }.finish(2),
            SegmentAction::Discard
        );
        assert_eq!(SegmenterState::Idle.finish(0), SegmentAction::Ignore);
    }
}
