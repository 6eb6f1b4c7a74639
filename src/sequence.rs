//! Fixed-length resampling of segments.

use crate::frame::Frame;
use crate::segment::Segment;

pub const DEFAULT_SEQUENCE_LENGTH: usize = 16;

/// `count` indices spread evenly over `0..=len-1`, truncated toward zero.
///
/// Integer arithmetic keeps this exact: index `i` is
/// `floor(i * (len - 1) / (count - 1))`, so the first index is 0 and the last
/// is `len - 1`. Short inputs repeat indices.
pub fn sample_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![0];
    }
    let span = len - 1;
    (0..count).map(|i| i * span / (count - 1)).collect()
}

/// Pick exactly `count` frames from a segment in temporal order.
pub fn resample<'s, 'a>(segment: &'s Segment<'a>, count: usize) -> Vec<&'a Frame> {
    let frames = segment.frames();
    sample_indices(frames.len(), count)
        .into_iter()
        .map(|i| frames[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_segment_spans_endpoints() {
        let indices = sample_indices(100, 5);
        assert_eq!(indices, vec![0, 24, 49, 74, 99]);
    }

    #[test]
    fn short_segment_repeats_frames() {
        let indices = sample_indices(3, 6);
        assert_eq!(indices, vec![0, 0, 0, 1, 1, 2]);
    }

    #[test]
    fn single_frame_segment_repeats_it() {
        assert_eq!(sample_indices(1, 4), vec![0, 0, 0, 0]);
    }

    #[test]
    fn length_is_always_count() {
        for len in [1usize, 2, 7, 16, 17, 10_000] {
            for count in [1usize, 8, 16, 30] {
                let indices = sample_indices(len, count);
                assert_eq!(indices.len(), count);
                assert!(indices.windows(2).all(|w| w[0] <= w[1]));
                assert!(indices.iter().all(|&i| i < len));
            }
        }
    }

    #[test]
    fn equal_length_is_identity() {
        assert_eq!(sample_indices(4, 4), vec![0, 1, 2, 3]);
    }
}
