//! Frame sources.
//!
//! A `VideoDecoder` opens a request payload and yields a `FrameSource`: a
//! single-pass, finite sequence of frames in capture order. Sources:
//! - ffmpeg-backed container decoding (feature: ingest-ffmpeg)
//! - synthetic `stub://` payloads (testing, demos)
//! - in-memory frame lists (testing)
//!
//! A frame the backend cannot read is reported as an `Err` from
//! `next_frame` and skipped by `read_all_frames`; it never ends the stream.
//! Implementations must make progress on every call so the stream terminates.

#[cfg(feature = "ingest-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod memory;
mod normalize;
pub mod payload;
pub mod synthetic;

use anyhow::Result;

use crate::error::DetectError;
use crate::frame::Frame;

pub use memory::{MemoryDecoder, MemorySource};
pub(crate) use normalize::normalize_to_rgb;
pub use payload::PayloadDecoder;
pub use synthetic::SyntheticSource;

/// Best-effort stream properties. Zero means the container did not say.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StreamProperties {
    pub frame_rate: f64,
    pub frame_count: u64,
}

impl StreamProperties {
    pub fn duration_secs(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.frame_count as f64 / self.frame_rate
        } else {
            0.0
        }
    }
}

/// Single-pass frame sequence.
pub trait FrameSource {
    fn properties(&self) -> StreamProperties;

    /// `Ok(Some(frame))` for the next frame, `Ok(None)` at end of stream,
    /// `Err` for a frame the decoder could not read.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Open capability: payload bytes in, frame source out.
pub trait VideoDecoder: Send + Sync {
    fn name(&self) -> &'static str;

    fn open(&self, payload: &[u8]) -> Result<Box<dyn FrameSource>, DetectError>;
}

/// Drain a source into memory, skipping unreadable frames.
///
/// Frames are stamped with their position in the stream. Zero frames is
/// `EmptyInput`, distinct from a payload that could not be opened.
pub fn read_all_frames(source: &mut dyn FrameSource) -> Result<Vec<Frame>, DetectError> {
    let mut frames = Vec::new();
    let mut position = 0u64;
    let mut skipped = 0u64;

    loop {
        match source.next_frame() {
            Ok(Some(frame)) => frames.push(frame.with_index(position)),
            Ok(None) => break,
            Err(e) => {
                log::warn!("skipping unreadable frame at position {}: {:#}", position, e);
                skipped += 1;
            }
        }
        position += 1;
    }

    if frames.is_empty() {
        log::error!("no frames extracted from video ({} unreadable)", skipped);
        return Err(DetectError::EmptyInput);
    }
    log::info!(
        "read {} frames ({} unreadable skipped)",
        frames.len(),
        skipped
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_needs_frame_rate() {
        let props = StreamProperties {
            frame_rate: 30.0,
            frame_count: 90,
        };
        assert_eq!(props.duration_secs(), 3.0);
        let unknown = StreamProperties {
            frame_rate: 0.0,
            frame_count: 90,
        };
        assert_eq!(unknown.duration_secs(), 0.0);
    }

    #[test]
    fn unreadable_frames_are_skipped_and_positions_kept() -> anyhow::Result<()> {
        let frame = Frame::filled_rgb(2, 2, [1, 2, 3])?;
        let mut source = MemorySource::new(vec![
            Some(frame.clone()),
            None,
            Some(frame.clone()),
            None,
            Some(frame),
        ]);
        let frames = read_all_frames(&mut source)?;
        let positions: Vec<u64> = frames.iter().map(|f| f.index).collect();
        assert_eq!(positions, vec![0, 2, 4]);
        Ok(())
    }

    #[test]
    fn all_unreadable_is_empty_input() {
        let mut source = MemorySource::new(vec![None, None]);
        assert!(matches!(
            read_all_frames(&mut source),
            Err(DetectError::EmptyInput)
        ));
    }
}
