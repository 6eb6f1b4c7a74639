//! Synthetic `stub://` frame source.
//!
//! Payload form: `stub://<pattern>[?frames=N]`
//! - `static`: every frame identical (no motion anywhere)
//! - `gesture`: still lead-in, a burst of alternating frames in the middle
//!   third, still tail
//!
//! Frames are 64x48 RGB at a reported 30 fps. Generation is deterministic.

use anyhow::{anyhow, Result};

use super::{FrameSource, StreamProperties};
use crate::frame::Frame;

pub const SYNTHETIC_WIDTH: u32 = 64;
pub const SYNTHETIC_HEIGHT: u32 = 48;
const SYNTHETIC_FPS: f64 = 30.0;
const DEFAULT_FRAMES: u64 = 30;
/// Upper bound on `frames=N`; every frame is buffered in memory.
pub const MAX_SYNTHETIC_FRAMES: u64 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticPattern {
    Static,
    Gesture,
}

pub struct SyntheticSource {
    pattern: SyntheticPattern,
    total_frames: u64,
    produced: u64,
}

impl SyntheticSource {
    pub fn new(pattern: SyntheticPattern, total_frames: u64) -> Self {
        Self {
            pattern,
            total_frames,
            produced: 0,
        }
    }

    /// Parse a `stub://` payload.
    pub fn parse(payload: &str) -> Result<Self> {
        let rest = payload
            .trim()
            .strip_prefix("stub://")
            .ok_or_else(|| anyhow!("synthetic payload must start with stub://"))?;
        let (name, query) = rest.split_once('?').unwrap_or((rest, ""));
        let pattern = match name {
            "static" => SyntheticPattern::Static,
            "gesture" => SyntheticPattern::Gesture,
            other => return Err(anyhow!("unknown synthetic pattern '{}'", other)),
        };
        let mut total_frames = DEFAULT_FRAMES;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some(("frames", value)) => {
                    total_frames = value
                        .parse()
                        .map_err(|_| anyhow!("frames must be an integer, got '{}'", value))?;
                    if total_frames > MAX_SYNTHETIC_FRAMES {
                        return Err(anyhow!(
                            "frames must be at most {}, got {}",
                            MAX_SYNTHETIC_FRAMES,
                            total_frames
                        ));
                    }
                }
                _ => return Err(anyhow!("unsupported synthetic parameter '{}'", pair)),
            }
        }
        Ok(Self::new(pattern, total_frames))
    }

    fn brightness(&self, position: u64) -> u8 {
        match self.pattern {
            SyntheticPattern::Static => 96,
            SyntheticPattern::Gesture => {
                let third = self.total_frames / 3;
                let in_burst = position >= third && position < self.total_frames - third;
                if in_burst && position % 2 == 0 {
                    200
                } else if in_burst {
                    40
                } else {
                    96
                }
            }
        }
    }
}

impl FrameSource for SyntheticSource {
    fn properties(&self) -> StreamProperties {
        StreamProperties {
            frame_rate: SYNTHETIC_FPS,
            frame_count: self.total_frames,
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.produced >= self.total_frames {
            return Ok(None);
        }
        let level = self.brightness(self.produced);
        self.produced += 1;
        let frame = Frame::filled_rgb(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, [level, level, level])?;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pattern_and_frame_count() -> Result<()> {
        let source = SyntheticSource::parse("stub://gesture?frames=12")?;
        assert_eq!(source.pattern, SyntheticPattern::Gesture);
        assert_eq!(source.properties().frame_count, 12);
        assert!(SyntheticSource::parse("stub://wobble").is_err());
        assert!(SyntheticSource::parse("stub://static?frames=x").is_err());
        Ok(())
    }

    #[test]
    fn gesture_burst_sits_in_middle_third() -> Result<()> {
        let mut source = SyntheticSource::parse("stub://gesture?frames=9")?;
        let mut levels = Vec::new();
        while let Some(frame) = source.next_frame()? {
            levels.push(frame.pixels()[0]);
        }
        assert_eq!(levels, vec![96, 96, 96, 40, 200, 40, 96, 96, 96]);
        Ok(())
    }
}
