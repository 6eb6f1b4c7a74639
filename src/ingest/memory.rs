//! In-memory frame sources for tests and embedding callers that already hold
//! decoded frames.

use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use super::{FrameSource, StreamProperties, VideoDecoder};
use crate::error::DetectError;
use crate::frame::Frame;

/// Frame source over a prepared list. `None` entries behave like frames the
/// decoder could not read.
pub struct MemorySource {
    frames: VecDeque<Option<Frame>>,
    properties: StreamProperties,
}

impl MemorySource {
    pub fn new(frames: Vec<Option<Frame>>) -> Self {
        let properties = StreamProperties {
            frame_rate: 0.0,
            frame_count: frames.len() as u64,
        };
        Self {
            frames: frames.into(),
            properties,
        }
    }

    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.properties.frame_rate = frame_rate;
        self
    }
}

impl FrameSource for MemorySource {
    fn properties(&self) -> StreamProperties {
        self.properties
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.frames.pop_front() {
            Some(Some(frame)) => Ok(Some(frame)),
            Some(None) => Err(anyhow!("frame could not be decoded")),
            None => Ok(None),
        }
    }
}

/// Decoder that hands out a copy of a fixed frame list for any non-empty
/// payload.
pub struct MemoryDecoder {
    frames: Vec<Option<Frame>>,
    frame_rate: f64,
}

impl MemoryDecoder {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into_iter().map(Some).collect(),
            frame_rate: 30.0,
        }
    }

    /// Include unreadable entries (`None`) in the stream.
    pub fn with_gaps(frames: Vec<Option<Frame>>) -> Self {
        Self {
            frames,
            frame_rate: 30.0,
        }
    }
}

impl VideoDecoder for MemoryDecoder {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn open(&self, payload: &[u8]) -> Result<Box<dyn FrameSource>, DetectError> {
        if payload.is_empty() {
            return Err(DetectError::Decode("payload is empty".to_string()));
        }
        Ok(Box::new(
            MemorySource::new(self.frames.clone()).with_frame_rate(self.frame_rate),
        ))
    }
}
