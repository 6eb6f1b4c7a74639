//! Default payload decoder.
//!
//! Routes `stub://` payloads to the synthetic source and everything else to
//! ffmpeg. Without the ingest-ffmpeg feature only synthetic payloads open.

use super::synthetic::SyntheticSource;
use super::{FrameSource, VideoDecoder};
use crate::error::DetectError;

#[cfg(feature = "ingest-ffmpeg")]
use super::file_ffmpeg::FfmpegFrameSource;

const STUB_PREFIX: &[u8] = b"stub://";

#[derive(Clone, Copy, Debug, Default)]
pub struct PayloadDecoder;

impl PayloadDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl VideoDecoder for PayloadDecoder {
    fn name(&self) -> &'static str {
        "payload"
    }

    fn open(&self, payload: &[u8]) -> Result<Box<dyn FrameSource>, DetectError> {
        if payload.is_empty() {
            return Err(DetectError::Decode("payload is empty".to_string()));
        }
        if payload.starts_with(STUB_PREFIX) {
            let text = std::str::from_utf8(payload)
                .map_err(|_| DetectError::Decode("synthetic payload is not UTF-8".to_string()))?;
            let source =
                SyntheticSource::parse(text).map_err(|e| DetectError::Decode(format!("{:#}", e)))?;
            log::info!("opened synthetic payload {}", text.trim());
            return Ok(Box::new(source));
        }

        #[cfg(feature = "ingest-ffmpeg")]
        {
            let source = FfmpegFrameSource::open(payload)
                .map_err(|e| DetectError::Decode(format!("{:#}", e)))?;
            Ok(Box::new(source))
        }
        #[cfg(not(feature = "ingest-ffmpeg"))]
        {
            Err(DetectError::Decode(
                "video decoding requires the ingest-ffmpeg feature".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::read_all_frames;

    #[test]
    fn empty_payload_is_decode_error() {
        assert!(matches!(
            PayloadDecoder::new().open(b""),
            Err(DetectError::Decode(_))
        ));
    }

    #[test]
    fn zero_frame_stream_is_empty_input() -> anyhow::Result<()> {
        let mut source = PayloadDecoder::new()
            .open(b"stub://static?frames=0")
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        assert!(matches!(
            read_all_frames(source.as_mut()),
            Err(DetectError::EmptyInput)
        ));
        Ok(())
    }

    #[test]
    fn bad_stub_payload_is_decode_error() {
        assert!(matches!(
            PayloadDecoder::new().open(b"stub://nothing"),
            Err(DetectError::Decode(_))
        ));
    }

    #[test]
    fn oversized_stub_payload_is_decode_error() {
        assert!(matches!(
            PayloadDecoder::new().open(b"stub://static?frames=1000000000"),
            Err(DetectError::Decode(_))
        ));
        assert!(PayloadDecoder::new()
            .open(b"stub://static?frames=10000")
            .is_ok());
    }

    #[cfg(not(feature = "ingest-ffmpeg"))]
    #[test]
    fn container_bytes_need_ffmpeg() {
        assert!(matches!(
            PayloadDecoder::new().open(b"\x00\x00\x00\x18ftypmp42"),
            Err(DetectError::Decode(_))
        ));
    }
}
