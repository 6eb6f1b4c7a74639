//! Container decoding using FFmpeg.
//!
//! ffmpeg opens paths, so the payload is spooled to a request-scoped temp
//! file owned by the source. The file is removed when the source is dropped,
//! on success and failure alike.
//!
//! Frames are emitted as packed BGR; the preprocessing chain converts them
//! to RGB.

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;
use tempfile::NamedTempFile;

use super::{FrameSource, StreamProperties};
use crate::frame::{Frame, PixelFormat};

pub(crate) struct FfmpegFrameSource {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    properties: StreamProperties,
    eof_sent: bool,
    // Declared last: dropped after the demuxer has closed it.
    spool: NamedTempFile,
}

impl FfmpegFrameSource {
    pub(crate) fn open(payload: &[u8]) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;

        let mut spool = tempfile::Builder::new()
            .prefix("sign-detect-")
            .suffix(".video")
            .tempfile()
            .context("create request spool file")?;
        spool.write_all(payload).context("write request spool file")?;
        spool.flush().context("flush request spool file")?;

        let input = ffmpeg::format::input(&spool.path())
            .context("payload is not a readable video container")?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("payload has no video track"))?;
        let stream_index = input_stream.index();

        let rate = input_stream.avg_frame_rate();
        let frame_rate = if rate.numerator() > 0 && rate.denominator() > 0 {
            f64::from(rate)
        } else {
            0.0
        };
        let properties = StreamProperties {
            frame_rate,
            frame_count: input_stream.frames().max(0) as u64,
        };

        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::BGR24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::info!(
            "video properties - fps: {:.2}, frames: {}, duration: {:.2}s",
            properties.frame_rate,
            properties.frame_count,
            properties.duration_secs()
        );

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            properties,
            eof_sent: false,
            spool,
        })
    }

    fn convert(&mut self, decoded: &ffmpeg::frame::Video) -> Result<Frame> {
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb_frame)
            .context("scale frame to BGR")?;
        let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;
        Frame::new(pixels, width, height, PixelFormat::Bgr24)
    }
}

impl FrameSource for FfmpegFrameSource {
    fn properties(&self) -> StreamProperties {
        self.properties
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.convert(&decoded).map(Some);
            }
            if self.eof_sent {
                return Ok(None);
            }

            let stream_index = self.stream_index;
            let packet = self
                .input
                .packets()
                .find(|(stream, _)| stream.index() == stream_index)
                .map(|(_, packet)| packet);

            match packet {
                Some(packet) => {
                    // A corrupt packet costs the frames in it, not the stream.
                    self.decoder
                        .send_packet(&packet)
                        .context("send packet to ffmpeg decoder")?;
                }
                None => {
                    self.eof_sent = true;
                    self.decoder.send_eof().context("flush ffmpeg decoder")?;
                    log::debug!("ffmpeg input drained ({})", self.spool.path().display());
                }
            }
        }
    }
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        let len = row_bytes * height as usize;
        let pixels = data
            .get(..len)
            .context("ffmpeg frame is shorter than its geometry")?;
        return Ok((pixels.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
