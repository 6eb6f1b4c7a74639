//! Frame preprocessing.
//!
//! Each selected frame goes through a fixed chain: orientation correction,
//! conversion to RGB, masking to a single grayscale channel, then tensor
//! normalization. Masking and normalization are capabilities supplied by the
//! caller (`HandMasker`, `TensorTransform`); the crate ships plain defaults.
//!
//! A frame whose chain fails is dropped from its segment. The survivors are
//! padded with zero tensors up to the sequence length; a segment with no
//! survivors is abandoned.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Rgb};
use serde::Deserialize;

use crate::error::{FrameProcessingError, SegmentFailure};
use crate::frame::{Frame, FrameTensor, GrayFrame, PixelFormat};

pub const DEFAULT_INPUT_WIDTH: u32 = 112;
pub const DEFAULT_INPUT_HEIGHT: u32 = 112;
pub const DEFAULT_NORMALIZE_MEAN: f32 = 0.5;
pub const DEFAULT_NORMALIZE_STD: f32 = 0.5;

/// Fixed orientation correction applied before masking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    None,
    #[default]
    Clockwise90,
    CounterClockwise90,
    Half,
}

impl std::str::FromStr for Rotation {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Rotation::None),
            "clockwise90" => Ok(Rotation::Clockwise90),
            "counter_clockwise90" => Ok(Rotation::CounterClockwise90),
            "half" => Ok(Rotation::Half),
            other => Err(anyhow!("unknown rotation '{}'", other)),
        }
    }
}

/// Masking capability: RGB frame in, single-channel masked frame out.
pub trait HandMasker: Send + Sync {
    fn name(&self) -> &'static str;

    /// `rgb` is always `PixelFormat::Rgb24`.
    fn mask_and_grayscale(&self, rgb: &Frame) -> Result<GrayFrame>;
}

/// Tensor capability: masked frame in, fixed-shape tensor out.
pub trait TensorTransform: Send + Sync {
    fn normalize(&self, gray: &GrayFrame) -> Result<FrameTensor>;
}

/// Luma extraction without hand segmentation.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrayscaleMasker;

impl HandMasker for GrayscaleMasker {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn mask_and_grayscale(&self, rgb: &Frame) -> Result<GrayFrame> {
        if rgb.format != PixelFormat::Rgb24 {
            return Err(anyhow!("masker expects RGB input, got {:?}", rgb.format));
        }
        let luma = rgb
            .pixels()
            .chunks_exact(3)
            .map(|p| ((p[0] as u32 * 299 + p[1] as u32 * 587 + p[2] as u32 * 114) / 1000) as u8)
            .collect();
        GrayFrame::new(luma, rgb.width, rgb.height)
    }
}

/// Bilinear resize to the model input size, scale to `[0, 1]`, then
/// `(x - mean) / std`. Output shape is `[1, height, width]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeNormalize {
    pub width: u32,
    pub height: u32,
    pub mean: f32,
    pub std: f32,
}

impl Default for ResizeNormalize {
    fn default() -> Self {
        Self {
            width: DEFAULT_INPUT_WIDTH,
            height: DEFAULT_INPUT_HEIGHT,
            mean: DEFAULT_NORMALIZE_MEAN,
            std: DEFAULT_NORMALIZE_STD,
        }
    }
}

impl TensorTransform for ResizeNormalize {
    fn normalize(&self, gray: &GrayFrame) -> Result<FrameTensor> {
        if self.std <= 0.0 {
            return Err(anyhow!("normalization std must be positive"));
        }
        let image = GrayImage::from_raw(gray.width, gray.height, gray.data.clone())
            .ok_or_else(|| anyhow!("gray frame buffer does not match its geometry"))?;
        let resized = if image.dimensions() == (self.width, self.height) {
            image
        } else {
            imageops::resize(&image, self.width, self.height, FilterType::Triangle)
        };
        let data = resized
            .into_raw()
            .into_iter()
            .map(|v| (v as f32 / 255.0 - self.mean) / self.std)
            .collect();
        FrameTensor::new([1, self.height as usize, self.width as usize], data)
    }
}

/// Rotate a frame, keeping its pixel layout.
pub fn orient(frame: &Frame, rotation: Rotation) -> Result<Frame> {
    if rotation == Rotation::None {
        return Ok(frame.clone());
    }
    let format = frame.format;
    // Channel order is irrelevant to rotation, so BGR rides in an Rgb buffer.
    let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(frame.width, frame.height, frame.pixels().to_vec())
            .ok_or_else(|| anyhow!("frame buffer does not match its geometry"))?;
    let rotated = match rotation {
        Rotation::Clockwise90 => imageops::rotate90(&buffer),
        Rotation::CounterClockwise90 => imageops::rotate270(&buffer),
        Rotation::Half => imageops::rotate180(&buffer),
        Rotation::None => buffer,
    };
    let (width, height) = rotated.dimensions();
    Ok(Frame::new(rotated.into_raw(), width, height, format)?.with_index(frame.index))
}

/// Exactly `sequence_length` tensors: real transforms first, then padding.
#[derive(Clone, Debug)]
pub struct NormalizedSegment {
    tensors: Vec<FrameTensor>,
    real_frames: usize,
    skipped_frames: usize,
}

impl NormalizedSegment {
    pub fn tensors(&self) -> &[FrameTensor] {
        &self.tensors
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Entries produced from real frames.
    pub fn real_frames(&self) -> usize {
        self.real_frames
    }

    /// Frames dropped because their chain failed.
    pub fn skipped_frames(&self) -> usize {
        self.skipped_frames
    }

    pub fn padding(&self) -> &[FrameTensor] {
        &self.tensors[self.real_frames..]
    }
}

#[derive(Clone)]
pub struct FramePreprocessor {
    rotation: Rotation,
    masker: Arc<dyn HandMasker>,
    transform: Arc<dyn TensorTransform>,
}

impl FramePreprocessor {
    pub fn new(
        rotation: Rotation,
        masker: Arc<dyn HandMasker>,
        transform: Arc<dyn TensorTransform>,
    ) -> Self {
        Self {
            rotation,
            masker,
            transform,
        }
    }

    /// Run the full chain on one frame.
    pub fn process_frame(&self, frame: &Frame) -> Result<FrameTensor, FrameProcessingError> {
        self.chain(frame)
            .map_err(|cause| FrameProcessingError::new(frame.index, cause))
    }

    fn chain(&self, frame: &Frame) -> Result<FrameTensor> {
        let oriented = orient(frame, self.rotation).context("orientation correction")?;
        let rgb = oriented.to_rgb().context("colour conversion")?;
        let masked = self
            .masker
            .mask_and_grayscale(&rgb)
            .with_context(|| format!("{} masking", self.masker.name()))?;
        self.transform
            .normalize(&masked)
            .context("tensor normalization")
    }

    /// Preprocess the selected frames of one segment and pad to length.
    pub fn prepare_segment(
        &self,
        selected: &[&Frame],
        sequence_length: usize,
    ) -> Result<NormalizedSegment, SegmentFailure> {
        let (mut tensors, skipped) = selected.iter().take(sequence_length).fold(
            (Vec::with_capacity(sequence_length), 0usize),
            |(mut ok, skipped), frame| match self.process_frame(frame) {
                Ok(tensor)
                    if ok
                        .first()
                        .map_or(true, |first: &FrameTensor| first.shape == tensor.shape) =>
                {
                    ok.push(tensor);
                    (ok, skipped)
                }
                Ok(tensor) => {
                    log::warn!(
                        "dropping frame {}: tensor shape {:?} differs from segment shape",
                        frame.index,
                        tensor.shape
                    );
                    (ok, skipped + 1)
                }
                Err(err) => {
                    log::warn!("dropping {}", err);
                    (ok, skipped + 1)
                }
            },
        );

        let Some(first) = tensors.first() else {
            return Err(SegmentFailure::NoValidFrames);
        };
        let real_frames = tensors.len();
        let pad = FrameTensor::zeros_like(first);
        tensors.resize(sequence_length, pad);

        Ok(NormalizedSegment {
            tensors,
            real_frames,
            skipped_frames: skipped,
        })
    }
}

impl Default for FramePreprocessor {
    fn default() -> Self {
        Self::new(
            Rotation::default(),
            Arc::new(GrayscaleMasker),
            Arc::new(ResizeNormalize::default()),
        )
    }
}
