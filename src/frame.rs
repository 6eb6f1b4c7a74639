//! Frame types shared by every pipeline stage.
//!
//! - `Frame`: a decoded raster in capture order. Pixel bytes are private and
//!   immutable once the frame source hands the frame over.
//! - `GrayFrame`: single-channel raster produced by the masking step.
//! - `FrameTensor`: normalized f32 tensor fed to the classifier, shaped
//!   `[channels, height, width]`.

use anyhow::{anyhow, Result};

use crate::ingest::normalize_to_rgb;

/// Pixel layout of a decoded frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 8-bit RGB.
    Rgb24,
    /// Packed 8-bit BGR (OpenCV-style capture order).
    Bgr24,
}

impl PixelFormat {
    /// Expected byte length of a `width` x `height` raster in this layout.
    pub fn frame_len(self, width: u32, height: u32) -> Option<usize> {
        (width as usize).checked_mul(height as usize)?.checked_mul(3)
    }
}

/// A decoded video frame.
///
/// There is no mutable access to the pixel bytes: transforms produce new
/// frames or new rasters instead of editing in place.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Position in the source stream (capture order, skipped frames leave gaps).
    pub index: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        let expected = format
            .frame_len(width, height)
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "{:?} frame length mismatch: expected {}, got {}",
                format,
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
            index: 0,
        })
    }

    /// Solid-colour RGB frame. Mostly useful for synthetic sources and tests.
    pub fn filled_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        let data = rgb.iter().copied().cycle().take(pixels * 3).collect();
        Self::new(data, width, height, PixelFormat::Rgb24)
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Same geometry and layout, so byte-wise comparison is meaningful.
    pub fn is_comparable(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.format == other.format
    }

    /// Packed RGB copy of this frame regardless of the source layout.
    pub fn to_rgb(&self) -> Result<Frame> {
        if self.format == PixelFormat::Rgb24 {
            return Ok(self.clone());
        }
        let data = normalize_to_rgb(&self.data, self.width, self.height, self.format)?;
        Ok(Frame::new(data, self.width, self.height, PixelFormat::Rgb24)?.with_index(self.index))
    }
}

/// Single-channel 8-bit raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl GrayFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| anyhow!("gray frame dimensions overflow"))?;
        if data.len() != expected || expected == 0 {
            return Err(anyhow!(
                "gray frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

/// Normalized frame tensor, `[channels, height, width]` in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameTensor {
    pub shape: [usize; 3],
    pub data: Vec<f32>,
}

impl FrameTensor {
    pub fn new(shape: [usize; 3], data: Vec<f32>) -> Result<Self> {
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(anyhow!(
                "tensor shape {:?} needs {} values, got {}",
                shape,
                expected,
                data.len()
            ));
        }
        Ok(Self { shape, data })
    }

    /// Padding tensor: same shape, every element zero.
    pub fn zeros_like(other: &FrameTensor) -> Self {
        Self {
            shape: other.shape,
            data: vec![0.0; other.data.len()],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|v| *v == 0.0)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_wrong_length() {
        assert!(Frame::new(vec![0u8; 10], 2, 2, PixelFormat::Rgb24).is_err());
        assert!(Frame::new(vec![0u8; 12], 2, 2, PixelFormat::Rgb24).is_ok());
        assert!(Frame::new(vec![], 0, 0, PixelFormat::Rgb24).is_err());
    }

    #[test]
    fn bgr_frame_converts_to_rgb() -> Result<()> {
        let frame = Frame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, PixelFormat::Bgr24)?.with_index(7);
        let rgb = frame.to_rgb()?;
        assert_eq!(rgb.format, PixelFormat::Rgb24);
        assert_eq!(rgb.pixels(), &[3, 2, 1, 6, 5, 4]);
        assert_eq!(rgb.index, 7);
        Ok(())
    }

    #[test]
    fn filled_frame_has_expected_bytes() -> Result<()> {
        let frame = Frame::filled_rgb(3, 2, [10, 20, 30])?;
        assert_eq!(frame.pixels().len(), 18);
        assert_eq!(&frame.pixels()[..6], &[10, 20, 30, 10, 20, 30]);
        Ok(())
    }

    #[test]
    fn zeros_like_keeps_shape() -> Result<()> {
        let tensor = FrameTensor::new([1, 2, 2], vec![0.5, -0.5, 1.0, 0.0])?;
        let pad = FrameTensor::zeros_like(&tensor);
        assert_eq!(pad.shape, [1, 2, 2]);
        assert!(pad.is_zero());
        assert!(!tensor.is_zero());
        Ok(())
    }
}
