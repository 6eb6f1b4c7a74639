use anyhow::{anyhow, Result};

use crate::frame::PixelFormat;

/// Convert a raster in any supported layout to packed RGB.
pub(crate) fn normalize_to_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    let expected = format
        .frame_len(width, height)
        .ok_or_else(|| anyhow!("{:?} frame dimensions overflow", format))?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "{:?} frame length mismatch: expected {}, got {}",
            format,
            expected,
            pixels.len()
        ));
    }
    match format {
        PixelFormat::Rgb24 => Ok(pixels.to_vec()),
        PixelFormat::Bgr24 => Ok(pixels
            .chunks_exact(3)
            .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]])
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_channels_are_swapped() -> Result<()> {
        let rgb = normalize_to_rgb(&[0, 0, 255], 1, 1, PixelFormat::Bgr24)?;
        assert_eq!(rgb, vec![255, 0, 0]);
        Ok(())
    }

    #[test]
    fn length_is_validated() {
        assert!(normalize_to_rgb(&[1u8; 8], 1, 3, PixelFormat::Rgb24).is_err());
    }
}
