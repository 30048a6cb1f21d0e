//! Conversion between image files and [`PixelMatrix`].
//!
//! Decoding and encoding are delegated to the `image` crate. This module
//! only decides how a decoded color type maps to per-channel bit depths
//! and how samples are rescaled when written back.

use super::matrix::{depth_mask, PixelMatrix};
use crate::error::{Error, Result};
use image::{ColorType, DynamicImage, ImageBuffer};
use std::path::Path;

/// How samples are mapped to the output range when saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scaling {
    /// `0..2^depth` of each channel maps onto the full output range.
    #[default]
    Depth,
    /// The smallest and largest sample in the matrix map onto the full
    /// output range.
    Stretch,
}

/// Returns the per-channel bit depths for a decoded color type.
pub fn channel_bits(color: ColorType) -> Result<Vec<u8>> {
    let (channels, bits) = match color {
        ColorType::L8 => (1, 8),
        ColorType::La8 => (2, 8),
        ColorType::Rgb8 => (3, 8),
        ColorType::Rgba8 => (4, 8),
        ColorType::L16 => (1, 16),
        ColorType::La16 => (2, 16),
        ColorType::Rgb16 => (3, 16),
        ColorType::Rgba16 => (4, 16),
        other => {
            return Err(Error::unsupported(format!(
                "no bit depth defined for color type {other:?}"
            )))
        }
    };
    Ok(vec![bits; channels])
}

/// Loads an image file.
pub fn load(path: impl AsRef<Path>) -> Result<PixelMatrix> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let image = image::open(path)?;
    let matrix = from_dynamic(&image)?;
    tracing::debug!(
        path = %path.display(),
        width = matrix.width(),
        height = matrix.height(),
        bits = ?matrix.bits_per_channel(),
        "Loaded image"
    );
    Ok(matrix)
}

/// Saves a 1-, 3- or 4-channel matrix, rescaled per channel depth.
pub fn save(matrix: &PixelMatrix, path: impl AsRef<Path>) -> Result<()> {
    save_with(matrix, path, Scaling::Depth)
}

/// Saves a matrix with an explicit [`Scaling`].
pub fn save_with(matrix: &PixelMatrix, path: impl AsRef<Path>, scaling: Scaling) -> Result<()> {
    let path = path.as_ref();
    let image = to_dynamic(matrix, scaling)?;
    image.save(path)?;
    tracing::debug!(path = %path.display(), channels = matrix.channel_count(), "Saved image");
    Ok(())
}

/// Converts a decoded image into a matrix.
pub fn from_dynamic(image: &DynamicImage) -> Result<PixelMatrix> {
    let bits = channel_bits(image.color())?;
    let samples: Vec<u32> = match image {
        DynamicImage::ImageLuma8(buf) => widen(buf.as_raw()),
        DynamicImage::ImageLumaA8(buf) => widen(buf.as_raw()),
        DynamicImage::ImageRgb8(buf) => widen(buf.as_raw()),
        DynamicImage::ImageRgba8(buf) => widen(buf.as_raw()),
        DynamicImage::ImageLuma16(buf) => widen(buf.as_raw()),
        DynamicImage::ImageLumaA16(buf) => widen(buf.as_raw()),
        DynamicImage::ImageRgb16(buf) => widen(buf.as_raw()),
        DynamicImage::ImageRgba16(buf) => widen(buf.as_raw()),
        other => {
            return Err(Error::unsupported(format!(
                "cannot read samples of color type {:?}",
                other.color()
            )))
        }
    };
    PixelMatrix::new(
        image.width() as usize,
        image.height() as usize,
        bits,
        samples,
    )
}

/// Renders a matrix as an 8-bit image, or 16-bit when any channel is
/// deeper than 8 bits.
pub fn to_dynamic(matrix: &PixelMatrix, scaling: Scaling) -> Result<DynamicImage> {
    let channels = matrix.channel_count();
    if !matches!(channels, 1 | 3 | 4) {
        return Err(Error::unsupported(format!(
            "no image representation for {channels} channels"
        )));
    }
    let width = u32::try_from(matrix.width())
        .map_err(|_| Error::unsupported("image width exceeds u32"))?;
    let height = u32::try_from(matrix.height())
        .map_err(|_| Error::unsupported("image height exceeds u32"))?;

    let wide = matrix.bits_per_channel().iter().any(|&b| b > 8);
    let target_bits = if wide { 16 } else { 8 };
    let scaled = rescale(matrix, scaling, target_bits);
    let too_small = || Error::unsupported("sample buffer does not match image dimensions");

    let image = if wide {
        let raw: Vec<u16> = scaled.iter().map(|&v| v as u16).collect();
        match channels {
            1 => DynamicImage::ImageLuma16(
                ImageBuffer::from_raw(width, height, raw).ok_or_else(too_small)?,
            ),
            3 => DynamicImage::ImageRgb16(
                ImageBuffer::from_raw(width, height, raw).ok_or_else(too_small)?,
            ),
            _ => DynamicImage::ImageRgba16(
                ImageBuffer::from_raw(width, height, raw).ok_or_else(too_small)?,
            ),
        }
    } else {
        let raw: Vec<u8> = scaled.iter().map(|&v| v as u8).collect();
        match channels {
            1 => DynamicImage::ImageLuma8(
                ImageBuffer::from_raw(width, height, raw).ok_or_else(too_small)?,
            ),
            3 => DynamicImage::ImageRgb8(
                ImageBuffer::from_raw(width, height, raw).ok_or_else(too_small)?,
            ),
            _ => DynamicImage::ImageRgba8(
                ImageBuffer::from_raw(width, height, raw).ok_or_else(too_small)?,
            ),
        }
    };
    Ok(image)
}

fn widen<T: Copy + Into<u32>>(raw: &[T]) -> Vec<u32> {
    raw.iter().map(|&v| v.into()).collect()
}

/// Maps samples onto `0..2^target_bits`.
fn rescale(matrix: &PixelMatrix, scaling: Scaling, target_bits: u8) -> Vec<u32> {
    let target_max = u64::from(depth_mask(target_bits));
    let bits = matrix.bits_per_channel();
    let count = bits.len();

    match scaling {
        Scaling::Depth => matrix
            .samples()
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let source_max = u64::from(depth_mask(bits[i % count]));
                ((u64::from(v) * target_max + source_max / 2) / source_max) as u32
            })
            .collect(),
        Scaling::Stretch => {
            let min = matrix.samples().iter().copied().min().unwrap_or(0);
            let max = matrix.samples().iter().copied().max().unwrap_or(0);
            let span = u64::from(max - min);
            matrix
                .samples()
                .iter()
                .map(|&v| {
                    if span == 0 {
                        0
                    } else {
                        ((u64::from(v - min) * target_max + span / 2) / span) as u32
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_bits_table() {
        assert_eq!(channel_bits(ColorType::L8).unwrap(), vec![8]);
        assert_eq!(channel_bits(ColorType::Rgba8).unwrap(), vec![8; 4]);
        assert_eq!(channel_bits(ColorType::Rgb16).unwrap(), vec![16; 3]);
        assert!(matches!(
            channel_bits(ColorType::Rgb32F),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_dynamic_round_trip_rgb8() {
        let m = PixelMatrix::from_fn(3, 2, vec![8, 8, 8], |r, c, ch| (r * 40 + c * 7 + ch) as u32)
            .unwrap();
        let image = to_dynamic(&m, Scaling::Depth).unwrap();

        assert_eq!(image.color(), ColorType::Rgb8);
        assert_eq!(from_dynamic(&image).unwrap(), m);
    }

    #[test]
    fn test_two_channels_unsupported() {
        let m = PixelMatrix::new(1, 1, vec![8, 8], vec![0, 0]).unwrap();
        assert!(matches!(
            to_dynamic(&m, Scaling::Depth),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_depth_scaling_of_one_bit_plane() {
        let m = PixelMatrix::new(2, 1, vec![1], vec![0, 1]).unwrap();
        let image = to_dynamic(&m, Scaling::Depth).unwrap();

        assert_eq!(image.as_bytes(), &[0, 255]);
    }

    #[test]
    fn test_stretch_scaling() {
        let m = PixelMatrix::new(3, 1, vec![8], vec![10, 15, 20]).unwrap();
        let image = to_dynamic(&m, Scaling::Stretch).unwrap();

        assert_eq!(image.as_bytes(), &[0, 128, 255]);
    }

    #[test]
    fn test_wide_channel_saves_16_bit() {
        let m = PixelMatrix::new(1, 1, vec![16], vec![0x1234]).unwrap();
        let image = to_dynamic(&m, Scaling::Depth).unwrap();

        assert_eq!(image.color(), ColorType::L16);
        assert_eq!(from_dynamic(&image).unwrap(), m);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load("/nonexistent/bitplane/missing.png");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("bitplane-codec-{}.png", std::process::id()));
        let m = PixelMatrix::from_fn(4, 4, vec![8; 4], |r, c, ch| ((r * 4 + c) * 13 + ch) as u32)
            .unwrap();

        save(&m, &path).unwrap();
        let loaded = load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, m);
    }
}
