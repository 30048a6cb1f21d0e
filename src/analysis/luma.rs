//! Brightness projection of RGB images.

use crate::error::{Error, Result};
use crate::raster::{depth_mask, PixelMatrix};

/// ITU-R BT.601 weights for red, green and blue.
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// A single-channel grid of floating point brightness values.
#[derive(Debug, Clone, PartialEq)]
pub struct LumaPlane {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl LumaPlane {
    /// Projects a 3-channel matrix onto luma.
    pub fn from_matrix(matrix: &PixelMatrix) -> Result<Self> {
        if matrix.channel_count() != 3 {
            return Err(Error::invalid(format!(
                "luma needs exactly 3 channels, got {}",
                matrix.channel_count()
            )));
        }
        let values = matrix
            .samples()
            .chunks_exact(3)
            .map(|px| {
                px.iter()
                    .zip(LUMA_WEIGHTS)
                    .map(|(&v, w)| f64::from(v) * w)
                    .sum::<f64>()
            })
            .collect();
        Ok(Self {
            width: matrix.width(),
            height: matrix.height(),
            values,
        })
    }

    pub(crate) fn from_values(width: usize, height: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), width * height);
        Self {
            width,
            height,
            values,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.values[row * self.width + col])
    }

    /// Rounds every value into a one-channel matrix of depth `bits`,
    /// clamping to the depth's range.
    pub fn to_matrix(&self, bits: u8) -> Result<PixelMatrix> {
        let max = f64::from(depth_mask(bits));
        let samples = self
            .values
            .iter()
            .map(|&v| v.round().clamp(0.0, max) as u32)
            .collect();
        PixelMatrix::new(self.width, self.height, vec![bits], samples)
    }
}
