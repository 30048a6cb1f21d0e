//! Threshold sweep binarization.
//!
//! Produces one black/white image per brightness level, which makes
//! faint shapes hidden in a narrow luma band easy to spot.

use super::luma::LumaPlane;
use crate::error::Result;
use crate::raster::{depth_mask, PixelMatrix};
use std::ops::Range;

/// Binarizes `luma`: values up to `level` become 0, the rest `2^bits - 1`.
pub fn binarize(luma: &LumaPlane, level: u32, bits: u8) -> Result<PixelMatrix> {
    let max = depth_mask(bits);
    let level = f64::from(level);
    let samples = luma
        .values()
        .iter()
        .map(|&v| if v <= level { 0 } else { max })
        .collect();
    PixelMatrix::new(luma.width(), luma.height(), vec![bits], samples)
}

/// Lazily binarizes a 3-channel image at every level `1..2^bits - 1`,
/// where `bits` is the shallowest channel depth.
pub fn threshold_sweep(matrix: &PixelMatrix) -> Result<ThresholdSweep> {
    let luma = LumaPlane::from_matrix(matrix)?;
    let bits = matrix.min_bits();
    let levels = 1..depth_mask(bits);
    tracing::debug!(bits, levels = levels.len(), "Starting threshold sweep");
    Ok(ThresholdSweep { luma, bits, levels })
}

/// Iterator returned by [`threshold_sweep`], yielding `(level, image)`.
#[derive(Debug, Clone)]
pub struct ThresholdSweep {
    luma: LumaPlane,
    bits: u8,
    levels: Range<u32>,
}

impl ThresholdSweep {
    /// Levels not yet yielded.
    pub fn levels(&self) -> Range<u32> {
        self.levels.clone()
    }
}

impl Iterator for ThresholdSweep {
    type Item = (u32, PixelMatrix);

    fn next(&mut self) -> Option<Self::Item> {
        let level = self.levels.next()?;
        binarize(&self.luma, level, self.bits)
            .ok()
            .map(|image| (level, image))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.levels.size_hint()
    }
}
