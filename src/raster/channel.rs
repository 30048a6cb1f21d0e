//! Single-channel snapshots and the bitwise operations defined on them.
//!
//! All operations consume the snapshot and return the transformed one,
//! so a transform can never be observed through the matrix it came from.
//! Results are truncated to the channel's bit depth.

use super::matrix::{depth_mask, PixelMatrix, MAX_CHANNEL_BITS};
use crate::error::{Error, Result};

/// Returns a mask with exactly the bits `from_bit..=to_bit` set.
pub fn bit_range_mask(from_bit: u32, to_bit: u32) -> Result<u32> {
    if from_bit > to_bit {
        return Err(Error::invalid(format!(
            "bit range {from_bit}..={to_bit} is empty"
        )));
    }
    if to_bit >= u32::from(MAX_CHANNEL_BITS) {
        return Err(Error::invalid(format!(
            "bit {to_bit} outside a {MAX_CHANNEL_BITS}-bit sample"
        )));
    }
    let width = to_bit - from_bit + 1;
    let ones = if width == 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    };
    Ok(ones << from_bit)
}

/// An owned `height x width` grid holding one channel of a [`PixelMatrix`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    width: usize,
    height: usize,
    bits: u8,
    samples: Vec<u32>,
}

impl Channel {
    /// Creates a channel from row-major samples.
    pub fn new(width: usize, height: usize, bits: u8, samples: Vec<u32>) -> Result<Self> {
        // Reuse the matrix checks for shape and depth.
        let matrix = PixelMatrix::new(width, height, vec![bits], samples)?;
        matrix.channel(0)
    }

    pub(crate) fn from_parts(width: usize, height: usize, bits: u8, samples: Vec<u32>) -> Self {
        Self {
            width,
            height,
            bits,
            samples,
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

    /// Bit depth of the channel.
    #[inline]
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Row-major samples.
    #[inline]
    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.samples[row * self.width + col])
    }

    /// Wraps the channel into a one-channel matrix.
    pub fn into_matrix(self) -> PixelMatrix {
        PixelMatrix::from_parts(self.width, self.height, vec![self.bits], self.samples)
    }

    fn map(mut self, f: impl Fn(u32) -> u32) -> Self {
        let mask = depth_mask(self.bits);
        for sample in &mut self.samples {
            *sample = f(*sample) & mask;
        }
        self
    }

    /// Keeps only the bits `from_bit..=to_bit` of every sample.
    pub fn mask_bits(self, from_bit: u32, to_bit: u32) -> Result<Self> {
        let mask = bit_range_mask(from_bit, to_bit)?;
        Ok(self.map(|v| v & mask))
    }

    /// Shifts every sample left by `n` bits.
    ///
    /// Bits pushed past the channel depth are dropped. `n == 0` hands
    /// the snapshot back untouched.
    pub fn shift_left(self, n: u32) -> Self {
        if n == 0 {
            return self;
        }
        self.map(|v| v.checked_shl(n).unwrap_or(0))
    }

    pub fn and(self, value: u32) -> Self {
        self.map(|v| v & value)
    }

    pub fn or(self, value: u32) -> Self {
        self.map(|v| v | value)
    }

    pub fn xor(self, value: u32) -> Self {
        self.map(|v| v ^ value)
    }

    /// Isolates `bits` bits starting at `layer_start` and left-aligns them
    /// to the most significant bit of a `total_bits`-wide sample.
    ///
    /// Layers extracted this way share one intensity scale.
    pub fn plane(self, layer_start: u32, bits: u32, total_bits: u32) -> Result<Self> {
        if bits == 0 {
            return Err(Error::invalid("a plane needs at least one bit"));
        }
        let end = layer_start + bits;
        if end > total_bits {
            return Err(Error::invalid(format!(
                "bits {layer_start}..{end} exceed depth {total_bits}"
            )));
        }
        Ok(self
            .mask_bits(layer_start, end - 1)?
            .shift_left(total_bits - end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> Channel {
        Channel::new(2, 2, 2, vec![0b10, 0b01, 0b11, 0b00]).unwrap()
    }

    #[test]
    fn test_bit_range_mask() {
        assert_eq!(bit_range_mask(0, 0).unwrap(), 0b1);
        assert_eq!(bit_range_mask(2, 4).unwrap(), 0b11100);
        assert_eq!(bit_range_mask(0, 31).unwrap(), u32::MAX);
        assert!(bit_range_mask(3, 2).is_err());
        assert!(bit_range_mask(0, 32).is_err());
    }

    #[test]
    fn test_mask_then_zero_shift() {
        let out = two_by_two().mask_bits(1, 1).unwrap().shift_left(0);
        assert_eq!(out.samples(), &[0b10, 0b00, 0b10, 0b00]);
    }

    #[test]
    fn test_shift_truncates_to_depth() {
        let c = Channel::new(2, 1, 8, vec![0x81, 0x01]).unwrap().shift_left(1);
        assert_eq!(c.samples(), &[0x02, 0x02]);

        let c = Channel::new(1, 1, 8, vec![0xFF]).unwrap().shift_left(40);
        assert_eq!(c.samples(), &[0]);
    }

    #[test]
    fn test_logical_ops() {
        let c = Channel::new(3, 1, 8, vec![0x0F, 0xF0, 0xAA]).unwrap();

        assert_eq!(c.clone().and(0x3C).samples(), &[0x0C, 0x30, 0x28]);
        assert_eq!(c.clone().or(0x01).samples(), &[0x0F, 0xF1, 0xAB]);
        assert_eq!(c.xor(0xFF).samples(), &[0xF0, 0x0F, 0x55]);
    }

    #[test]
    fn test_or_value_wider_than_depth() {
        let c = Channel::new(1, 1, 4, vec![0b0001]).unwrap().or(0x1F0);
        assert_eq!(c.samples(), &[0b0001]);
    }

    #[test]
    fn test_plane_left_aligns() {
        let c = Channel::new(1, 1, 8, vec![0b0000_0100]).unwrap();
        assert_eq!(c.clone().plane(2, 1, 8).unwrap().samples(), &[0b1000_0000]);
        assert_eq!(c.clone().plane(1, 2, 8).unwrap().samples(), &[0b1000_0000]);
        assert_eq!(c.plane(3, 1, 8).unwrap().samples(), &[0]);
    }

    #[test]
    fn test_plane_out_of_range() {
        assert!(two_by_two().plane(1, 2, 2).is_err());
        assert!(two_by_two().plane(0, 0, 2).is_err());
    }
}
