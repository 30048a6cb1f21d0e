//! Bit accumulation and the extracted bitstream type.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest supported group width.
pub const MAX_GROUP_BITS: u32 = 64;

/// Position the first bit of a group occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BitOrder {
    /// First bit lands in the most significant position; groups fill
    /// from the high end.
    #[default]
    MsbFirst,
    /// First bit lands in the least significant position; groups fill
    /// from the low end.
    LsbFirst,
}

/// Packs single bits into fixed-width groups.
///
/// A trailing partial group keeps its unused positions zero: the low
/// positions for [`BitOrder::MsbFirst`], the high ones for
/// [`BitOrder::LsbFirst`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitAccumulator {
    bits_per_group: u32,
    order: BitOrder,
    /// Completed groups, plus the partial one when `fill > 0`.
    groups: Vec<u64>,
    /// Bits held by the last group, `0` when it is complete.
    fill: u32,
    total_bits: usize,
}

impl BitAccumulator {
    /// Creates an accumulator with `bits_per_group` in `1..=64`.
    pub fn new(bits_per_group: u32, order: BitOrder) -> Result<Self> {
        if bits_per_group == 0 || bits_per_group > MAX_GROUP_BITS {
            return Err(Error::invalid(format!(
                "group size {bits_per_group} outside 1..={MAX_GROUP_BITS}"
            )));
        }
        Ok(Self {
            bits_per_group,
            order,
            groups: Vec::new(),
            fill: 0,
            total_bits: 0,
        })
    }

    /// Byte-sized groups, most significant bit first.
    pub fn bytes_msb_first() -> Self {
        Self {
            bits_per_group: 8,
            order: BitOrder::MsbFirst,
            groups: Vec::new(),
            fill: 0,
            total_bits: 0,
        }
    }

    #[inline]
    pub fn bits_per_group(&self) -> u32 {
        self.bits_per_group
    }

    #[inline]
    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Appends one bit.
    pub fn push_bit(&mut self, bit: bool) {
        if self.fill == 0 {
            self.groups.push(0);
        }
        let position = match self.order {
            BitOrder::MsbFirst => self.bits_per_group - 1 - self.fill,
            BitOrder::LsbFirst => self.fill,
        };
        if bit {
            if let Some(group) = self.groups.last_mut() {
                *group |= 1u64 << position;
            }
        }
        self.fill += 1;
        if self.fill == self.bits_per_group {
            self.fill = 0;
        }
        self.total_bits += 1;
    }

    /// Drops every accumulated bit.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.fill = 0;
        self.total_bits = 0;
    }

    /// Number of bits pushed since creation or the last [`clear`](Self::clear).
    #[inline]
    pub fn total_bits(&self) -> usize {
        self.total_bits
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_bits == 0
    }

    /// Group words, the last one possibly partial.
    #[inline]
    pub fn groups(&self) -> &[u64] {
        &self.groups
    }

    /// Bytes used to encode one group.
    #[inline]
    pub fn bytes_per_group(&self) -> usize {
        self.bits_per_group.div_ceil(8) as usize
    }

    /// Encodes every group, big-endian, in `bytes_per_group` bytes each.
    pub fn bytes(&self) -> Vec<u8> {
        let width = self.bytes_per_group();
        let mut out = Vec::with_capacity(self.groups.len() * width);
        for group in &self.groups {
            out.extend_from_slice(&group.to_be_bytes()[8 - width..]);
        }
        out
    }

    /// Reads the pushed bits back in push order.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.total_bits).map(move |i| {
            let group = self.groups[i / self.bits_per_group as usize];
            let offset = (i % self.bits_per_group as usize) as u32;
            let position = match self.order {
                BitOrder::MsbFirst => self.bits_per_group - 1 - offset,
                BitOrder::LsbFirst => offset,
            };
            (group >> position) & 1 == 1
        })
    }
}

impl Default for BitAccumulator {
    fn default() -> Self {
        Self::bytes_msb_first()
    }
}

/// Bytes produced by an extraction run.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitstream {
    /// Encoded groups.
    data: Vec<u8>,
    /// Number of bits pushed, including a partial trailing group.
    bit_count: usize,
}

impl Bitstream {
    /// Captures the current contents of an accumulator.
    pub fn from_accumulator(accumulator: &BitAccumulator) -> Self {
        Self {
            data: accumulator.bytes(),
            bit_count: accumulator.total_bits(),
        }
    }

    /// Returns the encoded bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the stream, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of extracted bits.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Counts the number of set bits.
    pub fn popcount(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Share of set bits as deviation from 0.5.
    ///
    /// Returns a value in [-0.5, 0.5]; hidden payloads tend to sit near
    /// 0.0 while untouched low bit planes of natural images often do not.
    pub fn bit_bias(&self) -> f64 {
        if self.bit_count == 0 {
            return 0.0;
        }
        let ones = self.popcount() as f64;
        let total = self.bit_count as f64;
        (ones / total) - 0.5
    }
}

impl std::fmt::Debug for Bitstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitstream")
            .field("bytes", &self.data.len())
            .field("bits", &self.bit_count)
            .field("bit_bias", &format!("{:.4}", self.bit_bias()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(acc: &mut BitAccumulator, bits: &[u8]) {
        for &b in bits {
            acc.push_bit(b != 0);
        }
    }

    #[test]
    fn test_msb_first_bytes() {
        let mut acc = BitAccumulator::bytes_msb_first();
        push_all(&mut acc, &[1, 0, 1, 0, 1, 0, 1, 0, 1, 1]);

        assert_eq!(acc.total_bits(), 10);
        assert_eq!(acc.bytes(), vec![0xAA, 0xC0]);
    }

    #[test]
    fn test_lsb_first_bytes() {
        let mut acc = BitAccumulator::new(8, BitOrder::LsbFirst).unwrap();
        push_all(&mut acc, &[1, 0, 0, 0, 0, 0, 0, 0, 1, 1]);

        assert_eq!(acc.bytes(), vec![0x01, 0x03]);
    }

    #[test]
    fn test_wide_groups() {
        let mut acc = BitAccumulator::new(12, BitOrder::MsbFirst).unwrap();
        push_all(&mut acc, &[1; 12]);
        push_all(&mut acc, &[1]);

        assert_eq!(acc.groups(), &[0xFFF, 0x800]);
        assert_eq!(acc.bytes(), vec![0x0F, 0xFF, 0x08, 0x00]);
    }

    #[test]
    fn test_narrow_groups() {
        let mut acc = BitAccumulator::new(3, BitOrder::MsbFirst).unwrap();
        push_all(&mut acc, &[1, 0, 1, 1]);

        assert_eq!(acc.bytes(), vec![0b101, 0b100]);
    }

    #[test]
    fn test_round_trip_both_orders() {
        let input: Vec<bool> = (0..37).map(|i| (i * 7 + 3) % 5 < 2).collect();
        for order in [BitOrder::MsbFirst, BitOrder::LsbFirst] {
            let mut acc = BitAccumulator::new(8, order).unwrap();
            for &b in &input {
                acc.push_bit(b);
            }
            assert_eq!(acc.bits().collect::<Vec<_>>(), input);
        }
    }

    #[test]
    fn test_clear() {
        let mut acc = BitAccumulator::default();
        push_all(&mut acc, &[1, 1, 1]);
        acc.clear();

        assert!(acc.is_empty());
        assert!(acc.bytes().is_empty());

        push_all(&mut acc, &[1]);
        assert_eq!(acc.bytes(), vec![0x80]);
    }

    #[test]
    fn test_invalid_group_size() {
        assert!(matches!(
            BitAccumulator::new(0, BitOrder::MsbFirst),
            Err(Error::InvalidArgument(_))
        ));
        assert!(BitAccumulator::new(65, BitOrder::LsbFirst).is_err());
        assert!(BitAccumulator::new(64, BitOrder::LsbFirst).is_ok());
    }

    #[test]
    fn test_bitstream_bias() {
        let mut acc = BitAccumulator::default();
        push_all(&mut acc, &[1, 1, 1, 1]);
        let stream = Bitstream::from_accumulator(&acc);

        assert_eq!(stream.bit_count(), 4);
        assert_eq!(stream.data(), &[0xF0]);
        assert!((stream.bit_bias() - 0.5).abs() < 1e-9);
    }
}
