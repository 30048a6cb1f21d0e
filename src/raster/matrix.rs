//! In-memory pixel grid with per-channel bit depth.

use super::Channel;
use crate::error::{Error, Result};

/// Largest supported bit depth for a single channel.
pub const MAX_CHANNEL_BITS: u8 = 32;

/// Returns the mask covering every valid bit of a `bits`-wide sample.
#[inline]
pub(crate) fn depth_mask(bits: u8) -> u32 {
    if bits >= MAX_CHANNEL_BITS {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// A decoded raster image.
///
/// Samples are stored interleaved, row-major: `[row][col][channel]`.
/// A matrix is never modified after construction; every transform in
/// this crate builds a new matrix or a [`Channel`] snapshot.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelMatrix {
    width: usize,
    height: usize,
    /// Bit depth of each channel.
    bits: Vec<u8>,
    samples: Vec<u32>,
}

impl PixelMatrix {
    /// Creates a matrix from interleaved samples.
    ///
    /// Fails when a dimension is zero, when `samples` does not hold
    /// exactly `width * height * bits.len()` values, when a depth lies
    /// outside `1..=32`, or when a sample does not fit its channel's depth.
    pub fn new(width: usize, height: usize, bits: Vec<u8>, samples: Vec<u32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid(format!(
                "matrix dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if bits.is_empty() {
            return Err(Error::invalid("matrix needs at least one channel"));
        }
        if let Some(&depth) = bits
            .iter()
            .find(|&&b| b == 0 || b > MAX_CHANNEL_BITS)
        {
            return Err(Error::invalid(format!(
                "channel depth {depth} outside 1..={MAX_CHANNEL_BITS}"
            )));
        }
        let expected = width * height * bits.len();
        if samples.len() != expected {
            return Err(Error::invalid(format!(
                "expected {expected} samples, got {}",
                samples.len()
            )));
        }

        let channels = bits.len();
        for (i, &value) in samples.iter().enumerate() {
            let depth = bits[i % channels];
            if value & !depth_mask(depth) != 0 {
                return Err(Error::invalid(format!(
                    "sample {value} does not fit in {depth} bits (channel {})",
                    i % channels
                )));
            }
        }

        Ok(Self {
            width,
            height,
            bits,
            samples,
        })
    }

    /// Assembles a matrix whose invariants the caller already upholds.
    pub(crate) fn from_parts(width: usize, height: usize, bits: Vec<u8>, samples: Vec<u32>) -> Self {
        debug_assert_eq!(samples.len(), width * height * bits.len());
        Self {
            width,
            height,
            bits,
            samples,
        }
    }

    /// Builds a matrix by evaluating `f(row, col, channel)` for every sample.
    pub fn from_fn<F>(width: usize, height: usize, bits: Vec<u8>, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize, usize) -> u32,
    {
        let channels = bits.len();
        let mut samples = Vec::with_capacity(width * height * channels);
        for row in 0..height {
            for col in 0..width {
                for channel in 0..channels {
                    samples.push(f(row, col, channel));
                }
            }
        }
        Self::new(width, height, bits, samples)
    }

    /// Recombines single-channel snapshots along the channel axis.
    ///
    /// Channel order in the result follows the order of `channels`.
    pub fn from_channels(channels: Vec<Channel>) -> Result<Self> {
        let first = channels
            .first()
            .ok_or_else(|| Error::invalid("cannot concatenate zero channels"))?;
        let (width, height) = (first.width(), first.height());
        if let Some(bad) = channels
            .iter()
            .find(|c| c.width() != width || c.height() != height)
        {
            return Err(Error::invalid(format!(
                "channel is {}x{}, expected {width}x{height}",
                bad.width(),
                bad.height()
            )));
        }

        let bits: Vec<u8> = channels.iter().map(Channel::bits).collect();
        let count = channels.len();
        let mut samples = vec![0u32; width * height * count];
        for (index, channel) in channels.iter().enumerate() {
            for (pixel, &value) in channel.samples().iter().enumerate() {
                samples[pixel * count + index] = value;
            }
        }

        Ok(Self {
            width,
            height,
            bits,
            samples,
        })
    }

    /// Returns the width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of channels per pixel.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.bits.len()
    }

    /// Returns the bit depth of every channel, in channel order.
    #[inline]
    pub fn bits_per_channel(&self) -> &[u8] {
        &self.bits
    }

    /// Returns the smallest channel depth.
    pub fn min_bits(&self) -> u8 {
        self.bits.iter().copied().min().unwrap_or(0)
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Returns the interleaved sample buffer.
    #[inline]
    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    /// Returns one sample, or `None` when the coordinate is out of range.
    #[inline]
    pub fn get(&self, row: usize, col: usize, channel: usize) -> Option<u32> {
        if row >= self.height || col >= self.width || channel >= self.bits.len() {
            return None;
        }
        Some(self.samples[(row * self.width + col) * self.bits.len() + channel])
    }

    /// Takes an owned snapshot of one channel.
    pub fn channel(&self, index: usize) -> Result<Channel> {
        let count = self.channel_count();
        if index >= count {
            return Err(Error::invalid(format!(
                "channel index {index} out of range for {count} channels"
            )));
        }
        let samples = self
            .samples
            .iter()
            .skip(index)
            .step_by(count)
            .copied()
            .collect();
        Ok(Channel::from_parts(
            self.width,
            self.height,
            self.bits[index],
            samples,
        ))
    }

    /// Builds a matrix of the same shape by mapping every sample.
    ///
    /// `f` receives the sample and its channel index. Results are
    /// truncated to the channel depth.
    pub(crate) fn map_samples<F>(&self, f: F) -> PixelMatrix
    where
        F: Fn(u32, usize) -> u32,
    {
        let count = self.channel_count();
        let samples = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let channel = i % count;
                f(v, channel) & depth_mask(self.bits[channel])
            })
            .collect();
        PixelMatrix {
            width: self.width,
            height: self.height,
            bits: self.bits.clone(),
            samples,
        }
    }
}

impl std::fmt::Debug for PixelMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelMatrix")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bits", &self.bits)
            .field("samples", &self.samples.len())
            .finish()
    }
}
