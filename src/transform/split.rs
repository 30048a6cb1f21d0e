//! Channel and bit-plane decomposition.
//!
//! Layer `i` of a `bits`-wide split covers bit positions `i..i + bits`
//! and is shifted so its highest bit lands on the top bit of the depth
//! it was taken from. With `bits > 1` neighbouring layers overlap in
//! `bits - 1` positions. Layers are produced from the most significant
//! one down; every layer iterator is double ended, so `.rev()` yields
//! them starting at bit 0.

use crate::error::{Error, Result};
use crate::raster::{Channel, PixelMatrix};
use std::ops::Range;

/// Number of `bits`-wide layers in a `depth`-bit sample.
#[inline]
pub fn layer_count(depth: u32, bits: u32) -> u32 {
    (depth + 1).saturating_sub(bits)
}

/// Mask and left shift that isolate one layer.
#[derive(Debug, Clone, Copy)]
struct Layer {
    mask: u32,
    shift: u32,
}

impl Layer {
    /// Callers guarantee `start + bits <= depth <= 32`.
    fn new(start: u32, bits: u32, depth: u32) -> Self {
        let mask = (((1u64 << bits) - 1) << start) as u32;
        Self {
            mask,
            shift: depth - start - bits,
        }
    }

    #[inline]
    fn apply(self, value: u32) -> u32 {
        (value & self.mask) << self.shift
    }
}

fn check_bits(bits: u32) -> Result<()> {
    if bits == 0 {
        return Err(Error::invalid("need to mask at least one bit"));
    }
    Ok(())
}

/// Takes a deep copy of every channel, in channel order.
pub fn split(matrix: &PixelMatrix) -> Vec<Channel> {
    (0..matrix.channel_count())
        .filter_map(|index| matrix.channel(index).ok())
        .collect()
}

/// Yields one unmodified single-channel matrix per channel.
pub fn split_components(matrix: &PixelMatrix) -> Components<'_> {
    Components {
        matrix,
        next: 0..matrix.channel_count(),
    }
}

/// Yields whole-matrix bit layers over the shallowest channel depth.
///
/// All channels are masked with the same bit range, so every layer keeps
/// the channel count of `matrix`.
pub fn split_bit_layers(matrix: &PixelMatrix, bits: u32) -> Result<BitLayers<'_>> {
    check_bits(bits)?;
    let depth = u32::from(matrix.min_bits());
    tracing::debug!(depth, bits, layers = layer_count(depth, bits), "Splitting bit layers");
    Ok(BitLayers {
        matrix,
        bits,
        depth,
        starts: 0..layer_count(depth, bits),
    })
}

/// Yields, per channel, that channel's bit layers at its own depth.
pub fn split_bit_layers_components(
    matrix: &PixelMatrix,
    bits: u32,
) -> Result<ComponentLayers<'_>> {
    check_bits(bits)?;
    Ok(ComponentLayers {
        components: split_components(matrix),
        bits,
    })
}

/// Iterator returned by [`split_components`].
#[derive(Debug, Clone)]
pub struct Components<'a> {
    matrix: &'a PixelMatrix,
    next: Range<usize>,
}

impl Iterator for Components<'_> {
    type Item = PixelMatrix;

    fn next(&mut self) -> Option<PixelMatrix> {
        let index = self.next.next()?;
        self.matrix.channel(index).ok().map(Channel::into_matrix)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.next.size_hint()
    }
}

impl DoubleEndedIterator for Components<'_> {
    fn next_back(&mut self) -> Option<PixelMatrix> {
        let index = self.next.next_back()?;
        self.matrix.channel(index).ok().map(Channel::into_matrix)
    }
}

impl ExactSizeIterator for Components<'_> {}

/// Iterator returned by [`split_bit_layers`].
#[derive(Debug, Clone)]
pub struct BitLayers<'a> {
    matrix: &'a PixelMatrix,
    bits: u32,
    depth: u32,
    starts: Range<u32>,
}

impl BitLayers<'_> {
    fn layer(&self, start: u32) -> PixelMatrix {
        let layer = Layer::new(start, self.bits, self.depth);
        self.matrix.map_samples(|v, _| layer.apply(v))
    }
}

impl Iterator for BitLayers<'_> {
    type Item = PixelMatrix;

    fn next(&mut self) -> Option<PixelMatrix> {
        let start = self.starts.next_back()?;
        Some(self.layer(start))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.starts.size_hint()
    }
}

impl DoubleEndedIterator for BitLayers<'_> {
    fn next_back(&mut self) -> Option<PixelMatrix> {
        let start = self.starts.next()?;
        Some(self.layer(start))
    }
}

impl ExactSizeIterator for BitLayers<'_> {}

/// Iterator returned by [`split_bit_layers_components`].
#[derive(Debug, Clone)]
pub struct ComponentLayers<'a> {
    components: Components<'a>,
    bits: u32,
}

impl ComponentLayers<'_> {
    fn layers(&self, component: PixelMatrix) -> Vec<PixelMatrix> {
        let depth = u32::from(component.min_bits());
        (0..layer_count(depth, self.bits))
            .rev()
            .map(|start| {
                let layer = Layer::new(start, self.bits, depth);
                component.map_samples(|v, _| layer.apply(v))
            })
            .collect()
    }
}

impl Iterator for ComponentLayers<'_> {
    type Item = Vec<PixelMatrix>;

    fn next(&mut self) -> Option<Vec<PixelMatrix>> {
        let component = self.components.next()?;
        Some(self.layers(component))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.components.size_hint()
    }
}

impl ExactSizeIterator for ComponentLayers<'_> {}
