//! Component splitting, bit-plane layering and masked recombination.
//!
//! Everything here reads a [`PixelMatrix`](crate::raster::PixelMatrix)
//! and returns new matrices; the source is never modified.

mod mask;
mod split;

pub(crate) use mask::parse_number;
pub use mask::{
    and_masked_component, masked_components, or_masked_component, xor_masked_component, MaskOp,
    MaskRule,
};
pub use split::{
    layer_count, split, split_bit_layers, split_bit_layers_components, split_components,
    BitLayers, ComponentLayers, Components,
};
