//! Pixel storage and image file access.
//!
//! A [`PixelMatrix`] is the decoded, fully resident image every other
//! stage operates on. A [`Channel`] is an owned single-channel snapshot
//! of it carrying the bitwise operations used by the transform stage.

mod channel;
#[cfg(feature = "codec")]
pub mod codec;
mod matrix;

pub use channel::{bit_range_mask, Channel};
pub(crate) use matrix::depth_mask;
pub use matrix::{PixelMatrix, MAX_CHANNEL_BITS};
#[cfg(feature = "codec")]
pub use codec::{load, save, save_with, Scaling};
