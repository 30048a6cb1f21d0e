//! Bitplane Image Analysis Library
//!
//! Takes decoded raster images apart bit by bit: splits them into
//! channels and bit planes, recombines channels under bitwise masks,
//! extracts hidden bitstreams by walking pixels in configurable scan
//! patterns, and searches autostereograms for their repeat offset.
//!
//! # Architecture
//!
//! ```text
//! codec → PixelMatrix → transform  (components, bit layers, masks)
//!              ↓      → extraction (traversal → accumulator → bytes)
//!              ↓      → analysis   (luma → offset search / threshold)
//! ```
//!
//! # Design Principles
//!
//! - **Immutable source**: a loaded [`PixelMatrix`] is never modified;
//!   every operation returns new matrices or owned snapshots
//! - **Fixed-width samples**: results are truncated to the channel's bit depth
//! - **Lazy outputs**: layer, threshold and offset results are pull-based iterators
//! - **Fail fast**: invalid arguments are reported by the call that sees them
//!
//! # Example
//!
//! ```no_run
//! use bitplane::{
//!     extraction::{BitstreamExtractor, ExtractionRule},
//!     raster,
//!     transform,
//! };
//!
//! let image = raster::load("suspect.png").unwrap();
//!
//! // One image per bit plane, most significant first
//! for (i, layer) in transform::split_bit_layers(&image, 1).unwrap().enumerate() {
//!     raster::save(&layer, format!("layer_{i}.png")).unwrap();
//! }
//!
//! // Read the least significant bit of the red channel, row by row
//! let stream = BitstreamExtractor::new(vec![ExtractionRule::new(0, 0)])
//!     .extract(&image)
//!     .unwrap();
//! std::fs::write("red_lsb.bin", stream.data()).unwrap();
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod extraction;
pub mod raster;
pub mod transform;

// Re-export commonly used types at crate root
pub use analysis::{MagicEyeConfig, OffsetScore, OffsetSolver};
pub use config::FileConfig;
pub use error::{Error, Result};
pub use extraction::{BitAccumulator, BitstreamExtractor, ExtractionRule, TraversalConfig};
pub use raster::{Channel, PixelMatrix};
pub use transform::{MaskOp, MaskRule};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
