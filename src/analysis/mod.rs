//! Image-level analysis on the luma projection.
//!
//! This module hosts the autostereogram offset search and the threshold
//! sweep. Both work on brightness only and require RGB input.

mod luma;
mod magic_eye;
mod threshold;

pub use luma::{LumaPlane, LUMA_WEIGHTS};
pub use magic_eye::{magic_eye, DifferenceMaps, MagicEyeConfig, OffsetScore, OffsetSolver};
pub use threshold::{binarize, threshold_sweep, ThresholdSweep};
