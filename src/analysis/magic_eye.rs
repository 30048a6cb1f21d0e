//! Autostereogram offset search.
//!
//! The image is overlaid with a copy of itself shifted by `offset`
//! pixels along one axis. For every offset in the searched band the
//! mean absolute luma difference over the overlapping area is scored;
//! the best offsets are then turned into difference maps, which show
//! the hidden depth pattern of a "magic eye" picture.

use super::luma::LumaPlane;
use crate::error::{Error, Result};
use crate::raster::PixelMatrix;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MagicEyeConfig {
    /// Rank the smallest dissimilarity first (else the largest).
    pub min_value: bool,
    /// Shift along the width (else along the height).
    pub horizontal: bool,
    /// How many offsets to keep.
    pub number_of_results: usize,
    /// Fraction of the searched dimension skipped at both ends.
    pub border_area: f64,
}

impl Default for MagicEyeConfig {
    fn default() -> Self {
        Self {
            min_value: true,
            horizontal: true,
            number_of_results: 1,
            border_area: 0.1,
        }
    }
}

impl MagicEyeConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.border_area) {
            return Err(Error::invalid(format!(
                "border area {} outside [0, 1)",
                self.border_area
            )));
        }
        Ok(())
    }
}

/// Dissimilarity of the image with itself at one offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetScore {
    pub offset: usize,
    /// Mean absolute luma difference over the overlap.
    pub dissimilarity: f64,
}

/// Scores offsets of one image against itself.
#[derive(Debug, Clone)]
pub struct OffsetSolver {
    luma: LumaPlane,
    config: MagicEyeConfig,
}

impl OffsetSolver {
    /// Prepares a search over a 3-channel image.
    pub fn new(matrix: &PixelMatrix, config: MagicEyeConfig) -> Result<Self> {
        config.validate()?;
        let luma = LumaPlane::from_matrix(matrix)?;
        Ok(Self { luma, config })
    }

    pub fn config(&self) -> &MagicEyeConfig {
        &self.config
    }

    fn extent(&self) -> usize {
        if self.config.horizontal {
            self.luma.width()
        } else {
            self.luma.height()
        }
    }

    /// Offsets searched: `floor(D * border) .. floor(D * (1 - border))`.
    pub fn offset_range(&self) -> Range<usize> {
        let extent = self.extent() as f64;
        let start = (extent * self.config.border_area).floor() as usize;
        let end = (extent * (1.0 - self.config.border_area)).floor() as usize;
        start..end.max(start)
    }

    /// Absolute difference between the image and its copy shifted by `offset`.
    ///
    /// The result covers only the overlap, so it is `offset` pixels
    /// narrower (or shorter) than the image.
    pub fn difference(&self, offset: usize) -> LumaPlane {
        let (width, height) = (self.luma.width(), self.luma.height());
        let values = self.luma.values();
        let offset = offset.min(self.extent());

        if self.config.horizontal {
            let overlap = width - offset;
            let diff = (0..height)
                .flat_map(|r| {
                    let row = &values[r * width..(r + 1) * width];
                    row[..overlap]
                        .iter()
                        .zip(&row[offset..])
                        .map(|(a, b)| (a - b).abs())
                })
                .collect();
            LumaPlane::from_values(overlap, height, diff)
        } else {
            let overlap = height - offset;
            let diff = values[..overlap * width]
                .iter()
                .zip(&values[offset * width..])
                .map(|(a, b)| (a - b).abs())
                .collect();
            LumaPlane::from_values(width, overlap, diff)
        }
    }

    /// Scores one offset.
    pub fn score(&self, offset: usize) -> OffsetScore {
        let diff = self.difference(offset);
        let pixels = diff.values().len();
        let dissimilarity = if pixels == 0 {
            f64::NAN
        } else {
            diff.values().iter().sum::<f64>() / pixels as f64
        };
        OffsetScore {
            offset,
            dissimilarity,
        }
    }

    /// Scores for every searched offset, in ascending offset order.
    pub fn scores(&self) -> Vec<OffsetScore> {
        self.offset_range().map(|o| self.score(o)).collect()
    }

    /// The selected offsets, best first.
    ///
    /// Equal dissimilarities keep ascending offset order.
    pub fn best(&self) -> Vec<OffsetScore> {
        let mut scores = self.scores();
        if self.config.min_value {
            scores.sort_by(|a, b| a.dissimilarity.total_cmp(&b.dissimilarity));
        } else {
            scores.sort_by(|a, b| b.dissimilarity.total_cmp(&a.dissimilarity));
        }
        scores.truncate(self.config.number_of_results);
        tracing::debug!(
            searched = ?self.offset_range(),
            selected = ?scores.iter().map(|s| s.offset).collect::<Vec<_>>(),
            "Offset search finished"
        );
        scores
    }

    /// Runs the search and returns the difference maps lazily, best first.
    pub fn into_maps(self) -> DifferenceMaps {
        let selected = self.best().into_iter();
        DifferenceMaps {
            solver: self,
            selected,
        }
    }
}

/// Iterator over the difference maps of the selected offsets.
#[derive(Debug, Clone)]
pub struct DifferenceMaps {
    solver: OffsetSolver,
    selected: std::vec::IntoIter<OffsetScore>,
}

impl Iterator for DifferenceMaps {
    type Item = (OffsetScore, LumaPlane);

    fn next(&mut self) -> Option<Self::Item> {
        let score = self.selected.next()?;
        Some((score, self.solver.difference(score.offset)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.selected.size_hint()
    }
}

impl ExactSizeIterator for DifferenceMaps {}

/// Searches `matrix` and yields the difference maps of the best offsets.
pub fn magic_eye(matrix: &PixelMatrix, config: MagicEyeConfig) -> Result<DifferenceMaps> {
    Ok(OffsetSolver::new(matrix, config)?.into_maps())
}
