//! Coordinate walks over an image grid.
//!
//! A [`TraversalPath`] visits every `(row, col)` of a `height x width`
//! grid exactly once. The outer loop runs over rows when
//! `horizontal_first` is set and over columns otherwise; the inner loop
//! runs across the other axis.
//!
//! With `alternate` set, the inner direction flag is flipped after every
//! yielded coordinate. The flag is only read when an inner run begins,
//! so a run never changes direction midway: a run is reversed relative
//! to the previous one exactly when the inner run length is odd.
//! [`Alternation::PerLine`] flips once per finished run instead, which
//! gives the usual serpentine scan.

use serde::{Deserialize, Serialize};

/// A grid position as `(row, col)`.
pub type Coordinate = (usize, usize);

/// When the inner direction flag flips under `alternate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternation {
    /// After every yielded coordinate.
    #[default]
    PerCoordinate,
    /// After every completed row or column.
    PerLine,
}

/// Direction and ordering flags for a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    pub left_to_right: bool,
    pub top_to_bottom: bool,
    pub horizontal_first: bool,
    pub alternate: bool,
    pub alternation: Alternation,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            left_to_right: true,
            top_to_bottom: true,
            horizontal_first: true,
            alternate: false,
            alternation: Alternation::PerCoordinate,
        }
    }
}

impl TraversalConfig {
    /// Builds a config from the four direction flags.
    pub fn new(
        left_to_right: bool,
        top_to_bottom: bool,
        horizontal_first: bool,
        alternate: bool,
    ) -> Self {
        Self {
            left_to_right,
            top_to_bottom,
            horizontal_first,
            alternate,
            alternation: Alternation::PerCoordinate,
        }
    }

    pub fn with_alternation(mut self, alternation: Alternation) -> Self {
        self.alternation = alternation;
        self
    }

    /// Starts a walk over a `height x width` grid.
    pub fn walk(&self, height: usize, width: usize) -> TraversalPath {
        TraversalPath::new(*self, height, width)
    }
}

/// A single, non-restartable walk over a grid.
///
/// Build a new path from the same config to walk again.
#[derive(Debug, Clone)]
pub struct TraversalPath {
    horizontal_first: bool,
    alternation: Option<Alternation>,
    outer_len: usize,
    inner_len: usize,
    outer_forward: bool,
    /// Live inner direction flag, flipped under alternation.
    inner_forward: bool,
    /// Direction latched at the start of the current inner run.
    run_forward: bool,
    outer_pos: usize,
    inner_pos: usize,
    remaining: usize,
}

impl TraversalPath {
    pub fn new(config: TraversalConfig, height: usize, width: usize) -> Self {
        let (outer_len, inner_len, outer_forward, inner_forward) = if config.horizontal_first {
            (height, width, config.top_to_bottom, config.left_to_right)
        } else {
            (width, height, config.left_to_right, config.top_to_bottom)
        };
        Self {
            horizontal_first: config.horizontal_first,
            alternation: config.alternate.then_some(config.alternation),
            outer_len,
            inner_len,
            outer_forward,
            inner_forward,
            run_forward: inner_forward,
            outer_pos: 0,
            inner_pos: 0,
            remaining: height * width,
        }
    }

    /// Caps the walk at `len` coordinates.
    pub fn truncate(mut self, len: usize) -> Self {
        self.remaining = self.remaining.min(len);
        self
    }

    /// Number of coordinates still to be yielded.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[inline]
fn oriented(pos: usize, len: usize, forward: bool) -> usize {
    if forward {
        pos
    } else {
        len - 1 - pos
    }
}

impl Iterator for TraversalPath {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        if self.remaining == 0 {
            return None;
        }
        if self.inner_pos == 0 {
            self.run_forward = self.inner_forward;
        }

        let outer = oriented(self.outer_pos, self.outer_len, self.outer_forward);
        let inner = oriented(self.inner_pos, self.inner_len, self.run_forward);
        let coordinate = if self.horizontal_first {
            (outer, inner)
        } else {
            (inner, outer)
        };

        self.remaining -= 1;
        self.inner_pos += 1;
        if self.alternation == Some(Alternation::PerCoordinate) {
            self.inner_forward = !self.inner_forward;
        }
        if self.inner_pos == self.inner_len {
            self.inner_pos = 0;
            self.outer_pos += 1;
            if self.alternation == Some(Alternation::PerLine) {
                self.inner_forward = !self.inner_forward;
            }
        }

        Some(coordinate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TraversalPath {}

impl std::iter::FusedIterator for TraversalPath {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn collect(config: TraversalConfig, height: usize, width: usize) -> Vec<Coordinate> {
        config.walk(height, width).collect()
    }

    #[test]
    fn test_row_major_default() {
        let path = collect(TraversalConfig::default(), 2, 3);
        assert_eq!(path, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_reversed_directions() {
        let path = collect(TraversalConfig::new(false, false, true, false), 2, 2);
        assert_eq!(path, vec![(1, 1), (1, 0), (0, 1), (0, 0)]);
    }

    #[test]
    fn test_column_major() {
        let path = collect(TraversalConfig::new(true, false, false, false), 2, 2);
        assert_eq!(path, vec![(1, 0), (0, 0), (1, 1), (0, 1)]);
    }

    #[test]
    fn test_per_coordinate_flip_odd_width() {
        // Three flips per row leave the flag inverted for the next row.
        let path = collect(TraversalConfig::new(true, true, true, true), 2, 3);
        assert_eq!(path, vec![(0, 0), (0, 1), (0, 2), (1, 2), (1, 1), (1, 0)]);
    }

    #[test]
    fn test_per_coordinate_flip_even_width() {
        // Two flips per row cancel out.
        let path = collect(TraversalConfig::new(true, true, true, true), 2, 2);
        assert_eq!(path, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_per_line_serpentine() {
        let config =
            TraversalConfig::new(true, true, true, true).with_alternation(Alternation::PerLine);
        let path = collect(config, 3, 2);
        assert_eq!(path, vec![(0, 0), (0, 1), (1, 1), (1, 0), (2, 0), (2, 1)]);
    }

    #[test]
    fn test_every_flag_combination_covers_grid() {
        for bits in 0..16u8 {
            let config = TraversalConfig::new(
                bits & 1 != 0,
                bits & 2 != 0,
                bits & 4 != 0,
                bits & 8 != 0,
            );
            for (h, w) in [(1, 1), (3, 4), (5, 3), (4, 4)] {
                let path = collect(config, h, w);
                let unique: HashSet<Coordinate> = path.iter().copied().collect();

                assert_eq!(path.len(), h * w, "{config:?} {h}x{w}");
                assert_eq!(unique.len(), h * w, "{config:?} {h}x{w}");
                assert!(path.iter().all(|&(r, c)| r < h && c < w));
            }
        }
    }

    #[test]
    fn test_not_restartable() {
        let mut path = TraversalConfig::default().walk(1, 2);
        assert_eq!(path.next(), Some((0, 0)));
        assert_eq!(path.next(), Some((0, 1)));
        assert_eq!(path.next(), None);
        assert_eq!(path.next(), None);
        assert!(path.is_exhausted());
    }

    #[test]
    fn test_truncate() {
        let path: Vec<_> = TraversalConfig::default().walk(4, 4).truncate(5).collect();
        assert_eq!(path.len(), 5);
        assert_eq!(path[4], (1, 0));
    }

    #[test]
    fn test_empty_grid() {
        assert_eq!(TraversalConfig::default().walk(0, 5).count(), 0);
    }
}
