//! Pattern-walk bit extraction.
//!
//! Each [`ExtractionRule`] walks the image along its own
//! [`TraversalPath`] and reads one bit of one channel per visited pixel.
//! All rules feed a shared [`BitAccumulator`], either one rule after the
//! other or interleaved round-robin.

mod bitstream;
mod traversal;

pub use bitstream::{BitAccumulator, BitOrder, Bitstream, MAX_GROUP_BITS};
pub use traversal::{Alternation, Coordinate, TraversalConfig, TraversalPath};

use crate::error::{Error, Result};
use crate::raster::PixelMatrix;
use crate::transform::parse_number;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Reads bit `bit` of channel `channel` along `traversal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub channel: usize,
    pub bit: u32,
    #[serde(default)]
    pub traversal: TraversalConfig,
}

impl ExtractionRule {
    /// A rule walking the image row by row, left to right.
    pub fn new(channel: usize, bit: u32) -> Self {
        Self {
            channel,
            bit,
            traversal: TraversalConfig::default(),
        }
    }

    pub fn with_traversal(mut self, traversal: TraversalConfig) -> Self {
        self.traversal = traversal;
        self
    }

    fn check(&self, matrix: &PixelMatrix) -> Result<()> {
        let depth = matrix
            .bits_per_channel()
            .get(self.channel)
            .copied()
            .ok_or_else(|| {
                Error::invalid(format!(
                    "extraction rule addresses channel {} but the image has {}",
                    self.channel,
                    matrix.channel_count()
                ))
            })?;
        if self.bit >= u32::from(depth) {
            return Err(Error::invalid(format!(
                "bit {} outside {depth}-bit channel {}",
                self.bit, self.channel
            )));
        }
        Ok(())
    }
}

/// Parses `channel:bit`; the traversal is left at its default.
impl FromStr for ExtractionRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (channel, bit) = s
            .split_once(':')
            .ok_or_else(|| Error::invalid(format!("extraction rule {s:?} is not channel:bit")))?;
        Ok(ExtractionRule::new(
            parse_number(channel)? as usize,
            parse_number(bit)?,
        ))
    }
}

/// A rule together with the path it is walking.
#[derive(Debug, Clone)]
pub struct Walker {
    rule: ExtractionRule,
    path: TraversalPath,
}

impl Walker {
    /// Pairs `rule` with a path of the caller's choosing.
    pub fn new(rule: ExtractionRule, path: TraversalPath) -> Self {
        Self { rule, path }
    }

    /// Pairs `rule` with a full walk over `matrix`.
    pub fn over(rule: ExtractionRule, matrix: &PixelMatrix) -> Self {
        let path = rule.traversal.walk(matrix.height(), matrix.width());
        Self { rule, path }
    }

    pub fn rule(&self) -> &ExtractionRule {
        &self.rule
    }

    /// Pushes the next bit, or returns `Ok(false)` once the path is exhausted.
    fn step(&mut self, matrix: &PixelMatrix, accumulator: &mut BitAccumulator) -> Result<bool> {
        let Some((row, col)) = self.path.next() else {
            return Ok(false);
        };
        let sample = matrix.get(row, col, self.rule.channel).ok_or_else(|| {
            Error::invalid(format!(
                "path visited ({row}, {col}) outside {}x{} image",
                matrix.height(),
                matrix.width()
            ))
        })?;
        accumulator.push_bit(sample & (1 << self.rule.bit) != 0);
        Ok(true)
    }
}

/// Runs a list of extraction rules against an image.
#[derive(Debug, Clone, Default)]
pub struct BitstreamExtractor {
    rules: Vec<ExtractionRule>,
    zip_components: bool,
}

impl BitstreamExtractor {
    pub fn new(rules: Vec<ExtractionRule>) -> Self {
        Self {
            rules,
            zip_components: false,
        }
    }

    /// Interleave rules one bit at a time instead of running them in turn.
    pub fn zip_components(mut self, zip: bool) -> Self {
        self.zip_components = zip;
        self
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    /// Extracts into a byte-grouped, MSB-first accumulator.
    pub fn extract(&self, matrix: &PixelMatrix) -> Result<Bitstream> {
        let mut accumulator = BitAccumulator::bytes_msb_first();
        self.extract_into(matrix, &mut accumulator)?;
        Ok(Bitstream::from_accumulator(&accumulator))
    }

    /// Extracts into a caller-provided accumulator.
    ///
    /// Returns the number of bits pushed by this call.
    pub fn extract_into(
        &self,
        matrix: &PixelMatrix,
        accumulator: &mut BitAccumulator,
    ) -> Result<usize> {
        let walkers = self
            .rules
            .iter()
            .map(|rule| Walker::over(*rule, matrix))
            .collect();
        extract_walkers(matrix, walkers, self.zip_components, accumulator)
    }
}

/// Drives `walkers` against `matrix`, pushing one bit per step.
///
/// Without `zip`, each walker in turn delivers one bit per pixel of
/// `matrix`; with `zip`, walkers take turns one bit at a time. In both
/// modes the whole run ends as soon as any walker's path runs out while
/// it still owes a bit, so later walkers may never run.
pub fn extract_walkers(
    matrix: &PixelMatrix,
    mut walkers: Vec<Walker>,
    zip: bool,
    accumulator: &mut BitAccumulator,
) -> Result<usize> {
    for walker in &walkers {
        walker.rule.check(matrix)?;
    }
    let start = accumulator.total_bits();
    let quota = matrix.pixel_count();
    tracing::debug!(rules = walkers.len(), zip, quota, "Starting bit extraction");

    let exhausted = 'run: {
        if walkers.is_empty() {
            break 'run None;
        }
        if zip {
            loop {
                for (index, walker) in walkers.iter_mut().enumerate() {
                    if !walker.step(matrix, accumulator)? {
                        break 'run Some(index);
                    }
                }
            }
        } else {
            for (index, walker) in walkers.iter_mut().enumerate() {
                for _ in 0..quota {
                    if !walker.step(matrix, accumulator)? {
                        break 'run Some(index);
                    }
                }
            }
            None
        }
    };

    let pushed = accumulator.total_bits() - start;
    tracing::debug!(bits = pushed, exhausted_rule = ?exhausted, "Bit extraction finished");
    Ok(pushed)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x4 RGB image; channel 0 carries 0xB4 in bit 0 row-major, channel 1
    /// carries 0xFF in bit 1.
    fn carrier() -> PixelMatrix {
        let payload = 0xB4u32;
        PixelMatrix::from_fn(4, 2, vec![8, 8, 8], |r, c, ch| {
            let index = r * 4 + c;
            match ch {
                0 => 0xF0 | ((payload >> (7 - index)) & 1),
                1 => 0b10,
                _ => 0,
            }
        })
        .unwrap()
    }

    #[test]
    fn test_single_rule_reads_lsb_plane() {
        let stream = BitstreamExtractor::new(vec![ExtractionRule::new(0, 0)])
            .extract(&carrier())
            .unwrap();

        assert_eq!(stream.data(), &[0xB4]);
        assert_eq!(stream.bit_count(), 8);
    }

    #[test]
    fn test_sequential_rules() {
        let rules = vec![ExtractionRule::new(0, 0), ExtractionRule::new(1, 1)];
        let stream = BitstreamExtractor::new(rules).extract(&carrier()).unwrap();

        assert_eq!(stream.data(), &[0xB4, 0xFF]);
    }

    #[test]
    fn test_zipped_rules() {
        let rules = vec![ExtractionRule::new(0, 0), ExtractionRule::new(2, 0)];
        let stream = BitstreamExtractor::new(rules)
            .zip_components(true)
            .extract(&carrier())
            .unwrap();

        // 1,0,1,1,0,1,0,0 interleaved with zeros.
        assert_eq!(stream.data(), &[0b1000_1010, 0b0010_0000]);
    }

    #[test]
    fn test_reversed_traversal() {
        let rule = ExtractionRule::new(0, 0)
            .with_traversal(TraversalConfig::new(false, false, true, false));
        let stream = BitstreamExtractor::new(vec![rule]).extract(&carrier()).unwrap();

        assert_eq!(stream.data(), &[0x2D]);
    }

    #[test]
    fn test_truncated_path_stops_sequential_run() {
        let m = carrier();
        let walkers = vec![
            Walker::new(ExtractionRule::new(1, 1), TraversalConfig::default().walk(2, 4).truncate(3)),
            Walker::over(ExtractionRule::new(0, 0), &m),
        ];
        let mut acc = BitAccumulator::default();
        let pushed = extract_walkers(&m, walkers, false, &mut acc).unwrap();

        assert_eq!(pushed, 3);
        assert_eq!(acc.bytes(), vec![0b1110_0000]);
    }

    #[test]
    fn test_truncated_path_stops_zipped_run() {
        let m = carrier();
        let walkers = vec![
            Walker::over(ExtractionRule::new(1, 1), &m),
            Walker::new(ExtractionRule::new(0, 0), TraversalConfig::default().walk(2, 4).truncate(2)),
        ];
        let mut acc = BitAccumulator::default();
        let pushed = extract_walkers(&m, walkers, true, &mut acc).unwrap();

        // Two full rounds, then the first walker's third bit.
        assert_eq!(pushed, 5);
    }

    #[test]
    fn test_shared_accumulator_keeps_earlier_bits() {
        let mut acc = BitAccumulator::default();
        acc.push_bit(true);
        let extractor = BitstreamExtractor::new(vec![ExtractionRule::new(2, 0)]);

        assert_eq!(extractor.extract_into(&carrier(), &mut acc).unwrap(), 8);
        assert_eq!(acc.total_bits(), 9);
    }

    #[test]
    fn test_invalid_rules() {
        let m = carrier();
        let bad_channel = BitstreamExtractor::new(vec![ExtractionRule::new(3, 0)]);
        let bad_bit = BitstreamExtractor::new(vec![ExtractionRule::new(0, 8)]);

        assert!(matches!(bad_channel.extract(&m), Err(Error::InvalidArgument(_))));
        assert!(matches!(bad_bit.extract(&m), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_no_rules_yields_nothing() {
        let stream = BitstreamExtractor::new(Vec::new()).extract(&carrier()).unwrap();
        assert!(stream.is_empty());
    }

    #[test]
    fn test_parse_rule() {
        assert_eq!("2:0x1".parse::<ExtractionRule>().unwrap(), ExtractionRule::new(2, 1));
        assert!("2".parse::<ExtractionRule>().is_err());
    }
}
