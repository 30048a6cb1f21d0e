//! File-based configuration.
//!
//! Every section is optional; missing sections and fields fall back to
//! the same defaults the library uses.

use crate::analysis::MagicEyeConfig;
use crate::extraction::{BitOrder, ExtractionRule, MAX_GROUP_BITS};
use crate::transform::MaskRule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("layer width must be at least one bit")]
    InvalidLayerBits,
    #[error("group size must be 1-64 bits")]
    InvalidGroupBits,
    #[error("border area must lie in [0, 1)")]
    InvalidBorderArea,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Bit-plane splitting options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Bits per layer; layers overlap when greater than one.
    pub bits: u32,
    /// Split every channel at its own depth instead of the whole image.
    pub per_component: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            bits: 1,
            per_component: false,
        }
    }
}

/// Masked recombination options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Accumulate rules per channel instead of emitting one channel per rule.
    pub multi_mask: bool,
    pub rules: Vec<MaskRule>,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            multi_mask: true,
            rules: Vec::new(),
        }
    }
}

/// Bit extraction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub group_bits: u32,
    pub bit_order: BitOrder,
    pub zip_components: bool,
    pub rules: Vec<ExtractionRule>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            group_bits: 8,
            bit_order: BitOrder::MsbFirst,
            zip_components: false,
            rules: Vec::new(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory images are written to.
    pub directory: PathBuf,
    /// Stretch sample range to full intensity instead of scaling by depth.
    pub stretch: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            stretch: false,
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub layers: LayerConfig,
    #[serde(default)]
    pub masks: MaskConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub magic_eye: MagicEyeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers.bits == 0 {
            return Err(ConfigError::InvalidLayerBits);
        }
        if self.extraction.group_bits == 0 || self.extraction.group_bits > MAX_GROUP_BITS {
            return Err(ConfigError::InvalidGroupBits);
        }
        if self.magic_eye.validate().is_err() {
            return Err(ConfigError::InvalidBorderArea);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::TraversalConfig;
    use crate::transform::MaskOp;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.masks.multi_mask);
        assert_eq!(config.extraction.group_bits, 8);
    }

    #[test]
    fn test_parse_full_file() {
        let config = FileConfig::from_toml(
            r#"
            [layers]
            bits = 2

            [masks]
            multi_mask = false
            rules = [
                { op = "&", channel = 0, value = 15 },
                { op = "xor", channel = 2, value = 255, shift = 1 },
            ]

            [extraction]
            group_bits = 16
            bit_order = "lsb-first"
            zip_components = true

            [[extraction.rules]]
            channel = 1
            bit = 0
            traversal = { left_to_right = false, alternate = true, alternation = "per-line" }

            [magic_eye]
            horizontal = false
            number_of_results = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.layers.bits, 2);
        assert!(!config.masks.multi_mask);
        assert_eq!(
            config.masks.rules[1],
            MaskRule::new(MaskOp::Xor, 2, 255).with_shift(1)
        );
        assert_eq!(config.extraction.bit_order, BitOrder::LsbFirst);

        let traversal = config.extraction.rules[0].traversal;
        assert!(!traversal.left_to_right);
        assert!(traversal.top_to_bottom);
        assert_eq!(
            traversal,
            TraversalConfig::new(false, true, true, true)
                .with_alternation(crate::extraction::Alternation::PerLine)
        );
        assert_eq!(config.magic_eye.number_of_results, 3);
        assert!(config.magic_eye.min_value);
    }

    #[test]
    fn test_unknown_mask_op_rejected() {
        let result = FileConfig::from_toml(
            r#"
            [masks]
            rules = [{ op = "%", channel = 0, value = 1 }]
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_zero_group_bits_invalid() {
        let mut config = FileConfig::default();
        config.extraction.group_bits = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGroupBits)
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FileConfig::from_file("/nonexistent/bitplane.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
