//! Channel recombination under bitwise mask rules.

use super::split::split;
use crate::error::{Error, Result};
use crate::raster::{Channel, PixelMatrix};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Bitwise operation applied by a [`MaskRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MaskOp {
    And,
    Or,
    Xor,
}

impl MaskOp {
    /// Applies the operation to every sample of `channel`.
    pub fn apply(self, channel: Channel, value: u32) -> Channel {
        match self {
            MaskOp::And => channel.and(value),
            MaskOp::Or => channel.or(value),
            MaskOp::Xor => channel.xor(value),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            MaskOp::And => "&",
            MaskOp::Or => "|",
            MaskOp::Xor => "^",
        }
    }
}

impl FromStr for MaskOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "&" | "and" => Ok(MaskOp::And),
            "|" | "or" => Ok(MaskOp::Or),
            "^" | "xor" => Ok(MaskOp::Xor),
            other => Err(Error::invalid(format!("unknown mask operation {other:?}"))),
        }
    }
}

impl TryFrom<String> for MaskOp {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<MaskOp> for String {
    fn from(op: MaskOp) -> String {
        op.symbol().to_string()
    }
}

impl std::fmt::Display for MaskOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One recombination step: `shift_left(channel <op> value, shift)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRule {
    pub op: MaskOp,
    pub channel: usize,
    pub value: u32,
    #[serde(default)]
    pub shift: u32,
}

impl MaskRule {
    pub fn new(op: MaskOp, channel: usize, value: u32) -> Self {
        Self {
            op,
            channel,
            value,
            shift: 0,
        }
    }

    pub fn with_shift(mut self, shift: u32) -> Self {
        self.shift = shift;
        self
    }

    fn apply(&self, channel: Channel) -> Channel {
        self.op.apply(channel, self.value).shift_left(self.shift)
    }
}

/// Parses `op:channel:value[:shift]`, e.g. `&:0:0x0f` or `xor:2:255:1`.
///
/// Values accept decimal, `0x` hex and `0b` binary notation.
impl FromStr for MaskRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(Error::invalid(format!(
                "mask rule {s:?} is not op:channel:value[:shift]"
            )));
        }
        let op = parts[0].parse()?;
        let channel = parse_number(parts[1])? as usize;
        let value = parse_number(parts[2])?;
        let shift = parts.get(3).map(|p| parse_number(p)).transpose()?.unwrap_or(0);
        Ok(MaskRule::new(op, channel, value).with_shift(shift))
    }
}

pub(crate) fn parse_number(text: &str) -> Result<u32> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        u32::from_str_radix(bin, 2)
    } else {
        text.parse()
    };
    parsed.map_err(|e| Error::invalid(format!("bad number {text:?}: {e}")))
}

fn check_rule(matrix: &PixelMatrix, rule: &MaskRule) -> Result<()> {
    if rule.channel >= matrix.channel_count() {
        return Err(Error::invalid(format!(
            "mask rule addresses channel {} but the image has {}",
            rule.channel,
            matrix.channel_count()
        )));
    }
    Ok(())
}

/// Applies `rules` to the channels of `matrix` and concatenates the results.
///
/// With `multi_mask` unset every rule transforms a fresh copy of its
/// channel and contributes one output channel, in rule order.
///
/// With `multi_mask` set, rules accumulate per channel index: a rule
/// starts from whatever the previous rule on that index produced. One
/// output channel is emitted per referenced index, in the order the
/// indices were first referenced.
pub fn masked_components(
    matrix: &PixelMatrix,
    rules: &[MaskRule],
    multi_mask: bool,
) -> Result<PixelMatrix> {
    for rule in rules {
        check_rule(matrix, rule)?;
    }
    tracing::debug!(rules = rules.len(), multi_mask, "Recombining masked components");

    let mut current = split(matrix);
    let mut outputs = Vec::with_capacity(rules.len());
    let mut order: Vec<usize> = Vec::new();

    for rule in rules {
        let masked = rule.apply(current[rule.channel].clone());
        if multi_mask {
            current[rule.channel] = masked;
            if !order.contains(&rule.channel) {
                order.push(rule.channel);
            }
        } else {
            outputs.push(masked);
        }
    }

    if multi_mask {
        outputs = order.into_iter().map(|i| current[i].clone()).collect();
    }

    PixelMatrix::from_channels(outputs)
}

fn masked_component(
    matrix: &PixelMatrix,
    op: MaskOp,
    channel: usize,
    value: u32,
    shift: u32,
) -> Result<PixelMatrix> {
    let rule = MaskRule::new(op, channel, value).with_shift(shift);
    check_rule(matrix, &rule)?;
    Ok(rule.apply(matrix.channel(channel)?).into_matrix())
}

/// ANDs one channel with `value`, then shifts it left by `shift`.
pub fn and_masked_component(
    matrix: &PixelMatrix,
    channel: usize,
    value: u32,
    shift: u32,
) -> Result<PixelMatrix> {
    masked_component(matrix, MaskOp::And, channel, value, shift)
}

/// ORs one channel with `value`, then shifts it left by `shift`.
pub fn or_masked_component(
    matrix: &PixelMatrix,
    channel: usize,
    value: u32,
    shift: u32,
) -> Result<PixelMatrix> {
    masked_component(matrix, MaskOp::Or, channel, value, shift)
}

/// XORs one channel with `value`, then shifts it left by `shift`.
pub fn xor_masked_component(
    matrix: &PixelMatrix,
    channel: usize,
    value: u32,
    shift: u32,
) -> Result<PixelMatrix> {
    masked_component(matrix, MaskOp::Xor, channel, value, shift)
}
