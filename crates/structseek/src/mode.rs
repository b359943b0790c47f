//! Combination modes.
//!
//! [`BitMode`] decides how a bitfield value is compared against a filter's
//! operand; [`FilterMode`] decides how per-filter verdicts combine into one
//! per-resource verdict.

use serde::{Deserialize, Serialize};

/// Bitfield comparison mode.
///
/// With `bits` the field value and `value` the filter operand:
/// - **Exact**: `bits == value`
/// - **And**: every bit of `value` is set in `bits`
/// - **Or**: at least one bit of `value` is set in `bits`
/// - **Xor**: exactly one bit of `value` is set in `bits`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitMode {
    #[default]
    Exact,
    And,
    Or,
    Xor,
}

impl BitMode {
    /// Evaluates the mode for a field value and a filter operand.
    pub fn eval(self, bits: u64, value: u64) -> bool {
        match self {
            BitMode::Exact => bits == value,
            BitMode::And => bits & value == value,
            BitMode::Or => bits & value != 0,
            BitMode::Xor => (bits & value).count_ones() == 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BitMode::Exact => "exact",
            BitMode::And => "and",
            BitMode::Or => "or",
            BitMode::Xor => "xor",
        }
    }
}

impl std::fmt::Display for BitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregation of per-filter verdicts for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Every filter must be satisfied (AND).
    #[default]
    #[serde(alias = "and")]
    MatchAll,
    /// At least one filter must be satisfied (OR).
    #[serde(alias = "or")]
    MatchAny,
    /// Exactly one filter must be satisfied (XOR).
    #[serde(alias = "xor")]
    MatchOne,
}

impl FilterMode {
    /// Final verdict given how many of `total` filters were satisfied.
    pub fn verdict(self, satisfied: usize, total: usize) -> bool {
        match self {
            FilterMode::MatchAll => satisfied == total,
            FilterMode::MatchAny => satisfied > 0,
            FilterMode::MatchOne => satisfied == 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::MatchAll => "and",
            FilterMode::MatchAny => "or",
            FilterMode::MatchOne => "xor",
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
