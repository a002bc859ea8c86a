//! Value types for criteria ranking.

use crate::error::{EngineError, Result};
use crate::numeric::normalize_weights;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One candidate site or configuration: a named bundle of criterion values.
///
/// Values are expected to be oriented so that higher is better; a caller with
/// a "lower is better" criterion (cost, distance) inverts it first.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub name: String,
    pub values: BTreeMap<String, f64>,
}

impl Alternative {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Adds or replaces one criterion value.
    pub fn with_value(mut self, criterion: impl Into<String>, value: f64) -> Self {
        self.values.insert(criterion.into(), value);
        self
    }

    /// Value for `criterion`; missing criteria count as 0.
    pub fn value(&self, criterion: &str) -> f64 {
        self.values.get(criterion).copied().unwrap_or(0.0)
    }
}

/// Criterion name → non-negative weight.
///
/// Raw weights need not sum to 1; [`normalized`](Self::normalized) rescales
/// them before use.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriterionWeights(BTreeMap<String, f64>);

impl CriterionWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, criterion: impl Into<String>, weight: f64) -> Self {
        self.0.insert(criterion.into(), weight);
        self
    }

    pub fn insert(&mut self, criterion: impl Into<String>, weight: f64) {
        self.0.insert(criterion.into(), weight);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw (unnormalized) weights.
    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }

    /// Weights rescaled to sum to 1.
    ///
    /// # Errors
    /// [`EngineError::InvalidInput`] on an empty map, a negative or
    /// non-finite weight, or a zero total.
    pub fn normalized(&self) -> Result<BTreeMap<String, f64>> {
        normalize_weights(&self.0)
    }
}

impl FromIterator<(String, f64)> for CriterionWeights {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, f64>> for CriterionWeights {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self(map)
    }
}

/// Aggregation method used by the ranking engine.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingMethod {
    /// Σ weight · value.
    #[default]
    WeightedSum,

    /// Relative closeness to the ideal and anti-ideal solutions.
    ///
    /// Reference: Hwang & Yoon (1981), "Multiple Attribute Decision Making"
    Topsis,

    /// Accepted for compatibility; scored exactly like [`WeightedSum`].
    ///
    /// No pairwise comparison matrix is built. The caller's weights are
    /// taken as the already-derived AHP priority vector.
    ///
    /// [`WeightedSum`]: RankingMethod::WeightedSum
    Ahp,
}

impl fmt::Display for RankingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RankingMethod::WeightedSum => "weighted_sum",
            RankingMethod::Topsis => "topsis",
            RankingMethod::Ahp => "ahp",
        };
        f.write_str(s)
    }
}

impl FromStr for RankingMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted_sum" => Ok(RankingMethod::WeightedSum),
            "topsis" => Ok(RankingMethod::Topsis),
            "ahp" => Ok(RankingMethod::Ahp),
            other => Err(EngineError::invalid(format!(
                "unsupported ranking method: {other}"
            ))),
        }
    }
}

/// An alternative with its score, rank, and per-criterion contributions.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub alternative: Alternative,

    /// Aggregate score; higher is better.
    pub score: f64,

    /// 1-based position; 1 is best.
    pub rank: usize,

    /// Contribution of each weighted criterion to the score.
    ///
    /// Weighted sum: `weight · value`. TOPSIS: the weighted, vector-normalized
    /// value the distances were computed from.
    pub tradeoffs: BTreeMap<String, f64>,
}
