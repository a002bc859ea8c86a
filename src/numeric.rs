//! Shared numeric helpers: weight normalization, distances, and feature
//! scaling. Summary statistics come from [`u_numflow::stats`].

use crate::error::{EngineError, Result};
use std::collections::BTreeMap;

/// Tolerance for "weights sum to one" checks.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Rescales non-negative weights so they sum to 1.
///
/// Weights are first divided by the largest one, so any finite input sums
/// without overflow.
///
/// # Errors
/// [`EngineError::InvalidInput`] if the slice is empty, any weight is
/// negative or non-finite, or the weights sum to zero.
pub fn normalize_weight_slice(weights: &[f64]) -> Result<Vec<f64>> {
    if weights.is_empty() {
        return Err(EngineError::invalid("weights must not be empty"));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(EngineError::invalid(format!(
            "weights must be finite and non-negative, got {w}"
        )));
    }
    let largest = weights.iter().copied().fold(0.0, f64::max);
    if largest <= 0.0 {
        return Err(EngineError::invalid("weights must not sum to zero"));
    }
    let scaled: Vec<f64> = weights.iter().map(|w| w / largest).collect();
    let total: f64 = scaled.iter().sum();
    Ok(scaled.into_iter().map(|w| w / total).collect())
}

/// Map form of [`normalize_weight_slice`]; keys keep their sorted order.
pub fn normalize_weights(weights: &BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>> {
    let values: Vec<f64> = weights.values().copied().collect();
    let normalized = normalize_weight_slice(&values)?;
    Ok(weights.keys().cloned().zip(normalized).collect())
}

/// Euclidean distance between two equal-length vectors.
///
/// Extra trailing components of the longer vector are ignored.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Min-max scales values into `[0, 1]`.
///
/// A constant column (max == min) maps to all zeros.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    values
        .iter()
        .map(|v| if span > 0.0 { (v - min) / span } else { 0.0 })
        .collect()
}
