//! Linear-trend forecaster.

use crate::error::{EngineError, Result};
use tracing::debug;
use u_numflow::stats::{covariance, mean, variance};

/// One observed value at an ordinal period.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub period: f64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(period: f64, value: f64) -> Self {
        Self { period, value }
    }

    fn is_finite(&self) -> bool {
        self.period.is_finite() && self.value.is_finite()
    }
}

impl From<(f64, f64)> for TimeSeriesPoint {
    fn from((period, value): (f64, f64)) -> Self {
        Self::new(period, value)
    }
}

/// A projected value with a heuristic confidence in `[0, 1]`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    /// 1-based ordinal continuing the history (`n + i`).
    pub period: usize,
    pub predicted: f64,
    pub confidence: f64,
}

/// Ordinary-least-squares line over `x = 1..=n`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination. 1.0 for a perfect fit, and also for a
    /// constant series, which a flat line explains exactly.
    pub r_squared: f64,
    /// Number of points fitted.
    pub n: usize,
}

impl LinearTrend {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fits `value ~ slope · x + intercept` with `x` the 1-based position.
///
/// Slope is `cov(x, y) / var(x)`. Returns `None` for fewer than two values
/// or any non-finite value.
///
/// # Complexity
/// O(n)
pub fn fit_linear_trend(values: &[f64]) -> Option<LinearTrend> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let xs: Vec<f64> = (1..=n).map(|i| i as f64).collect();
    let slope = covariance(&xs, values)? / variance(&xs)?;
    let intercept = mean(values)? - slope * mean(&xs)?;

    let ss_tot = variance(values)? * (n - 1) as f64;
    let ss_res: f64 = values
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (slope * (i + 1) as f64 + intercept)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    Some(LinearTrend {
        slope,
        intercept,
        r_squared,
        n,
    })
}

/// Forecaster parameters.
///
/// Confidence for the `i`-th projected step is
/// `max(confidence_floor, base_confidence − confidence_decay · i)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastConfig {
    pub base_confidence: f64,
    pub confidence_decay: f64,
    pub confidence_floor: f64,
    /// Fewest usable points needed to produce a forecast.
    pub min_history: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_confidence: 0.8,
            confidence_decay: 0.05,
            confidence_floor: 0.05,
            min_history: 3,
        }
    }
}

impl ForecastConfig {
    /// Clamped to `[0, 1]`.
    pub fn with_base_confidence(mut self, v: f64) -> Self {
        self.base_confidence = v.clamp(0.0, 1.0);
        self
    }

    /// Clamped to `>= 0`.
    pub fn with_confidence_decay(mut self, v: f64) -> Self {
        self.confidence_decay = v.max(0.0);
        self
    }

    /// Clamped to `[0, 1]`.
    pub fn with_confidence_floor(mut self, v: f64) -> Self {
        self.confidence_floor = v.clamp(0.0, 1.0);
        self
    }

    /// Raised to at least 2, the minimum for a line fit.
    pub fn with_min_history(mut self, n: usize) -> Self {
        self.min_history = n.max(2);
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("base_confidence", self.base_confidence),
            ("confidence_floor", self.confidence_floor),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(EngineError::invalid(format!("{name} must be in [0, 1], got {v}")));
            }
        }
        if !self.confidence_decay.is_finite() || self.confidence_decay < 0.0 {
            return Err(EngineError::invalid("confidence_decay must be non-negative"));
        }
        if self.confidence_floor > self.base_confidence {
            return Err(EngineError::invalid(
                "confidence_floor cannot exceed base_confidence",
            ));
        }
        if self.min_history < 2 {
            return Err(EngineError::invalid("min_history must be at least 2"));
        }
        Ok(())
    }

    /// Confidence for the `step`-th projected period (1-based).
    pub fn confidence_at(&self, step: usize) -> f64 {
        (self.base_confidence - self.confidence_decay * step as f64).max(self.confidence_floor)
    }
}

/// Projects a series forward along its least-squares trend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    /// # Errors
    /// [`EngineError::InvalidInput`] if `config` fails
    /// [`ForecastConfig::validate`].
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Fitted trend for `history` after cleaning, if enough points remain.
    pub fn trend(&self, history: &[TimeSeriesPoint]) -> Option<LinearTrend> {
        let values = clean(history);
        if values.len() < self.config.min_history {
            return None;
        }
        fit_linear_trend(&values)
    }

    /// Projects `horizon` periods past the end of `history`.
    ///
    /// Points with a non-finite period or value are dropped and the rest are
    /// ordered by period. Predictions are floored at 0.
    ///
    /// Returns `None` when fewer than `min_history` usable points remain.
    /// A horizon of 0 yields an empty forecast.
    pub fn forecast(&self, history: &[TimeSeriesPoint], horizon: usize) -> Option<Vec<ForecastPoint>> {
        let trend = self.trend(history)?;
        debug!(
            points = trend.n,
            slope = trend.slope,
            intercept = trend.intercept,
            horizon,
            "fitted demand trend"
        );

        let points = (1..=horizon)
            .map(|i| {
                let period = trend.n + i;
                ForecastPoint {
                    period,
                    predicted: trend.at(period as f64).max(0.0),
                    confidence: self.config.confidence_at(i),
                }
            })
            .collect();
        Some(points)
    }
}

/// [`Forecaster::forecast`] with the default configuration.
///
/// # Examples
///
/// ```
/// use u_siteopt::forecast::{forecast, TimeSeriesPoint};
///
/// let history: Vec<TimeSeriesPoint> =
///     vec![(1.0, 100.0).into(), (2.0, 110.0).into(), (3.0, 120.0).into()];
/// let out = forecast(&history, 2).unwrap();
/// assert_eq!(out[0].period, 4);
/// assert!((out[0].predicted - 130.0).abs() < 1e-9);
/// ```
pub fn forecast(history: &[TimeSeriesPoint], horizon: usize) -> Option<Vec<ForecastPoint>> {
    Forecaster::default().forecast(history, horizon)
}

fn clean(history: &[TimeSeriesPoint]) -> Vec<f64> {
    let mut points: Vec<TimeSeriesPoint> = history.iter().copied().filter(TimeSeriesPoint::is_finite).collect();
    points.sort_by(|a, b| a.period.total_cmp(&b.period));
    points.into_iter().map(|p| p.value).collect()
}
