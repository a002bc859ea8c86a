//! Demand trend forecasting.
//!
//! Fits an ordinary-least-squares line to a short demand history (one value
//! per period, indexed `1..=n` after ordering) and extends it `horizon`
//! periods. Confidence decays linearly with distance from the last
//! observation down to a floor; it is a heuristic ranking signal, not a
//! prediction interval.

mod forecaster;

pub use forecaster::{
    fit_linear_trend, forecast, ForecastConfig, ForecastPoint, Forecaster, LinearTrend,
    TimeSeriesPoint,
};
