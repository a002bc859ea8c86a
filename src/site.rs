//! Site suitability features, composite scores and zoning.
//!
//! Bridges raw candidate-site measurements into the ranking engine: composite
//! scores summarize a site, [`ZoneThresholds`] buckets it green/yellow/red,
//! and [`to_alternatives`] turns a batch into [`Alternative`]s whose criteria
//! all read "higher is better".

use crate::error::{EngineError, Result};
use crate::mcda::Alternative;
use crate::numeric::min_max_normalize;
use std::fmt;
use tracing::debug;

/// Criterion names produced by [`to_alternatives`].
pub const RENEWABLE_PROXIMITY: &str = "renewable_proximity";
pub const DEMAND_PROXIMITY: &str = "demand_proximity";
pub const TRANSPORT_SCORE: &str = "transport_score";
pub const SUBSIDY_SCORE: &str = "subsidy_score";
pub const LAND_COST: &str = "land_cost";
pub const ENERGY_COST: &str = "energy_cost";

/// Range a cost factor is clamped to before zoning.
pub const COST_FACTOR_RANGE: (f64, f64) = (0.5, 10.0);

/// Measured features of one candidate site.
///
/// Proximity and score fields are unitless in `[0, 1]`. `land_cost` is in
/// currency per site and `energy_cost` in currency per kWh.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SiteFeatures {
    pub name: String,
    pub renewable_proximity: f64,
    pub demand_proximity: f64,
    pub transport_score: f64,
    pub land_cost: f64,
    pub energy_cost: f64,
    pub subsidy_score: f64,
}

impl SiteFeatures {
    /// Rejects scores outside `[0, 1]` and non-positive or non-finite costs.
    pub fn validate(&self) -> Result<()> {
        for (field, v) in [
            (RENEWABLE_PROXIMITY, self.renewable_proximity),
            (DEMAND_PROXIMITY, self.demand_proximity),
            (TRANSPORT_SCORE, self.transport_score),
            (SUBSIDY_SCORE, self.subsidy_score),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(EngineError::invalid(format!(
                    "site '{}': {field} must be in [0, 1], got {v}",
                    self.name
                )));
            }
        }
        for (field, v) in [(LAND_COST, self.land_cost), (ENERGY_COST, self.energy_cost)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(EngineError::invalid(format!(
                    "site '{}': {field} must be positive, got {v}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// `0.4 · renewable + 0.3 · demand + 0.3 · transport`, in `[0, 1]` for
    /// valid features.
    pub fn infrastructure_score(&self) -> f64 {
        0.4 * self.renewable_proximity + 0.3 * self.demand_proximity + 0.3 * self.transport_score
    }

    /// `0.4 · land_cost / 1e6 + 0.4 · energy_cost · 100 + 0.2 · (1 − subsidy)`.
    ///
    /// Land cost is counted in millions and energy cost in cents so both
    /// terms land on a comparable scale.
    pub fn cost_factor(&self) -> f64 {
        0.4 * self.land_cost / 1_000_000.0
            + 0.4 * self.energy_cost * 100.0
            + 0.2 * (1.0 - self.subsidy_score)
    }
}

/// Suitability bucket.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Zone {
    Green,
    Yellow,
    Red,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Zone::Green => "green",
            Zone::Yellow => "yellow",
            Zone::Red => "red",
        };
        f.write_str(s)
    }
}

/// Zoning cutoffs. Comparisons are strict.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneThresholds {
    /// Green requires efficiency above this...
    pub green_efficiency: f64,
    /// ...and cost below this.
    pub green_max_cost: f64,
    /// Yellow requires efficiency above this.
    pub yellow_efficiency: f64,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            green_efficiency: 0.8,
            green_max_cost: 2.5,
            yellow_efficiency: 0.6,
        }
    }
}

impl ZoneThresholds {
    pub fn with_green(mut self, min_efficiency: f64, max_cost: f64) -> Self {
        self.green_efficiency = min_efficiency;
        self.green_max_cost = max_cost;
        self
    }

    pub fn with_yellow(mut self, min_efficiency: f64) -> Self {
        self.yellow_efficiency = min_efficiency;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if ![self.green_efficiency, self.green_max_cost, self.yellow_efficiency]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(EngineError::invalid("zone thresholds must be finite"));
        }
        if self.yellow_efficiency > self.green_efficiency {
            return Err(EngineError::invalid(
                "yellow efficiency threshold cannot exceed green",
            ));
        }
        Ok(())
    }

    pub fn classify(&self, efficiency: f64, cost: f64) -> Zone {
        if efficiency > self.green_efficiency && cost < self.green_max_cost {
            Zone::Green
        } else if efficiency > self.yellow_efficiency {
            Zone::Yellow
        } else {
            Zone::Red
        }
    }
}

/// Composite view of one site.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SiteAssessment {
    pub name: String,
    pub efficiency: f64,
    pub cost: f64,
    pub zone: Zone,
}

/// Scores and zones a site.
///
/// Efficiency is the infrastructure score; cost is the cost factor clamped
/// to [`COST_FACTOR_RANGE`].
///
/// # Errors
/// [`EngineError::InvalidInput`] if the site or the thresholds fail
/// validation.
pub fn assess(site: &SiteFeatures, thresholds: &ZoneThresholds) -> Result<SiteAssessment> {
    thresholds.validate()?;
    site.validate()?;
    let efficiency = site.infrastructure_score().clamp(0.0, 1.0);
    let cost = site
        .cost_factor()
        .clamp(COST_FACTOR_RANGE.0, COST_FACTOR_RANGE.1);
    Ok(SiteAssessment {
        name: site.name.clone(),
        efficiency,
        cost,
        zone: thresholds.classify(efficiency, cost),
    })
}

/// Converts sites into ranking alternatives.
///
/// Score criteria pass through unchanged. `land_cost` and `energy_cost` are
/// min-max normalized across the batch and inverted (`1 − x`), so the
/// cheapest site gets 1. A cost shared by every site maps to 1.
///
/// # Errors
/// [`EngineError::InvalidInput`] if any site fails [`SiteFeatures::validate`].
pub fn to_alternatives(sites: &[SiteFeatures]) -> Result<Vec<Alternative>> {
    for site in sites {
        site.validate()?;
    }
    let land: Vec<f64> = sites.iter().map(|s| s.land_cost).collect();
    let energy: Vec<f64> = sites.iter().map(|s| s.energy_cost).collect();
    let land = min_max_normalize(&land);
    let energy = min_max_normalize(&energy);
    debug!(sites = sites.len(), "built ranking alternatives from sites");

    Ok(sites
        .iter()
        .zip(land.iter().zip(&energy))
        .map(|(site, (&l, &e))| {
            Alternative::new(site.name.clone())
                .with_value(RENEWABLE_PROXIMITY, site.renewable_proximity)
                .with_value(DEMAND_PROXIMITY, site.demand_proximity)
                .with_value(TRANSPORT_SCORE, site.transport_score)
                .with_value(SUBSIDY_SCORE, site.subsidy_score)
                .with_value(LAND_COST, 1.0 - l)
                .with_value(ENERGY_COST, 1.0 - e)
        })
        .collect())
}
