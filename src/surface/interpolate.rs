//! Inverse-distance-weighted interpolation onto a lat/lng lattice.
//!
//! # Algorithm
//!
//! For a lattice point `p` and samples `s_i` at haversine distance `d_i`:
//!
//! ```text
//! cost(p) = Σ w_i · cost_i / Σ w_i,   w_i = 1 / d_i^power
//! ```
//!
//! A sample with `d_i == 0` short-circuits to its own cost. Weights are
//! computed relative to the nearest sample, `(d_min / d_i)^power`, which
//! leaves the ratio unchanged and keeps the nearest weight at 1.
//!
//! # References
//!
//! - Shepard (1968), "A two-dimensional interpolation function for
//!   irregularly-spaced data"

use super::types::{Bounds, CostSample, CostSurface, GridCell, GridCoord, InterpolationConfig, LatticeSpec};
use crate::error::{EngineError, Result};
use crate::geo::{haversine_m, LatLng, SpatialIndex};
use tracing::debug;

/// Interpolates cost samples over lattices with a fixed configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpolator {
    config: InterpolationConfig,
}

impl Interpolator {
    pub fn new(config: InterpolationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Builds the full surface from every sample.
    ///
    /// With no samples, every cell costs 0.
    ///
    /// # Errors
    /// [`EngineError::InvalidInput`] for invalid bounds, resolution, config,
    /// or a sample with a bad location or non-finite cost.
    ///
    /// # Complexity
    /// O(cells × samples)
    pub fn interpolate(
        &self,
        samples: &[CostSample],
        bounds: &Bounds,
        resolution_m: f64,
    ) -> Result<CostSurface> {
        self.config.validate()?;
        validate_samples(samples.iter())?;
        let lattice = LatticeSpec::new(bounds, resolution_m, self.config.max_cells)?;
        debug!(
            samples = samples.len(),
            rows = lattice.rows,
            cols = lattice.cols,
            "interpolating cost surface"
        );

        let power = self.config.power;
        Ok(build_surface(bounds, lattice, |point| {
            idw(point, samples.iter(), power)
        }))
    }

    /// Builds the surface using only samples within `radius_m` of each cell.
    ///
    /// Cells with no sample in range cost 0.
    ///
    /// # Errors
    /// As [`Interpolator::interpolate`], plus a non-positive radius.
    /// Samples are validated lazily: a bad sample is reported the first
    /// time a cell query returns it.
    ///
    /// # Complexity
    /// O(cells × lookup), where lookup is the index's query cost
    pub fn interpolate_indexed<I>(
        &self,
        index: &I,
        bounds: &Bounds,
        resolution_m: f64,
        radius_m: f64,
    ) -> Result<CostSurface>
    where
        I: SpatialIndex<CostSample> + ?Sized,
    {
        self.config.validate()?;
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(EngineError::invalid(format!(
                "search radius must be positive, got {radius_m}"
            )));
        }
        let lattice = LatticeSpec::new(bounds, resolution_m, self.config.max_cells)?;
        debug!(
            radius_m,
            rows = lattice.rows,
            cols = lattice.cols,
            "interpolating cost surface from spatial index"
        );

        let power = self.config.power;
        let mut cells = Vec::with_capacity(lattice.len());
        for coord in coords(&lattice) {
            let location = cell_location(bounds, &lattice, coord);
            let nearby = index.find_near(&location, radius_m);
            validate_samples(nearby.iter().copied())?;
            let cost = idw(&location, nearby, power);
            cells.push(GridCell {
                coord,
                location,
                cost,
            });
        }

        Ok(CostSurface {
            bounds: *bounds,
            lattice,
            cells,
        })
    }
}

/// [`Interpolator::interpolate`] with the default configuration.
pub fn interpolate(
    samples: &[CostSample],
    bounds: &Bounds,
    resolution_m: f64,
) -> Result<CostSurface> {
    Interpolator::default().interpolate(samples, bounds, resolution_m)
}

/// [`Interpolator::interpolate_indexed`] with the default configuration.
pub fn interpolate_indexed<I>(
    index: &I,
    bounds: &Bounds,
    resolution_m: f64,
    radius_m: f64,
) -> Result<CostSurface>
where
    I: SpatialIndex<CostSample> + ?Sized,
{
    Interpolator::default().interpolate_indexed(index, bounds, resolution_m, radius_m)
}

/// Inverse-distance-weighted estimate at `point`. 0 when no samples.
pub fn idw<'a, S>(point: &LatLng, samples: S, power: f64) -> f64
where
    S: IntoIterator<Item = &'a CostSample>,
{
    let mut located: Vec<(f64, f64)> = Vec::new();
    for sample in samples {
        let d = haversine_m(point, &sample.location);
        if d == 0.0 {
            return sample.cost;
        }
        located.push((d, sample.cost));
    }
    let nearest = located.iter().map(|&(d, _)| d).fold(f64::INFINITY, f64::min);
    if !nearest.is_finite() {
        return 0.0;
    }

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for (d, cost) in located {
        let w = (nearest / d).powf(power);
        weighted += w * cost;
        total_weight += w;
    }
    weighted / total_weight
}

fn validate_samples<'a>(samples: impl Iterator<Item = &'a CostSample>) -> Result<()> {
    for sample in samples {
        if !sample.location.is_valid() {
            return Err(EngineError::invalid(format!(
                "sample location out of range: {:?}",
                sample.location
            )));
        }
        if !sample.cost.is_finite() {
            return Err(EngineError::invalid(format!(
                "sample cost must be finite, got {}",
                sample.cost
            )));
        }
    }
    Ok(())
}

fn coords(lattice: &LatticeSpec) -> impl Iterator<Item = GridCoord> + '_ {
    (0..lattice.rows).flat_map(move |row| (0..lattice.cols).map(move |col| GridCoord { row, col }))
}

fn cell_location(bounds: &Bounds, lattice: &LatticeSpec, coord: GridCoord) -> LatLng {
    LatLng::new(
        bounds.south + coord.row as f64 * lattice.lat_step,
        bounds.west + coord.col as f64 * lattice.lng_step,
    )
}

#[cfg(feature = "parallel")]
fn build_surface<F>(bounds: &Bounds, lattice: LatticeSpec, cost_at: F) -> CostSurface
where
    F: Fn(&LatLng) -> f64 + Sync,
{
    use rayon::prelude::*;

    let cells = (0..lattice.len())
        .into_par_iter()
        .map(|i| {
            let coord = GridCoord {
                row: i / lattice.cols,
                col: i % lattice.cols,
            };
            let location = cell_location(bounds, &lattice, coord);
            GridCell {
                coord,
                location,
                cost: cost_at(&location),
            }
        })
        .collect();
    CostSurface {
        bounds: *bounds,
        lattice,
        cells,
    }
}

#[cfg(not(feature = "parallel"))]
fn build_surface<F>(bounds: &Bounds, lattice: LatticeSpec, cost_at: F) -> CostSurface
where
    F: Fn(&LatLng) -> f64,
{
    let cells = coords(&lattice)
        .map(|coord| {
            let location = cell_location(bounds, &lattice, coord);
            GridCell {
                coord,
                location,
                cost: cost_at(&location),
            }
        })
        .collect();
    CostSurface {
        bounds: *bounds,
        lattice,
        cells,
    }
}
