//! Cost-surface value types and configuration.

use crate::error::{EngineError, Result};
use crate::geo::{meters_per_degree_lng, LatLng, Located, METERS_PER_DEGREE_LAT};

/// A located cost observation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSample {
    pub location: LatLng,
    pub cost: f64,
}

impl CostSample {
    pub fn new(lat: f64, lng: f64, cost: f64) -> Self {
        Self {
            location: LatLng::new(lat, lng),
            cost,
        }
    }
}

impl Located for CostSample {
    fn location(&self) -> LatLng {
        self.location
    }
}

/// Axis-aligned lat/lng box in degrees.
///
/// Boxes crossing the antimeridian are not supported: `west <= east`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let all_finite = [self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(EngineError::invalid("bounds must be finite"));
        }
        if self.south < -90.0 || self.north > 90.0 {
            return Err(EngineError::invalid("bounds latitude outside [-90, 90]"));
        }
        if self.south > self.north || self.west > self.east {
            return Err(EngineError::invalid(format!(
                "bounds are inverted: {self:?}"
            )));
        }
        Ok(())
    }

    pub fn contains(&self, point: &LatLng) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lng)
    }

    /// Latitude used for the meters-to-degrees conversion.
    pub fn mid_lat(&self) -> f64 {
        (self.south + self.north) / 2.0
    }
}

/// Lattice spacing derived from a resolution in meters.
///
/// Longitude spacing uses the meters-per-degree at the box's middle latitude.
/// The approximation is good near the equator and degrades toward the
/// poles, and across tall boxes, where real spacing shrinks with `cos(lat)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeSpec {
    pub rows: usize,
    pub cols: usize,
    pub lat_step: f64,
    pub lng_step: f64,
}

impl LatticeSpec {
    /// # Errors
    /// [`EngineError::InvalidInput`] for bad bounds, a non-positive
    /// resolution, or a lattice over `max_cells`.
    pub fn new(bounds: &Bounds, resolution_m: f64, max_cells: usize) -> Result<Self> {
        bounds.validate()?;
        if !resolution_m.is_finite() || resolution_m <= 0.0 {
            return Err(EngineError::invalid(format!(
                "resolution must be positive, got {resolution_m}"
            )));
        }
        let lat_step = resolution_m / METERS_PER_DEGREE_LAT;
        let lng_step = resolution_m / meters_per_degree_lng(bounds.mid_lat());

        // Tolerance keeps an exact multiple of the step from losing its last row.
        let rows_f = ((bounds.north - bounds.south) / lat_step + 1e-9).floor() + 1.0;
        let cols_f = ((bounds.east - bounds.west) / lng_step + 1e-9).floor() + 1.0;
        if rows_f * cols_f > max_cells as f64 {
            return Err(EngineError::invalid(format!(
                "lattice of {rows_f} x {cols_f} cells exceeds the limit of {max_cells}"
            )));
        }

        Ok(Self {
            rows: rows_f as usize,
            cols: cols_f as usize,
            lat_step,
            lng_step,
        })
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row/column position on the lattice. Row 0 is the southern edge.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    pub row: usize,
    pub col: usize,
}

/// One lattice point with its interpolated cost.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub coord: GridCoord,
    pub location: LatLng,
    pub cost: f64,
}

/// A full lattice of interpolated costs, stored row-major.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CostSurface {
    pub bounds: Bounds,
    pub lattice: LatticeSpec,
    pub cells: Vec<GridCell>,
}

impl CostSurface {
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<GridCell> {
        self.cells
    }

    pub fn rows(&self) -> usize {
        self.lattice.rows
    }

    pub fn cols(&self) -> usize {
        self.lattice.cols
    }

    pub fn index_of(&self, coord: GridCoord) -> usize {
        coord.row * self.lattice.cols + coord.col
    }

    pub fn cell(&self, coord: GridCoord) -> Option<&GridCell> {
        if coord.row >= self.lattice.rows || coord.col >= self.lattice.cols {
            return None;
        }
        self.cells.get(self.index_of(coord))
    }

    /// Lattice point nearest to `point`, or `None` outside the bounds.
    pub fn nearest_coord(&self, point: &LatLng) -> Option<GridCoord> {
        if !self.bounds.contains(point) {
            return None;
        }
        let row = ((point.lat - self.bounds.south) / self.lattice.lat_step).round() as usize;
        let col = ((point.lng - self.bounds.west) / self.lattice.lng_step).round() as usize;
        Some(GridCoord {
            row: row.min(self.lattice.rows - 1),
            col: col.min(self.lattice.cols - 1),
        })
    }

    /// Lowest and highest cell cost. `None` for an empty surface.
    pub fn cost_range(&self) -> Option<(f64, f64)> {
        if self.cells.is_empty() {
            return None;
        }
        let min = self.cells.iter().map(|c| c.cost).fold(f64::INFINITY, f64::min);
        let max = self.cells.iter().map(|c| c.cost).fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }
}

/// Largest accepted IDW power.
pub const MAX_IDW_POWER: f64 = 10.0;

/// Parameters for inverse-distance weighting.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationConfig {
    /// Distance exponent in `(0, MAX_IDW_POWER]`; 2.0 is
    /// inverse-distance-squared.
    pub power: f64,

    /// Largest lattice accepted, in cells.
    pub max_cells: usize,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            power: 2.0,
            max_cells: 1_000_000,
        }
    }
}

impl InterpolationConfig {
    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.power > 0.0 && self.power <= MAX_IDW_POWER) {
            return Err(EngineError::invalid(format!(
                "power must be in (0, {MAX_IDW_POWER}], got {}",
                self.power
            )));
        }
        if self.max_cells == 0 {
            return Err(EngineError::invalid("max_cells must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_validation() {
        assert!(Bounds::new(0.0, 0.0, 1.0, 1.0).validate().is_ok());
        assert!(Bounds::new(1.0, 0.0, 0.0, 1.0).validate().is_err());
        assert!(Bounds::new(0.0, 1.0, 1.0, 0.0).validate().is_err());
        assert!(Bounds::new(-91.0, 0.0, 0.0, 1.0).validate().is_err());
        assert!(Bounds::new(0.0, f64::NAN, 1.0, 1.0).validate().is_err());
    }

    #[test]
    fn test_lattice_at_equator() {
        // 0.01 degrees is 1113.2 m in both axes when the box is centered on
        // the equator, so 1113.2 m spacing gives 2 rows and 2 columns
        let bounds = Bounds::new(-0.005, 0.0, 0.005, 0.01);
        let lattice = LatticeSpec::new(&bounds, 1113.2, 1000).unwrap();
        assert_eq!(lattice.rows, 2);
        assert_eq!(lattice.cols, 2);
    }

    #[test]
    fn test_lattice_degenerate_box_is_one_cell() {
        let bounds = Bounds::new(10.0, 10.0, 10.0, 10.0);
        let lattice = LatticeSpec::new(&bounds, 100.0, 10).unwrap();
        assert_eq!(lattice.len(), 1);
    }

    #[test]
    fn test_lattice_rejects_bad_resolution_and_size() {
        let bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);
        assert!(LatticeSpec::new(&bounds, 0.0, 100).is_err());
        assert!(LatticeSpec::new(&bounds, -5.0, 100).is_err());
        assert!(LatticeSpec::new(&bounds, 10.0, 100).is_err());
    }

    #[test]
    fn test_lng_step_widens_with_latitude() {
        let equator = LatticeSpec::new(&Bounds::new(-0.1, 0.0, 0.1, 1.0), 1000.0, 1_000_000).unwrap();
        let north = LatticeSpec::new(&Bounds::new(59.9, 0.0, 60.1, 1.0), 1000.0, 1_000_000).unwrap();
        assert!(north.lng_step > equator.lng_step * 1.9);
        assert!((north.lat_step - equator.lat_step).abs() < 1e-15);
    }

    #[test]
    fn test_interpolation_config_validate() {
        assert!(InterpolationConfig::default().validate().is_ok());
        assert!(InterpolationConfig::default().with_power(0.0).validate().is_err());
        assert!(InterpolationConfig::default().with_power(MAX_IDW_POWER).validate().is_ok());
        assert!(InterpolationConfig::default().with_power(50.0).validate().is_err());
        assert!(InterpolationConfig::default().with_power(f64::NAN).validate().is_err());
        assert!(InterpolationConfig::default().with_max_cells(0).validate().is_err());
    }
}
