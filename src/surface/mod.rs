//! Cost-surface interpolation and least-cost paths.
//!
//! Scattered cost observations (land price, grading effort, permitting
//! difficulty) become a regular lat/lng lattice via inverse-distance
//! weighting. The lattice then serves as a grid graph for routing
//! transmission lines, pipelines or access roads between sites.
//!
//! # Example
//!
//! ```
//! use u_siteopt::geo::LatLng;
//! use u_siteopt::surface::{derive_paths, interpolate, Bounds, CostSample};
//!
//! let samples = vec![
//!     CostSample::new(0.0, 0.0, 1.0),
//!     CostSample::new(0.01, 0.01, 5.0),
//! ];
//! let bounds = Bounds::new(0.0, 0.0, 0.01, 0.01);
//! let surface = interpolate(&samples, &bounds, 250.0).unwrap();
//!
//! let paths = derive_paths(
//!     &surface,
//!     &[(LatLng::new(0.0, 0.0), LatLng::new(0.01, 0.01))],
//! )
//! .unwrap();
//! assert!(paths[0].total_cost > 0.0);
//! ```

mod interpolate;
mod paths;
mod types;

pub use interpolate::{idw, interpolate, interpolate_indexed, Interpolator};
pub use paths::{derive_paths, CostPath};
pub use types::{
    Bounds, CostSample, CostSurface, GridCell, GridCoord, InterpolationConfig, LatticeSpec,
    MAX_IDW_POWER,
};
