//! Site and network optimization engine.
//!
//! Analytical core for planning infrastructure such as solar farms, substations
//! and transmission corridors:
//!
//! - **MCDA** ([`mcda`]): ranks candidate sites against weighted criteria
//!   with weighted sum or TOPSIS.
//! - **Genetic optimizer** ([`ga`]): searches project configurations
//!   (capacity, budget, timeline, environmental impact) for the best
//!   weighted multi-objective fitness.
//! - **Cost surfaces** ([`surface`]): inverse-distance-weighted lattices
//!   built from scattered cost samples, plus least-cost paths across them.
//! - **Forecasting** ([`forecast`]): linear demand trends with decaying
//!   confidence.
//! - **Site features** ([`site`]): composite suitability scores, zoning and
//!   conversion into ranking alternatives.
//!
//! # Architecture
//!
//! Every component is synchronous and free of shared mutable state.
//! Randomness is always injected (see [`random`]), so a fixed seed reproduces
//! a run exactly. Spatial lookups go through the [`geo::SpatialIndex`]
//! capability rather than a concrete index. Invalid parameters surface as
//! [`EngineError::InvalidInput`]; degraded-but-valid outcomes (a short
//! forecast history, an empty sample set) are ordinary return values.
//!
//! The crate emits [`tracing`] events and never installs a subscriber.
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` for inputs, configs and results.
//! - `parallel`: evaluates fitness and interpolates cells with rayon.

pub mod error;
pub mod forecast;
pub mod ga;
pub mod geo;
pub mod mcda;
pub mod numeric;
pub mod random;
pub mod site;
pub mod surface;

pub use error::{EngineError, Result};
pub use forecast::forecast;
pub use ga::optimize;
pub use mcda::rank;
pub use surface::{derive_paths, interpolate};
