//! Genetic search over infrastructure configurations.
//!
//! Searches a mixed configuration space (scalar fields and bundles of
//! scalars) for a high-fitness layout. Fitness is a weighted sum of
//! caller-supplied objectives, each normalized to `[0, 1]`.
//!
//! # Core Types
//!
//! - [`SearchSpace`]: field groups and their bounds
//! - [`Individual`]: one candidate configuration
//! - [`Objective`]: a weighted, directed sub-fitness
//! - [`OptimizerConfig`]: run parameters, presets, validation
//! - [`GaRunner`]: executes the generation loop
//! - [`OptimizationResult`]: per-generation history and final population
//!
//! # Determinism
//!
//! Every random draw goes through the generator handed to the runner. The
//! same configuration and seed reproduce the same history bit for bit.
//!
//! # Submodules
//!
//! - [`operators`]: field-group crossover and mutation
//! - [`selection`]: tournament selection with a NaN-safe fallback
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - De Jong (2006), *Evolutionary Computation: A Unified Approach*

mod config;
mod objective;
pub mod operators;
mod runner;
pub mod selection;
mod types;

pub use config::OptimizerConfig;
pub use objective::{infrastructure_objectives, Direction, FitnessModel, Measure, Objective};
pub use runner::{
    convergence_rate, diversity, has_converged, optimize, GaRunner, GenerationRecord,
    OptimizationResult, Termination,
};
pub use types::{FieldRange, FieldSpec, Gene, Individual, SearchSpace};
