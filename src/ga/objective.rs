//! Objectives and fitness composition.
//!
//! Each [`Objective`] turns an individual into a raw measurement, then into a
//! sub-fitness in `[0, 1]` where higher is always better:
//!
//! - maximize: `clamp(value / scale, 0, 1)`
//! - minimize: `clamp(1 - value / scale, 0, 1)`
//!
//! `scale` is the objective's fixed reference ceiling, in the same unit as
//! the measurement. Fitness is the weighted sum of sub-fitnesses over weights
//! renormalized to sum to 1, so fitness is also in `[0, 1]`.
//!
//! A measurement that is missing, non-finite, or panics scores 0 for that
//! individual. A malformed individual is unfit, never fatal.

use super::types::Individual;
use crate::error::{EngineError, Result};
use crate::numeric::normalize_weight_slice;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

/// Optimization direction of one objective.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// Raw measurement of an individual for one objective.
///
/// Returning `None` marks the individual as unmeasurable for this objective.
/// Implemented for any `Fn(&Individual) -> Option<f64>`.
pub trait Measure: Send + Sync {
    fn measure(&self, individual: &Individual) -> Option<f64>;
}

impl<F> Measure for F
where
    F: Fn(&Individual) -> Option<f64> + Send + Sync,
{
    fn measure(&self, individual: &Individual) -> Option<f64> {
        self(individual)
    }
}

/// A named, weighted, directed sub-fitness.
#[derive(Clone)]
pub struct Objective {
    pub name: String,
    pub direction: Direction,
    pub weight: f64,
    /// Reference ceiling that maps measurements onto `[0, 1]`.
    pub scale: f64,
    measure: Arc<dyn Measure>,
}

impl fmt::Debug for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Objective")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("weight", &self.weight)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl Objective {
    pub fn new<M: Measure + 'static>(
        name: impl Into<String>,
        direction: Direction,
        weight: f64,
        scale: f64,
        measure: M,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            weight,
            scale,
            measure: Arc::new(measure),
        }
    }

    /// Objective reading a scalar field directly.
    pub fn field(field: impl Into<String>, direction: Direction, weight: f64, scale: f64) -> Self {
        let field = field.into();
        let key = field.clone();
        Self::new(field, direction, weight, scale, move |ind: &Individual| {
            ind.scalar(&key)
        })
    }

    /// Objective reading the sum of a bundle field's components.
    pub fn bundle_total(
        field: impl Into<String>,
        direction: Direction,
        weight: f64,
        scale: f64,
    ) -> Self {
        let field = field.into();
        let key = field.clone();
        Self::new(field, direction, weight, scale, move |ind: &Individual| {
            ind.bundle(&key).map(|b| b.values().sum())
        })
    }

    /// Raw measurement with failures mapped to `None`.
    pub fn raw(&self, individual: &Individual) -> Option<f64> {
        let measured = catch_unwind(AssertUnwindSafe(|| self.measure.measure(individual)));
        match measured {
            Ok(Some(v)) if v.is_finite() => Some(v),
            Ok(_) => None,
            Err(_) => {
                warn!(objective = %self.name, "objective measurement panicked; scoring 0");
                None
            }
        }
    }

    /// Sub-fitness in `[0, 1]`, higher is better.
    pub fn sub_fitness(&self, individual: &Individual) -> f64 {
        let Some(value) = self.raw(individual) else {
            return 0.0;
        };
        let ratio = value / self.scale;
        let oriented = match self.direction {
            Direction::Maximize => ratio,
            Direction::Minimize => 1.0 - ratio,
        };
        if oriented.is_finite() {
            oriented.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(EngineError::invalid(format!(
                "objective '{}' needs a positive finite scale, got {}",
                self.name, self.scale
            )));
        }
        Ok(())
    }
}

/// Default objectives for [`SearchSpace::infrastructure_default`]:
///
/// | objective       | direction | weight | scale |
/// |-----------------|-----------|--------|-------|
/// | `capacity`      | maximize  | 0.35   | 1000  |
/// | `budget`        | minimize  | 0.25   | 1e8   |
/// | `timeline`      | minimize  | 0.20   | 60    |
/// | `environmental` | minimize  | 0.20   | 3     |
///
/// [`SearchSpace::infrastructure_default`]: super::SearchSpace::infrastructure_default
pub fn infrastructure_objectives() -> Vec<Objective> {
    vec![
        Objective::field("capacity", Direction::Maximize, 0.35, 1000.0),
        Objective::field("budget", Direction::Minimize, 0.25, 1e8),
        Objective::field("timeline", Direction::Minimize, 0.20, 60.0),
        Objective::bundle_total("environmental", Direction::Minimize, 0.20, 3.0),
    ]
}

/// Validated objectives with their normalized weights.
#[derive(Debug, Clone)]
pub struct FitnessModel {
    objectives: Vec<Objective>,
    weights: Vec<f64>,
}

impl FitnessModel {
    /// # Errors
    /// [`EngineError::InvalidInput`] if `objectives` is empty, a weight is
    /// negative or non-finite, the weights sum to zero, or a scale is not
    /// positive.
    pub fn new(objectives: &[Objective]) -> Result<Self> {
        if objectives.is_empty() {
            return Err(EngineError::invalid("objectives must not be empty"));
        }
        for o in objectives {
            o.validate()?;
        }
        let raw: Vec<f64> = objectives.iter().map(|o| o.weight).collect();
        let weights = normalize_weight_slice(&raw)?;
        Ok(Self {
            objectives: objectives.to_vec(),
            weights,
        })
    }

    /// Normalized weights, in objective order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weighted fitness in `[0, 1]`.
    pub fn evaluate(&self, individual: &Individual) -> f64 {
        self.objectives
            .iter()
            .zip(self.weights.iter())
            .map(|(o, w)| w * o.sub_fitness(individual))
            .sum()
    }
}
