//! Optimizer configuration.
//!
//! [`OptimizerConfig`] holds every parameter that controls one run: sizes,
//! operator rates, the search space, the objectives, termination, and the
//! seed.

use super::objective::{infrastructure_objectives, FitnessModel, Objective};
use super::selection::DEFAULT_TOURNAMENT_SIZE;
use super::types::SearchSpace;
use crate::error::{EngineError, Result};

/// Configuration for the genetic optimizer.
///
/// # Defaults
///
/// ```
/// use u_siteopt::ga::OptimizerConfig;
///
/// let config = OptimizerConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.tournament_size, 3);
/// assert_eq!(config.convergence_window, 5);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_siteopt::ga::{Direction, Objective, OptimizerConfig};
///
/// let config = OptimizerConfig::default()
///     .with_population_size(60)
///     .with_constraint("capacity", 200.0, 800.0)
///     .with_objectives(vec![
///         Objective::field("capacity", Direction::Maximize, 0.7, 800.0),
///         Objective::field("budget", Direction::Minimize, 0.3, 1e8),
///     ])
///     .with_mutation_rate(0.2)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Number of individuals per generation. Constant across the run.
    pub population_size: usize,

    /// Maximum number of evolutionary steps after the initial population.
    pub max_generations: usize,

    /// Probability that an offspring has one field group resampled (0.0–1.0).
    pub mutation_rate: f64,

    /// Probability that a parent pair is recombined (0.0–1.0).
    pub crossover_rate: f64,

    /// Contestants per tournament.
    pub tournament_size: usize,

    /// Field groups and their bounds.
    pub space: SearchSpace,

    /// Weighted sub-fitness functions.
    pub objectives: Vec<Objective>,

    /// Number of trailing best-fitness values examined for convergence.
    pub convergence_window: usize,

    /// The run stops once the sample variance of the trailing window drops
    /// below this value. `0.0` disables convergence stopping.
    ///
    /// This is a heuristic plateau detector, not an optimality certificate.
    pub convergence_variance: f64,

    /// Whether to evaluate fitness in parallel with rayon.
    ///
    /// Has no effect unless the `parallel` feature is enabled. Evaluation
    /// draws no random numbers, so results are identical either way.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds.
    ///
    /// Checked at the start of each generation; the run returns the history
    /// recorded so far.
    pub time_limit_ms: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 200,
            mutation_rate: 0.1,
            crossover_rate: 0.9,
            tournament_size: DEFAULT_TOURNAMENT_SIZE,
            space: SearchSpace::infrastructure_default(),
            objectives: infrastructure_objectives(),
            convergence_window: 5,
            convergence_variance: 1e-3,
            parallel: true,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl OptimizerConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    /// Replaces the whole search space.
    pub fn with_space(mut self, space: SearchSpace) -> Self {
        self.space = space;
        self
    }

    /// Bounds a scalar field, adding it to the space if absent.
    pub fn with_constraint(mut self, field: impl Into<String>, min: f64, max: f64) -> Self {
        self.space = self.space.with_scalar(field, min, max);
        self
    }

    /// Bounds one component of a bundle field.
    pub fn with_bundle_constraint(
        mut self,
        field: impl Into<String>,
        component: impl Into<String>,
        min: f64,
        max: f64,
    ) -> Self {
        self.space = self.space.with_bundle_component(field, component, min, max);
        self
    }

    /// Replaces all objectives.
    pub fn with_objectives(mut self, objectives: Vec<Objective>) -> Self {
        self.objectives = objectives;
        self
    }

    /// Appends one objective to the current list.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_convergence_window(mut self, window: usize) -> Self {
        self.convergence_window = window;
        self
    }

    /// Sets the plateau variance threshold. `0.0` disables it.
    pub fn with_convergence_variance(mut self, variance: f64) -> Self {
        self.convergence_variance = variance.max(0.0);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Preset for quick feasibility checks.
    ///
    /// - Population: 40, Generations: 50, Time limit: 5s
    pub fn fast() -> Self {
        Self {
            population_size: 40,
            max_generations: 50,
            time_limit_ms: Some(5_000),
            ..Self::default()
        }
    }

    /// Preset balancing quality and run time.
    ///
    /// - Population: 100, Generations: 200, Time limit: 30s
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            max_generations: 200,
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Preset for thorough searches.
    ///
    /// - Population: 200, Generations: 500, Time limit: 120s
    /// - Convergence variance tightened to 1e-5
    pub fn quality() -> Self {
        Self {
            population_size: 200,
            max_generations: 500,
            convergence_variance: 1e-5,
            time_limit_ms: Some(120_000),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// [`EngineError::InvalidInput`] describing the first bad parameter.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(EngineError::invalid("population_size must be at least 2"));
        }
        if self.max_generations == 0 {
            return Err(EngineError::invalid("max_generations must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EngineError::invalid(format!(
                "mutation_rate must be in [0, 1], got {}",
                self.mutation_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(EngineError::invalid(format!(
                "crossover_rate must be in [0, 1], got {}",
                self.crossover_rate
            )));
        }
        if self.tournament_size == 0 {
            return Err(EngineError::invalid("tournament_size must be at least 1"));
        }
        if self.convergence_window < 2 {
            return Err(EngineError::invalid("convergence_window must be at least 2"));
        }
        if !self.convergence_variance.is_finite() || self.convergence_variance < 0.0 {
            return Err(EngineError::invalid(
                "convergence_variance must be finite and non-negative",
            ));
        }
        if self.time_limit_ms == Some(0) {
            return Err(EngineError::invalid("time_limit_ms must be positive or None"));
        }
        self.space.validate()?;
        FitnessModel::new(&self.objectives)?;
        Ok(())
    }
}
