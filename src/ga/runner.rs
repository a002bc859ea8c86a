//! Generation loop execution.
//!
//! [`GaRunner`] drives one optimization run:
//! initialize → evaluate → {select → crossover → mutate → replace →
//! evaluate} → converged | max generations | time limit | cancelled.

use super::config::OptimizerConfig;
use super::objective::FitnessModel;
use super::operators::{crossover_pool, mutate_offspring};
use super::selection::select_pool;
use super::types::{Individual, SearchSpace};
use crate::error::Result;
use crate::numeric::euclidean_distance;
use crate::random::rng_from_option;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use u_numflow::stats::{mean, variance};

/// Telemetry for one generation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRecord {
    /// 0 is the initial population.
    pub generation: usize,

    /// Best fitness seen so far in the run. Non-decreasing.
    pub best_fitness: f64,

    /// Best fitness within this generation alone. May fluctuate.
    pub generation_best: f64,

    /// Mean of this generation's finite fitness values; 0 when there are none.
    pub mean_fitness: f64,

    /// Mean pairwise Euclidean distance of range-normalized genes.
    pub diversity: f64,
}

/// Why a run stopped.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Trailing best-fitness variance fell below the threshold.
    Converged,
    /// `max_generations` evolutionary steps completed.
    MaxGenerations,
    /// The wall-clock limit elapsed.
    TimeLimit,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Outcome of an optimization run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// One record per generation, starting with the initial population.
    pub best_per_generation: Vec<GenerationRecord>,

    /// The last generation, evaluated.
    pub final_population: Vec<Individual>,

    /// The fittest individual seen during the run.
    pub best: Individual,

    pub termination: Termination,

    /// Evolutionary steps executed (not counting initialization).
    pub generations: usize,
}

impl OptimizationResult {
    pub fn best_fitness(&self) -> f64 {
        self.best.fitness()
    }

    /// Relative improvement from the first to the last record.
    ///
    /// See [`convergence_rate`].
    pub fn convergence_rate(&self) -> f64 {
        match (self.best_per_generation.first(), self.best_per_generation.last()) {
            (Some(first), Some(last)) => convergence_rate(first.best_fitness, last.best_fitness),
            _ => 0.0,
        }
    }
}

/// `(final - initial) / initial`.
///
/// When `initial` is 0 the ratio is undefined: the result is `+∞` if
/// `final > 0`, otherwise 0.
pub fn convergence_rate(initial: f64, final_fitness: f64) -> f64 {
    if initial == 0.0 {
        if final_fitness > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        (final_fitness - initial) / initial
    }
}

/// Executes optimization runs.
///
/// # Usage
///
/// ```
/// use u_siteopt::ga::{GaRunner, OptimizerConfig};
///
/// let config = OptimizerConfig::fast().with_seed(42).with_max_generations(10);
/// let result = GaRunner::run(&config).unwrap();
/// assert!(!result.best_per_generation.is_empty());
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs with a generator seeded from `config.seed`.
    ///
    /// # Errors
    /// [`EngineError::InvalidInput`](crate::EngineError::InvalidInput) if the
    /// configuration fails [`OptimizerConfig::validate`]; nothing runs.
    pub fn run(config: &OptimizerConfig) -> Result<OptimizationResult> {
        let mut rng = rng_from_option(config.seed);
        Self::run_with_observer(config, &mut rng, None, |_| {})
    }

    /// Runs with a caller-supplied random source. `config.seed` is ignored.
    pub fn run_with_rng<R: Rng>(config: &OptimizerConfig, rng: &mut R) -> Result<OptimizationResult> {
        Self::run_with_observer(config, rng, None, |_| {})
    }

    /// Runs with an optional cancellation token.
    ///
    /// If the flag becomes `true`, the run stops before the next generation
    /// and returns the history so far.
    pub fn run_with_cancel(
        config: &OptimizerConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<OptimizationResult> {
        let mut rng = rng_from_option(config.seed);
        Self::run_with_observer(config, &mut rng, cancel, |_| {})
    }

    /// Full-control entry point.
    ///
    /// `observer` receives every [`GenerationRecord`] as soon as it is
    /// appended, which lets a caller stream progress of a long run.
    pub fn run_with_observer<R, F>(
        config: &OptimizerConfig,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
        mut observer: F,
    ) -> Result<OptimizationResult>
    where
        R: Rng,
        F: FnMut(&GenerationRecord),
    {
        config.validate()?;
        let model = FitnessModel::new(&config.objectives)?;
        let started = Instant::now();
        let deadline = config.time_limit_ms.map(Duration::from_millis);

        // 1. Initialize and evaluate
        let initial: Vec<Individual> = (0..config.population_size)
            .map(|_| config.space.sample_individual(rng))
            .collect();
        let mut population = evaluate_population(&model, initial, config.parallel);

        let mut best = find_best(&population).clone();
        let mut history = Vec::with_capacity(config.max_generations + 1);
        let record = summarize(0, &population, &best, &config.space);
        observer(&record);
        history.push(record);

        let mut termination = Termination::MaxGenerations;
        let mut generations = 0;

        // 2. Evolutionary loop
        for gen in 1..=config.max_generations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    termination = Termination::Cancelled;
                    break;
                }
            }
            if let Some(limit) = deadline {
                if started.elapsed() >= limit {
                    termination = Termination::TimeLimit;
                    break;
                }
            }

            let pool = select_pool(&population, config.tournament_size, rng);
            let offspring = crossover_pool(&pool, config.crossover_rate, rng);
            let offspring = mutate_offspring(offspring, &config.space, config.mutation_rate, rng);
            population = evaluate_population(&model, offspring, config.parallel);
            generations = gen;

            let gen_best = find_best(&population);
            if gen_best.fitness() > best.fitness() {
                best = gen_best.clone();
            }

            let record = summarize(gen, &population, &best, &config.space);
            debug!(
                generation = gen,
                best = record.best_fitness,
                mean = record.mean_fitness,
                diversity = record.diversity,
                "generation complete"
            );
            observer(&record);
            history.push(record);

            if has_converged(&history, config.convergence_window, config.convergence_variance) {
                termination = Termination::Converged;
                break;
            }
        }

        info!(
            generations,
            best_fitness = best.fitness(),
            termination = ?termination,
            "optimization finished"
        );

        Ok(OptimizationResult {
            best_per_generation: history,
            final_population: population,
            best,
            termination,
            generations,
        })
    }
}

/// Runs the optimizer with a generator seeded from `config.seed`.
///
/// Free-function form of [`GaRunner::run`].
pub fn optimize(config: &OptimizerConfig) -> Result<OptimizationResult> {
    GaRunner::run(config)
}

/// Whether the trailing `window` best-fitness values have plateaued.
///
/// A threshold of 0 never triggers.
pub fn has_converged(history: &[GenerationRecord], window: usize, threshold: f64) -> bool {
    if threshold <= 0.0 || window < 2 || history.len() < window {
        return false;
    }
    let tail: Vec<f64> = history[history.len() - window..]
        .iter()
        .map(|r| r.best_fitness)
        .collect();
    variance(&tail).is_some_and(|v| v < threshold)
}

/// Mean pairwise Euclidean distance over range-normalized genes.
///
/// Returns 0 for fewer than two individuals.
pub fn diversity(population: &[Individual], space: &SearchSpace) -> f64 {
    let n = population.len();
    if n < 2 {
        return 0.0;
    }
    let vectors: Vec<Vec<f64>> = population
        .iter()
        .map(|ind| space.normalized_vector(ind))
        .collect();

    let mut total = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            total += euclidean_distance(&vectors[i], &vectors[j]);
        }
    }
    total / (n * (n - 1) / 2) as f64
}

fn summarize(
    generation: usize,
    population: &[Individual],
    best: &Individual,
    space: &SearchSpace,
) -> GenerationRecord {
    let fitnesses: Vec<f64> = population
        .iter()
        .map(Individual::fitness)
        .filter(|f| f.is_finite())
        .collect();
    GenerationRecord {
        generation,
        best_fitness: best.fitness(),
        generation_best: find_best(population).fitness(),
        mean_fitness: mean(&fitnesses).unwrap_or(0.0),
        diversity: diversity(population, space),
    }
}

/// Evaluate every individual, returning them with fitness attached.
fn evaluate_population(
    model: &FitnessModel,
    population: Vec<Individual>,
    parallel: bool,
) -> Vec<Individual> {
    #[cfg(feature = "parallel")]
    if parallel {
        use rayon::prelude::*;
        return population
            .into_par_iter()
            .map(|ind| {
                let f = model.evaluate(&ind);
                ind.with_fitness(f)
            })
            .collect();
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    population
        .into_iter()
        .map(|ind| {
            let f = model.evaluate(&ind);
            ind.with_fitness(f)
        })
        .collect()
}

/// The individual with the highest finite fitness; the first one on ties.
///
/// Falls back to the first individual when none is finite.
fn find_best(population: &[Individual]) -> &Individual {
    let mut best = &population[0];
    for ind in &population[1..] {
        let f = ind.fitness();
        if f.is_finite() && (!best.fitness().is_finite() || f > best.fitness()) {
            best = ind;
        }
    }
    best
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::{Direction, Objective};
    use crate::random::create_rng;

    fn small_config() -> OptimizerConfig {
        OptimizerConfig::default()
            .with_population_size(30)
            .with_max_generations(40)
            .with_mutation_rate(0.3)
            .with_convergence_variance(0.0)
            .with_parallel(false)
            .with_seed(42)
    }

    #[test]
    fn test_history_length_without_convergence() {
        let result = GaRunner::run(&small_config()).unwrap();
        // Initial record plus one per generation
        assert_eq!(result.best_per_generation.len(), 41);
        assert_eq!(result.generations, 40);
        assert_eq!(result.termination, Termination::MaxGenerations);
        for (i, r) in result.best_per_generation.iter().enumerate() {
            assert_eq!(r.generation, i);
        }
    }

    #[test]
    fn test_population_size_constant() {
        let config = small_config().with_population_size(31); // odd
        let result = GaRunner::run(&config).unwrap();
        assert_eq!(result.final_population.len(), 31);
        assert!(result.final_population.iter().all(Individual::is_evaluated));
    }

    #[test]
    fn test_same_seed_reproduces_history() {
        let a = GaRunner::run(&small_config()).unwrap();
        let b = GaRunner::run(&small_config()).unwrap();
        assert_eq!(a.best_per_generation, b.best_per_generation);
        assert_eq!(a.best, b.best);
    }

    #[test]
    fn test_injected_rng_reproduces_history() {
        let config = small_config();
        let a = GaRunner::run_with_rng(&config, &mut create_rng(9)).unwrap();
        let b = GaRunner::run_with_rng(&config, &mut create_rng(9)).unwrap();
        let c = GaRunner::run_with_rng(&config, &mut create_rng(10)).unwrap();
        assert_eq!(a.best_per_generation, b.best_per_generation);
        assert_ne!(a.best_per_generation, c.best_per_generation);
    }

    #[test]
    fn test_best_so_far_is_monotone() {
        let result = GaRunner::run(&small_config()).unwrap();
        for w in result.best_per_generation.windows(2) {
            assert!(
                w[1].best_fitness >= w[0].best_fitness,
                "best-so-far decreased: {} -> {}",
                w[0].best_fitness,
                w[1].best_fitness
            );
            assert!(w[1].best_fitness >= w[1].generation_best);
        }
        let last = result.best_per_generation.last().unwrap();
        assert_eq!(last.best_fitness, result.best_fitness());
    }

    #[test]
    fn test_search_improves_on_initial_population() {
        let config = small_config().with_max_generations(60);
        let result = GaRunner::run(&config).unwrap();
        let first = &result.best_per_generation[0];
        let last = result.best_per_generation.last().unwrap();
        assert!(last.mean_fitness > first.mean_fitness);
        assert!(result.best_fitness() <= 1.0);
    }

    #[test]
    fn test_converges_on_plateau() {
        // A single constant objective: every individual has fitness 1.0
        let config = small_config()
            .with_objectives(vec![Objective::new(
                "flat",
                Direction::Maximize,
                1.0,
                1.0,
                |_: &Individual| Some(1.0),
            )])
            .with_convergence_variance(1e-3);
        let result = GaRunner::run(&config).unwrap();
        assert_eq!(result.termination, Termination::Converged);
        // Needs a full window of 5 records: generations 0..=4
        assert_eq!(result.best_per_generation.len(), 5);
        assert_eq!(result.generations, 4);
    }

    #[test]
    fn test_inverted_constraint_rejected_before_running() {
        let config = small_config().with_constraint("budget", 10.0, 1.0);
        let mut calls = 0;
        let err = GaRunner::run_with_observer(&config, &mut create_rng(1), None, |_| calls += 1)
            .unwrap_err();
        assert!(matches!(err, crate::EngineError::InvalidInput(_)));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_panicking_objective_is_local() {
        let config = small_config().with_max_generations(5).with_objectives(vec![
            Objective::field("capacity", Direction::Maximize, 1.0, 1000.0),
            Objective::new(
                "flaky",
                Direction::Maximize,
                1.0,
                1.0,
                |ind: &Individual| -> Option<f64> {
                    let cap = ind.scalar("capacity")?;
                    if cap > 500.0 {
                        panic!("model blew up");
                    }
                    Some(0.5)
                },
            ),
        ]);
        let result = GaRunner::run(&config).unwrap();
        assert_eq!(result.final_population.len(), 30);
        assert!(result.final_population.iter().all(|i| i.fitness().is_finite()));
    }

    #[test]
    fn test_cancellation() {
        let config = small_config().with_max_generations(10_000);
        let cancel = Arc::new(AtomicBool::new(true));
        let result = GaRunner::run_with_cancel(&config, Some(cancel)).unwrap();
        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.generations, 0);
        assert_eq!(result.best_per_generation.len(), 1);
    }

    #[test]
    fn test_cancellation_mid_run() {
        let config = small_config().with_max_generations(10_000);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let mut rng = create_rng(3);
        let result = GaRunner::run_with_observer(&config, &mut rng, Some(cancel), |record| {
            if record.generation == 7 {
                flag.store(true, Ordering::Relaxed);
            }
        })
        .unwrap();
        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.generations, 7);
    }

    #[test]
    fn test_observer_sees_every_record() {
        let config = small_config().with_max_generations(12);
        let mut seen = Vec::new();
        let result =
            GaRunner::run_with_observer(&config, &mut create_rng(42), None, |r| seen.push(r.clone()))
                .unwrap();
        assert_eq!(seen, result.best_per_generation);
    }

    #[test]
    fn test_time_limit() {
        let config = small_config()
            .with_max_generations(1_000_000)
            .with_time_limit_ms(50);
        let result = GaRunner::run(&config).unwrap();
        assert_eq!(result.termination, Termination::TimeLimit);
        assert!(result.generations < 1_000_000);
    }

    #[test]
    fn test_diversity_collapses_for_clones() {
        let space = SearchSpace::infrastructure_default();
        let mut rng = create_rng(1);
        let ind = space.sample_individual(&mut rng);
        let clones = vec![ind.clone(), ind.clone(), ind];
        assert_eq!(diversity(&clones, &space), 0.0);

        let varied: Vec<Individual> = (0..10).map(|_| space.sample_individual(&mut rng)).collect();
        assert!(diversity(&varied, &space) > 0.0);
        assert_eq!(diversity(&varied[..1], &space), 0.0);
    }

    #[test]
    fn test_has_converged_window() {
        let rec = |g: usize, f: f64| GenerationRecord {
            generation: g,
            best_fitness: f,
            generation_best: f,
            mean_fitness: f,
            diversity: 0.0,
        };
        let flat: Vec<_> = (0..5).map(|g| rec(g, 0.5)).collect();
        assert!(has_converged(&flat, 5, 1e-3));
        assert!(!has_converged(&flat[..4], 5, 1e-3));
        assert!(!has_converged(&flat, 5, 0.0));

        let rising: Vec<_> = (0..5).map(|g| rec(g, g as f64 * 0.1)).collect();
        // variance of 0, .1, .2, .3, .4 is 0.025
        assert!(!has_converged(&rising, 5, 1e-3));
    }

    #[test]
    fn test_summary_mean_skips_non_finite_fitness() {
        let space = SearchSpace::new().with_scalar("capacity", 0.0, 1.0);
        let ind = |f: f64| Individual::new(std::collections::BTreeMap::new()).with_fitness(f);
        let population = vec![ind(0.2), ind(f64::NAN), ind(0.4)];

        let record = summarize(3, &population, &population[2], &space);
        assert!((record.mean_fitness - 0.3).abs() < 1e-12);

        let unevaluated = vec![ind(f64::NAN), ind(f64::NAN)];
        let record = summarize(0, &unevaluated, &unevaluated[0], &space);
        assert_eq!(record.mean_fitness, 0.0);
    }

    #[test]
    fn test_convergence_rate_edge_cases() {
        assert!((convergence_rate(0.5, 0.75) - 0.5).abs() < 1e-12);
        assert_eq!(convergence_rate(0.0, 0.3), f64::INFINITY);
        assert_eq!(convergence_rate(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_optimize_free_function() {
        let result = optimize(&small_config().with_max_generations(3)).unwrap();
        assert_eq!(result.best_per_generation.len(), 4);
        assert!(result.convergence_rate() >= 0.0);
    }
}
