//! Tournament selection.
//!
//! Fitness here is maximized: higher wins.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Miller & Goldberg (1995), "Genetic Algorithms, Tournament Selection,
//!   and the Effects of Noise"

use super::types::Individual;
use rand::Rng;

/// Default tournament size.
pub const DEFAULT_TOURNAMENT_SIZE: usize = 3;

/// Picks `k` contestants uniformly with replacement and returns the index of
/// the fittest.
///
/// Contestants with non-finite fitness (NaN, unevaluated) cannot win. If no
/// contestant has a finite fitness, a uniformly random index is returned
/// instead.
///
/// # Complexity
/// O(k) per selection
///
/// # Panics
/// Panics if `population` is empty.
pub fn tournament<R: Rng>(population: &[Individual], k: usize, rng: &mut R) -> usize {
    assert!(
        !population.is_empty(),
        "cannot select from empty population"
    );
    let n = population.len();

    let mut winner: Option<usize> = None;
    for _ in 0..k.max(1) {
        let idx = rng.random_range(0..n);
        let fitness = population[idx].fitness();
        if !fitness.is_finite() {
            continue;
        }
        match winner {
            Some(best) if population[best].fitness() >= fitness => {}
            _ => winner = Some(idx),
        }
    }

    match winner {
        Some(idx) => idx,
        None => rng.random_range(0..n),
    }
}

/// Fills a breeding pool of `population.len()` parents by repeated
/// tournaments.
pub fn select_pool<R: Rng>(population: &[Individual], k: usize, rng: &mut R) -> Vec<Individual> {
    (0..population.len())
        .map(|_| population[tournament(population, k, rng)].clone())
        .collect()
}
