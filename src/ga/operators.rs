//! Field-group crossover and mutation.
//!
//! Both operators treat a top-level field (capacity, budget, timeline, the
//! environmental bundle) as an indivisible unit. Neither touches its inputs:
//! every call returns fresh, unevaluated individuals.
//!
//! # Crossover
//!
//! - [`uniform_field_crossover`]: each field group shared by both parents is
//!   swapped with probability 0.5 (uniform crossover over groups).
//! - [`crossover_pool`]: pairs consecutive parents and applies the above with
//!   probability `crossover_rate`. An odd trailing parent passes through.
//!
//! # Mutation
//!
//! - [`resample_one_field`]: picks exactly one field group uniformly and
//!   resamples it from the search space.
//! - [`mutate_offspring`]: applies it to each offspring with probability
//!   `mutation_rate`.
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"

use super::types::{Individual, SearchSpace};
use rand::Rng;

/// Probability that a shared field group is exchanged during crossover.
pub const FIELD_SWAP_PROBABILITY: f64 = 0.5;

/// Uniform crossover over field groups.
///
/// Fields present in only one parent stay with that parent's child.
///
/// # Complexity
/// O(f) for f field groups
pub fn uniform_field_crossover<R: Rng>(
    parent1: &Individual,
    parent2: &Individual,
    rng: &mut R,
) -> (Individual, Individual) {
    let mut child1 = parent1.genes().clone();
    let mut child2 = parent2.genes().clone();

    for (field, gene1) in parent1.genes() {
        let Some(gene2) = parent2.gene(field) else {
            continue;
        };
        if rng.random_range(0.0..1.0) < FIELD_SWAP_PROBABILITY {
            child1.insert(field.clone(), gene2.clone());
            child2.insert(field.clone(), gene1.clone());
        }
    }

    (Individual::new(child1), Individual::new(child2))
}

/// Recombines a breeding pool pairwise.
///
/// Output has the same length and order as `pool`. Pairs that skip
/// crossover, and a leftover odd parent, are passed through unevaluated.
pub fn crossover_pool<R: Rng>(
    pool: &[Individual],
    crossover_rate: f64,
    rng: &mut R,
) -> Vec<Individual> {
    let mut offspring = Vec::with_capacity(pool.len());

    for pair in pool.chunks(2) {
        match pair {
            [a, b] => {
                if rng.random_range(0.0..1.0) < crossover_rate {
                    let (c1, c2) = uniform_field_crossover(a, b, rng);
                    offspring.push(c1);
                    offspring.push(c2);
                } else {
                    offspring.push(Individual::new(a.genes().clone()));
                    offspring.push(Individual::new(b.genes().clone()));
                }
            }
            [single] => offspring.push(Individual::new(single.genes().clone())),
            _ => unreachable!("chunks(2) yields one or two elements"),
        }
    }

    offspring
}

/// Resamples exactly one field group, chosen uniformly from `space`.
pub fn resample_one_field<R: Rng>(
    individual: &Individual,
    space: &SearchSpace,
    rng: &mut R,
) -> Individual {
    let fields = space.field_names();
    if fields.is_empty() {
        return Individual::new(individual.genes().clone());
    }
    let field = fields[rng.random_range(0..fields.len())];
    match space.sample_field(field, rng) {
        Some(gene) => individual.clone().with_gene(field, gene),
        None => Individual::new(individual.genes().clone()),
    }
}

/// Mutates each offspring with probability `mutation_rate`.
pub fn mutate_offspring<R: Rng>(
    offspring: Vec<Individual>,
    space: &SearchSpace,
    mutation_rate: f64,
    rng: &mut R,
) -> Vec<Individual> {
    offspring
        .into_iter()
        .map(|child| {
            if rng.random_range(0.0..1.0) < mutation_rate {
                resample_one_field(&child, space, rng)
            } else {
                child
            }
        })
        .collect()
}
