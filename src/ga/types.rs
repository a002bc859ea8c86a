//! Search space and individual representation.
//!
//! An [`Individual`] maps named field groups to [`Gene`]s. A group is either
//! a single number (capacity, budget, timeline) or a bundle of named numbers
//! (the environmental factors). Groups are the unit of crossover and
//! mutation.
//!
//! All maps are `BTreeMap`: operators walk fields in key order, and that
//! order must not vary between runs or a fixed seed would not reproduce.

use crate::error::{EngineError, Result};
use rand::Rng;
use std::collections::BTreeMap;

/// Inclusive bounds for one numeric field.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Rejects inverted or non-finite bounds.
    pub fn validate(&self, field: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(EngineError::invalid(format!(
                "range for '{field}' must be finite"
            )));
        }
        if self.min > self.max {
            return Err(EngineError::invalid(format!(
                "range for '{field}' is inverted: min {} > max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Uniform sample in `[min, max]`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.min == self.max {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }

    /// Position of `value` within the range, in `[0, 1]` for in-range values.
    ///
    /// A degenerate range maps everything to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            (value - self.min) / span
        } else {
            0.0
        }
    }
}

/// Bounds for one field group.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    Scalar(FieldRange),
    Bundle(BTreeMap<String, FieldRange>),
}

/// Value of one field group.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Gene {
    Scalar(f64),
    Bundle(BTreeMap<String, f64>),
}

impl Gene {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Gene::Scalar(v) => Some(*v),
            Gene::Bundle(_) => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            Gene::Bundle(b) => Some(b),
            Gene::Scalar(_) => None,
        }
    }
}

/// The configuration space searched by the optimizer.
///
/// [`infrastructure_default`](Self::infrastructure_default) gives the
/// standard layout; caller constraints override or extend it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchSpace {
    fields: BTreeMap<String, FieldSpec>,
}

impl SearchSpace {
    /// An empty space. Must gain at least one field before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default ranges for an infrastructure layout:
    ///
    /// | field           | range          | unit            |
    /// |-----------------|----------------|-----------------|
    /// | `capacity`      | 10 – 1000      | MW              |
    /// | `budget`        | 1e6 – 1e8      | currency units  |
    /// | `timeline`      | 6 – 60         | months          |
    /// | `environmental` | each 0 – 1     | impact index    |
    ///
    /// The environmental bundle holds `emissions`, `land_use`, `water_use`.
    pub fn infrastructure_default() -> Self {
        Self::new()
            .with_scalar("capacity", 10.0, 1000.0)
            .with_scalar("budget", 1e6, 1e8)
            .with_scalar("timeline", 6.0, 60.0)
            .with_bundle_component("environmental", "emissions", 0.0, 1.0)
            .with_bundle_component("environmental", "land_use", 0.0, 1.0)
            .with_bundle_component("environmental", "water_use", 0.0, 1.0)
    }

    /// Sets a scalar field's range, replacing any previous spec for `field`.
    pub fn with_scalar(mut self, field: impl Into<String>, min: f64, max: f64) -> Self {
        self.fields
            .insert(field.into(), FieldSpec::Scalar(FieldRange::new(min, max)));
        self
    }

    /// Sets one component of a bundle field.
    ///
    /// A scalar previously registered under `field` is replaced by a bundle.
    pub fn with_bundle_component(
        mut self,
        field: impl Into<String>,
        component: impl Into<String>,
        min: f64,
        max: f64,
    ) -> Self {
        let entry = self
            .fields
            .entry(field.into())
            .or_insert_with(|| FieldSpec::Bundle(BTreeMap::new()));
        if let FieldSpec::Scalar(_) = entry {
            *entry = FieldSpec::Bundle(BTreeMap::new());
        }
        if let FieldSpec::Bundle(components) = entry {
            components.insert(component.into(), FieldRange::new(min, max));
        }
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rejects an empty space, empty bundles, and bad ranges.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(EngineError::invalid("search space has no fields"));
        }
        for (name, spec) in &self.fields {
            match spec {
                FieldSpec::Scalar(range) => range.validate(name)?,
                FieldSpec::Bundle(components) => {
                    if components.is_empty() {
                        return Err(EngineError::invalid(format!(
                            "bundle '{name}' has no components"
                        )));
                    }
                    for (component, range) in components {
                        range.validate(&format!("{name}.{component}"))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Samples one field group uniformly within its bounds.
    ///
    /// Returns `None` if `field` is not part of the space.
    pub fn sample_field<R: Rng>(&self, field: &str, rng: &mut R) -> Option<Gene> {
        self.fields.get(field).map(|spec| sample_spec(spec, rng))
    }

    /// Samples a complete, unevaluated individual.
    pub fn sample_individual<R: Rng>(&self, rng: &mut R) -> Individual {
        let genes = self
            .fields
            .iter()
            .map(|(name, spec)| (name.clone(), sample_spec(spec, rng)))
            .collect();
        Individual::new(genes)
    }

    /// Flattens an individual into range-normalized coordinates.
    ///
    /// Used for diversity. Missing or mistyped genes contribute 0.
    pub fn normalized_vector(&self, individual: &Individual) -> Vec<f64> {
        let mut out = Vec::new();
        for (name, spec) in &self.fields {
            match spec {
                FieldSpec::Scalar(range) => {
                    let v = individual.scalar(name).unwrap_or(range.min);
                    out.push(range.normalize(v));
                }
                FieldSpec::Bundle(components) => {
                    let bundle = individual.bundle(name);
                    for (component, range) in components {
                        let v = bundle
                            .and_then(|b| b.get(component).copied())
                            .unwrap_or(range.min);
                        out.push(range.normalize(v));
                    }
                }
            }
        }
        out
    }
}

fn sample_spec<R: Rng>(spec: &FieldSpec, rng: &mut R) -> Gene {
    match spec {
        FieldSpec::Scalar(range) => Gene::Scalar(range.sample(rng)),
        FieldSpec::Bundle(components) => Gene::Bundle(
            components
                .iter()
                .map(|(c, range)| (c.clone(), range.sample(rng)))
                .collect(),
        ),
    }
}

/// A candidate infrastructure configuration.
///
/// Never modified in place: operators build new individuals through the
/// consuming `with_*` methods.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    genes: BTreeMap<String, Gene>,
    fitness: f64,
}

impl Individual {
    /// Fitness value of an individual that has not been evaluated yet.
    pub const UNEVALUATED: f64 = f64::NEG_INFINITY;

    pub fn new(genes: BTreeMap<String, Gene>) -> Self {
        Self {
            genes,
            fitness: Self::UNEVALUATED,
        }
    }

    pub fn genes(&self) -> &BTreeMap<String, Gene> {
        &self.genes
    }

    pub fn gene(&self, field: &str) -> Option<&Gene> {
        self.genes.get(field)
    }

    /// Value of a scalar field; `None` if missing or a bundle.
    pub fn scalar(&self, field: &str) -> Option<f64> {
        self.genes.get(field).and_then(Gene::as_scalar)
    }

    /// Components of a bundle field; `None` if missing or a scalar.
    pub fn bundle(&self, field: &str) -> Option<&BTreeMap<String, f64>> {
        self.genes.get(field).and_then(Gene::as_bundle)
    }

    /// Fitness in `[0, 1]`, or [`UNEVALUATED`](Self::UNEVALUATED).
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_finite()
    }

    /// Returns this individual carrying `fitness`.
    pub fn with_fitness(mut self, fitness: f64) -> Self {
        self.fitness = fitness;
        self
    }

    /// Returns a copy with one gene replaced and the fitness reset.
    pub fn with_gene(mut self, field: impl Into<String>, gene: Gene) -> Self {
        self.genes.insert(field.into(), gene);
        self.fitness = Self::UNEVALUATED;
        self
    }
}
