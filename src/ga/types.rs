//! Core type definitions for the evolutionary engine.
//!
//! The engine never looks inside a genome's meaning. It only needs:
//!
//! - a [`GenomeFactory`] to create random genomes,
//! - a [`FitnessEvaluator`] to score them,
//! - a [`FitnessValue`] that knows how to compare two scores under the
//!   declared optimization senses.

use super::genome::Genome;
use crate::error::{BoxError, ConfigError};
use rand::Rng;
use std::cmp::Ordering;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Optimization sense of one fitness component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Objective {
    /// Larger values are better.
    Maximize,
    /// Smaller values are better.
    Minimize,
}

impl Objective {
    /// Sign applied to raw values so that larger weighted values are better.
    pub fn weight(self) -> f64 {
        match self {
            Objective::Maximize => 1.0,
            Objective::Minimize => -1.0,
        }
    }
}

/// Fitness of an individual: a tuple of scalars plus a validity flag.
///
/// Comparison is lexicographic over the weighted values
/// (`value * objective.weight()`), so the first objective dominates and later
/// ones only break ties. An invalid fitness is worse than any valid one.
///
/// Any operator that changes a genome's alleles must call
/// [`invalidate`](FitnessValue::invalidate); the engine re-evaluates exactly
/// the individuals whose fitness is invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessValue {
    values: Vec<f64>,
    objectives: Arc<[Objective]>,
    valid: bool,
}

impl FitnessValue {
    /// Creates an unevaluated fitness for the given objectives.
    pub fn invalid(objectives: Arc<[Objective]>) -> Self {
        Self {
            values: Vec::new(),
            objectives,
            valid: false,
        }
    }

    /// Creates a valid fitness from already-computed values.
    ///
    /// Returns `None` if the number of values differs from the number of
    /// objectives.
    pub fn new(values: Vec<f64>, objectives: Arc<[Objective]>) -> Option<Self> {
        (values.len() == objectives.len()).then_some(Self {
            values,
            objectives,
            valid: true,
        })
    }

    /// Whether the values reflect the current genome.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Marks the fitness stale. Values are discarded.
    pub fn invalidate(&mut self) {
        self.values.clear();
        self.valid = false;
    }

    /// Stores freshly evaluated values.
    ///
    /// Returns `false` (and leaves the fitness invalid) on an arity mismatch.
    pub fn assign(&mut self, values: Vec<f64>) -> bool {
        if values.len() != self.objectives.len() {
            return false;
        }
        self.values = values;
        self.valid = true;
        true
    }

    /// Raw (unweighted) values. Empty while invalid.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The first fitness component, if evaluated.
    pub fn primary(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Declared optimization senses.
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Values multiplied by their objective weights; larger is better.
    pub fn weighted(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .zip(self.objectives.iter())
            .map(|(v, o)| v * o.weight())
    }

    /// Compares two fitness values by quality.
    ///
    /// `Ordering::Greater` means `self` is better than `other`.
    /// Incomparable components (NaN) are treated as equal.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.valid, other.valid) {
            (false, false) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (true, true) => {}
        }
        for (a, b) in self.weighted().zip(other.weighted()) {
            match a.partial_cmp(&b).unwrap_or(Ordering::Equal) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// Strictly better than `other`.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// Whether the primary component reaches `target` under its sense.
    pub fn meets(&self, target: f64) -> bool {
        match (self.primary(), self.objectives.first()) {
            (Some(v), Some(Objective::Maximize)) => v >= target,
            (Some(v), Some(Objective::Minimize)) => v <= target,
            _ => false,
        }
    }
}

/// A genome paired with its fitness.
///
/// Cloning deep-copies the genome, so offspring never alias their parents'
/// allele storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub genome: Genome,
    pub fitness: FitnessValue,
}

impl Individual {
    /// Wraps a genome with an unevaluated fitness.
    pub fn new(genome: Genome, objectives: Arc<[Objective]>) -> Self {
        Self {
            genome,
            fitness: FitnessValue::invalid(objectives),
        }
    }

    /// Shorthand for `self.fitness.is_valid()`.
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_valid()
    }
}

/// Produces random genomes for the initial population.
///
/// [`Representation`](super::Representation) is the built-in implementation;
/// implement this directly to seed known solutions or use a custom layout.
pub trait GenomeFactory: Send + Sync {
    /// Creates one random genome, drawing only from `rng`.
    fn create_random<R: Rng>(&self, rng: &mut R) -> Genome;

    /// Creates `n` independent random genomes.
    fn create_population<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<Genome> {
        (0..n).map(|_| self.create_random(rng)).collect()
    }

    /// Checks that the factory can produce usable genomes.
    ///
    /// Called once when the engine is constructed.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Scores genomes.
///
/// Must be pure and idempotent: the engine relies on unchanged genomes
/// keeping their fitness and only re-scores invalidated individuals.
/// The returned vector has one entry per configured objective.
///
/// `Send + Sync` is required because evaluation may run on a rayon pool
/// when the `parallel` feature is enabled.
pub trait FitnessEvaluator: Send + Sync {
    fn evaluate(&self, genome: &Genome) -> Result<Vec<f64>, BoxError>;
}

impl<T: FitnessEvaluator + ?Sized> FitnessEvaluator for &T {
    fn evaluate(&self, genome: &Genome) -> Result<Vec<f64>, BoxError> {
        (**self).evaluate(genome)
    }
}

/// Adapts a closure into a [`FitnessEvaluator`].
///
/// ```
/// use u_evolve::ga::{FnEvaluator, FitnessEvaluator, Genome};
///
/// let eval = FnEvaluator::new(|g: &Genome| {
///     let ones = g.as_bits().map_or(0, |b| b.iter().filter(|&&x| x).count());
///     Ok(vec![ones as f64])
/// });
/// assert_eq!(eval.evaluate(&Genome::Bits(vec![true, false, true])).unwrap(), vec![2.0]);
/// ```
pub struct FnEvaluator<F> {
    f: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&Genome) -> Result<Vec<f64>, BoxError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> FitnessEvaluator for FnEvaluator<F>
where
    F: Fn(&Genome) -> Result<Vec<f64>, BoxError> + Send + Sync,
{
    fn evaluate(&self, genome: &Genome) -> Result<Vec<f64>, BoxError> {
        (self.f)(genome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max1() -> Arc<[Objective]> {
        Arc::from(vec![Objective::Maximize])
    }

    fn min1() -> Arc<[Objective]> {
        Arc::from(vec![Objective::Minimize])
    }

    #[test]
    fn test_maximize_ordering() {
        let a = FitnessValue::new(vec![5.0], max1()).unwrap();
        let b = FitnessValue::new(vec![3.0], max1()).unwrap();
        assert!(a.is_better_than(&b));
        assert!(!b.is_better_than(&a));
    }

    #[test]
    fn test_minimize_ordering() {
        let a = FitnessValue::new(vec![5.0], min1()).unwrap();
        let b = FitnessValue::new(vec![3.0], min1()).unwrap();
        assert!(b.is_better_than(&a));
    }

    #[test]
    fn test_invalid_is_worst() {
        let valid = FitnessValue::new(vec![-1e9], max1()).unwrap();
        let invalid = FitnessValue::invalid(max1());
        assert!(valid.is_better_than(&invalid));
        assert_eq!(invalid.compare(&invalid.clone()), Ordering::Equal);
    }

    #[test]
    fn test_lexicographic_tie_break() {
        let objs: Arc<[Objective]> = Arc::from(vec![Objective::Maximize, Objective::Minimize]);
        let a = FitnessValue::new(vec![10.0, 2.0], objs.clone()).unwrap();
        let b = FitnessValue::new(vec![10.0, 4.0], objs.clone()).unwrap();
        let c = FitnessValue::new(vec![11.0, 100.0], objs).unwrap();
        assert!(a.is_better_than(&b));
        assert!(c.is_better_than(&a));
    }

    #[test]
    fn test_invalidate_and_assign() {
        let mut f = FitnessValue::new(vec![1.0], max1()).unwrap();
        f.invalidate();
        assert!(!f.is_valid());
        assert!(f.values().is_empty());
        assert!(!f.assign(vec![1.0, 2.0]));
        assert!(!f.is_valid());
        assert!(f.assign(vec![4.0]));
        assert_eq!(f.primary(), Some(4.0));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        assert!(FitnessValue::new(vec![1.0, 2.0], max1()).is_none());
    }

    #[test]
    fn test_meets_target() {
        let f = FitnessValue::new(vec![0.0], min1()).unwrap();
        assert!(f.meets(0.0));
        assert!(!f.meets(-1.0));
        let g = FitnessValue::new(vec![100.0], max1()).unwrap();
        assert!(g.meets(100.0));
        assert!(!g.meets(101.0));
        assert!(!FitnessValue::invalid(max1()).meets(0.0));
    }

    #[test]
    fn test_fn_evaluator_propagates_error() {
        let eval = FnEvaluator::new(|_: &Genome| Err("boom".into()));
        assert!(eval.evaluate(&Genome::Bits(vec![true])).is_err());
    }
}
