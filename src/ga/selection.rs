//! Selection strategies.
//!
//! Selection samples, with replacement, the individuals that will be cloned
//! into the next generation's offspring. It only reads fitness values and
//! never touches genomes.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use super::types::Individual;
use crate::error::ConfigError;
use rand::Rng;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Selection strategy for choosing offspring.
///
/// All strategies respect the declared objective senses through
/// [`FitnessValue::compare`](super::FitnessValue::compare).
///
/// # Examples
///
/// ```
/// use u_evolve::ga::Selection;
///
/// // Tournament with size 3 (moderate selection pressure)
/// let sel = Selection::Tournament(3);
///
/// // Linear ranking
/// let sel = Selection::Rank;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Selection {
    /// Tournament selection: draw `k` individuals uniformly at random (with
    /// replacement) and keep the best. Ties go to the first one drawn.
    ///
    /// - k=2: light pressure (good for diversity)
    /// - k=3: moderate pressure (typical default)
    /// - k>5: strong pressure (risk of premature convergence)
    ///
    /// # Complexity
    /// O(k) per selection
    Tournament(usize),

    /// Fitness-proportionate (roulette wheel) selection on the primary
    /// objective.
    ///
    /// Weighted primary values are shifted so the worst individual keeps a
    /// small positive weight; this works for both senses and for negative
    /// fitness values.
    ///
    /// # Complexity
    /// O(n) per selection
    Roulette,

    /// Linear rank selection.
    ///
    /// Individuals are ranked best-first; rank `r` (0 = best) has weight
    /// `n - r`. Only the fitness order matters, not its scale.
    ///
    /// Reference: Baker (1985), "Adaptive Selection Methods for Genetic
    /// Algorithms"
    ///
    /// # Complexity
    /// O(n log n) per batch, O(n) per selection
    Rank,

    /// Uniform random selection (no pressure).
    Random,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Checks strategy parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Selection::Tournament(0) => Err(ConfigError::EmptyTournament),
            _ => Ok(()),
        }
    }

    /// Samples `count` individuals from `population`, with replacement.
    ///
    /// Returns an empty vector if the population is empty.
    pub fn select<'a, R: Rng>(
        &self,
        population: &'a [Individual],
        count: usize,
        rng: &mut R,
    ) -> Vec<&'a Individual> {
        self.select_indices(population, count, rng)
            .into_iter()
            .map(|i| &population[i])
            .collect()
    }

    /// Like [`select`](Self::select) but returns population indices.
    pub fn select_indices<R: Rng>(
        &self,
        population: &[Individual],
        count: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        if population.is_empty() {
            return Vec::new();
        }
        match self {
            Selection::Tournament(k) => (0..count)
                .map(|_| tournament(population, *k, rng))
                .collect(),
            Selection::Random => (0..count)
                .map(|_| rng.random_range(0..population.len()))
                .collect(),
            Selection::Roulette => {
                let wheel = Wheel::new(roulette_weights(population));
                (0..count).map(|_| wheel.spin(rng)).collect()
            }
            Selection::Rank => {
                let order = ranked(population);
                let n = order.len();
                let wheel = Wheel::new((0..n).map(|r| (n - r) as f64).collect());
                (0..count).map(|_| order[wheel.spin(rng)]).collect()
            }
        }
    }
}

/// Tournament selection: pick k random individuals, return the best.
fn tournament<R: Rng>(population: &[Individual], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if population[idx]
            .fitness
            .is_better_than(&population[best_idx].fitness)
        {
            best_idx = idx;
        }
    }
    best_idx
}

/// Population indices sorted best-first (stable).
fn ranked(population: &[Individual]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..population.len()).collect();
    order.sort_by(|&a, &b| population[b].fitness.compare(&population[a].fitness));
    order
}

/// Shifted weighted primary values: best gets the largest weight.
fn roulette_weights(population: &[Individual]) -> Vec<f64> {
    let epsilon = 1e-10;
    let scores: Vec<f64> = population
        .iter()
        .map(|ind| ind.fitness.weighted().next().unwrap_or(f64::NEG_INFINITY))
        .collect();
    let floor = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::INFINITY, f64::min);

    scores
        .iter()
        .map(|&s| {
            let w = s - floor + epsilon;
            if w.is_finite() && w > 0.0 {
                w
            } else {
                epsilon
            }
        })
        .collect()
}

/// Cumulative weight table for proportional sampling.
struct Wheel {
    cumulative: Vec<f64>,
}

impl Wheel {
    fn new(weights: Vec<f64>) -> Self {
        let mut total = 0.0;
        let cumulative = weights
            .into_iter()
            .map(|w| {
                total += w;
                total
            })
            .collect();
        Self { cumulative }
    }

    fn spin<R: Rng>(&self, rng: &mut R) -> usize {
        let n = self.cumulative.len();
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        if total <= 0.0 {
            return rng.random_range(0..n);
        }
        let threshold = rng.random_range(0.0..total);
        self.cumulative
            .partition_point(|&c| c.partial_cmp(&threshold) != Some(Ordering::Greater))
            .min(n - 1)
    }
}
