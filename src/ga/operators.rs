//! Crossover and mutation operators.
//!
//! Two layers:
//!
//! - Slice-level functions (`two_point_crossover`, `order_crossover`,
//!   `flip_bit`, ...) that work on raw allele vectors and know nothing
//!   about fitness.
//! - The [`Crossover`] and [`Mutation`] strategy enums, chosen once per
//!   problem. They dispatch on the [`Genome`] variant, reject genomes they
//!   cannot handle, and invalidate the fitness of every individual they touch.
//!
//! # Crossover Operators
//!
//! - [`one_point_crossover`], [`two_point_crossover`], [`uniform_crossover`]:
//!   any fixed-length vector
//! - [`order_crossover`] (OX): Davis (1985), preserves relative order
//! - [`pmx_crossover`] (PMX): Goldberg & Lingle (1985), preserves absolute position
//! - [`uniform_pmx_crossover`]: Cicirello & Smith (2000), per-locus PMX
//! - [`sbx_bounded_crossover`] (SBX): Deb & Agrawal (1995)
//!
//! # Mutation Operators
//!
//! - [`flip_bit`], [`uniform_int_mutation`]
//! - [`shuffle_indexes`]: permutation-preserving swaps
//! - [`inversion_mutation`]: reverse a random segment (2-opt)
//! - [`polynomial_bounded_mutation`]: Deb & Goyal (1996)
//! - [`gaussian_mutation`]

use super::genome::{is_permutation, Genome};
use super::types::Individual;
use crate::error::{ConfigError, RepresentationError};
use rand::Rng;
use rand_distr::{Distribution, Normal};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Runs `$body` with `$x`/`$y` bound to the allele vectors of two genomes of
/// the same variant.
macro_rules! pairwise {
    ($a:expr, $b:expr, |$x:ident, $y:ident| $body:expr) => {
        match ($a, $b) {
            (Genome::Bits($x), Genome::Bits($y)) => Ok($body),
            (Genome::Permutation($x), Genome::Permutation($y)) => Ok($body),
            (Genome::Integers($x), Genome::Integers($y)) => Ok($body),
            (Genome::Reals($x), Genome::Reals($y)) => Ok($body),
            (x, y) => Err(RepresentationError::Mismatched {
                left: x.kind(),
                right: y.kind(),
            }),
        }
    };
}

/// Runs `$body` with `$v` bound to the allele vector of any genome.
macro_rules! alleles {
    ($g:expr, |$v:ident| $body:expr) => {
        match $g {
            Genome::Bits($v) => $body,
            Genome::Permutation($v) => $body,
            Genome::Integers($v) => $body,
            Genome::Reals($v) => $body,
        }
    };
}

// ============================================================================
// Strategy enums
// ============================================================================

/// Recombination strategy for an adjacent pair of offspring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Crossover {
    /// Swap the tails after one random cut point.
    OnePoint,
    /// Swap the segment between two random cut points.
    TwoPoint,
    /// Swap each locus independently with probability `indpb`.
    Uniform { indpb: f64 },
    /// Order crossover (OX). Permutations only.
    Ordered,
    /// Partially mapped crossover (PMX). Permutations only.
    PartiallyMatched,
    /// Uniform partially mapped crossover. Permutations only.
    UniformPartiallyMatched { indpb: f64 },
    /// Simulated binary crossover clamped to `[low, high]`. Reals only.
    ///
    /// Larger `eta` keeps children closer to their parents.
    SimulatedBinaryBounded { eta: f64, low: f64, high: f64 },
}

impl Crossover {
    /// Operator name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Crossover::OnePoint => "one-point crossover",
            Crossover::TwoPoint => "two-point crossover",
            Crossover::Uniform { .. } => "uniform crossover",
            Crossover::Ordered => "ordered crossover",
            Crossover::PartiallyMatched => "partially matched crossover",
            Crossover::UniformPartiallyMatched { .. } => "uniform partially matched crossover",
            Crossover::SimulatedBinaryBounded { .. } => "simulated binary bounded crossover",
        }
    }

    /// Checks operator parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Crossover::Uniform { indpb } | Crossover::UniformPartiallyMatched { indpb } => {
                check_probability("crossover indpb", indpb)
            }
            Crossover::SimulatedBinaryBounded { eta, low, high } => {
                check_positive("crossover eta", eta)?;
                check_bounds(low, high)
            }
            _ => Ok(()),
        }
    }

    /// Recombines two genomes in place.
    pub fn apply<R: Rng>(
        &self,
        a: &mut Genome,
        b: &mut Genome,
        rng: &mut R,
    ) -> Result<(), RepresentationError> {
        if a.len() != b.len() {
            return Err(RepresentationError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        match *self {
            Crossover::OnePoint => pairwise!(a, b, |x, y| one_point_crossover(x, y, rng)),
            Crossover::TwoPoint => pairwise!(a, b, |x, y| two_point_crossover(x, y, rng)),
            Crossover::Uniform { indpb } => {
                pairwise!(a, b, |x, y| uniform_crossover(x, y, indpb, rng))
            }
            Crossover::Ordered => {
                let (x, y) = permutations(self.name(), a, b)?;
                let (c1, c2) = order_crossover(x, y, rng);
                x.copy_from_slice(&c1);
                y.copy_from_slice(&c2);
                Ok(())
            }
            Crossover::PartiallyMatched => {
                let (x, y) = permutations(self.name(), a, b)?;
                let (c1, c2) = pmx_crossover(x, y, rng);
                x.copy_from_slice(&c1);
                y.copy_from_slice(&c2);
                Ok(())
            }
            Crossover::UniformPartiallyMatched { indpb } => {
                let (x, y) = permutations(self.name(), a, b)?;
                uniform_pmx_crossover(x, y, indpb, rng);
                Ok(())
            }
            Crossover::SimulatedBinaryBounded { eta, low, high } => match (a, b) {
                (Genome::Reals(x), Genome::Reals(y)) => {
                    sbx_bounded_crossover(x, y, eta, low, high, rng);
                    Ok(())
                }
                (x, y) => Err(unsupported_pair(self.name(), x, y)),
            },
        }
    }

    /// Recombines two offspring in place and invalidates both fitnesses.
    pub fn mate<R: Rng>(
        &self,
        a: &mut Individual,
        b: &mut Individual,
        rng: &mut R,
    ) -> Result<(), RepresentationError> {
        self.apply(&mut a.genome, &mut b.genome, rng)?;
        a.fitness.invalidate();
        b.fitness.invalidate();
        Ok(())
    }

    /// Produces two children from clones of the parents.
    ///
    /// The parents are left untouched.
    pub fn crossover<R: Rng>(
        &self,
        parent1: &Individual,
        parent2: &Individual,
        rng: &mut R,
    ) -> Result<(Individual, Individual), RepresentationError> {
        let mut child1 = parent1.clone();
        let mut child2 = parent2.clone();
        self.mate(&mut child1, &mut child2, rng)?;
        Ok((child1, child2))
    }
}

/// In-place perturbation strategy for one offspring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mutation {
    /// Flip each bit with probability `indpb`. Bits only.
    FlipBit { indpb: f64 },
    /// Swap each position with probability `indpb` with another random one.
    ShuffleIndexes { indpb: f64 },
    /// Reverse a random segment.
    Inversion,
    /// Resample each integer in `low..=high` with probability `indpb`.
    UniformInt { low: i64, high: i64, indpb: f64 },
    /// Polynomial perturbation clamped to `[low, high]`. Reals only.
    PolynomialBounded { eta: f64, low: f64, high: f64, indpb: f64 },
    /// Add N(`mu`, `sigma`) noise with probability `indpb`. Reals only.
    Gaussian { mu: f64, sigma: f64, indpb: f64 },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::FlipBit { .. } => "flip-bit mutation",
            Mutation::ShuffleIndexes { .. } => "shuffle-indexes mutation",
            Mutation::Inversion => "inversion mutation",
            Mutation::UniformInt { .. } => "uniform-int mutation",
            Mutation::PolynomialBounded { .. } => "polynomial bounded mutation",
            Mutation::Gaussian { .. } => "gaussian mutation",
        }
    }

    /// Checks operator parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Mutation::FlipBit { indpb } | Mutation::ShuffleIndexes { indpb } => {
                check_probability("mutation indpb", indpb)
            }
            Mutation::Inversion => Ok(()),
            Mutation::UniformInt { low, high, indpb } => {
                check_probability("mutation indpb", indpb)?;
                if low > high {
                    return Err(ConfigError::InvalidBounds(format!(
                        "integer low {low} exceeds high {high}"
                    )));
                }
                Ok(())
            }
            Mutation::PolynomialBounded {
                eta,
                low,
                high,
                indpb,
            } => {
                check_probability("mutation indpb", indpb)?;
                check_positive("mutation eta", eta)?;
                check_bounds(low, high)
            }
            Mutation::Gaussian { mu, sigma, indpb } => {
                check_probability("mutation indpb", indpb)?;
                if !mu.is_finite() || !sigma.is_finite() || sigma < 0.0 {
                    return Err(ConfigError::InvalidBounds(format!(
                        "gaussian mu {mu}, sigma {sigma}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Perturbs a genome in place.
    pub fn apply<R: Rng>(
        &self,
        genome: &mut Genome,
        rng: &mut R,
    ) -> Result<(), RepresentationError> {
        match (*self, genome) {
            (Mutation::FlipBit { indpb }, Genome::Bits(bits)) => flip_bit(bits, indpb, rng),
            (Mutation::ShuffleIndexes { indpb }, g) => {
                alleles!(g, |v| shuffle_indexes(v, indpb, rng))
            }
            (Mutation::Inversion, g) => alleles!(g, |v| inversion_mutation(v, rng)),
            (Mutation::UniformInt { low, high, indpb }, Genome::Integers(v)) => {
                uniform_int_mutation(v, low, high, indpb, rng)
            }
            (
                Mutation::PolynomialBounded {
                    eta,
                    low,
                    high,
                    indpb,
                },
                Genome::Reals(v),
            ) => polynomial_bounded_mutation(v, eta, low, high, indpb, rng),
            (Mutation::Gaussian { mu, sigma, indpb }, Genome::Reals(v)) => {
                gaussian_mutation(v, mu, sigma, indpb, rng)
            }
            (op, g) => {
                return Err(RepresentationError::Unsupported {
                    operator: op.name(),
                    found: g.kind(),
                })
            }
        }
        Ok(())
    }

    /// Mutates an offspring in place and invalidates its fitness.
    pub fn mutate<R: Rng>(
        &self,
        individual: &mut Individual,
        rng: &mut R,
    ) -> Result<(), RepresentationError> {
        self.apply(&mut individual.genome, rng)?;
        individual.fitness.invalidate();
        Ok(())
    }
}

fn permutations<'a>(
    operator: &'static str,
    a: &'a mut Genome,
    b: &'a mut Genome,
) -> Result<(&'a mut Vec<usize>, &'a mut Vec<usize>), RepresentationError> {
    match (a, b) {
        (Genome::Permutation(x), Genome::Permutation(y)) => {
            if !is_permutation(x) || !is_permutation(y) {
                return Err(RepresentationError::NotAPermutation {
                    operator,
                    length: x.len(),
                });
            }
            Ok((x, y))
        }
        (x, y) => Err(unsupported_pair(operator, x, y)),
    }
}

fn unsupported_pair(operator: &'static str, a: &Genome, b: &Genome) -> RepresentationError {
    if std::mem::discriminant(a) != std::mem::discriminant(b) {
        RepresentationError::Mismatched {
            left: a.kind(),
            right: b.kind(),
        }
    } else {
        RepresentationError::Unsupported {
            operator,
            found: a.kind(),
        }
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn check_bounds(low: f64, high: f64) -> Result<(), ConfigError> {
    if low.is_finite() && high.is_finite() && low < high {
        Ok(())
    } else {
        Err(ConfigError::InvalidBounds(format!("({low}, {high})")))
    }
}

// ============================================================================
// Vector crossover operators
// ============================================================================

/// One-point crossover: swap everything after a random cut in `1..n`.
pub fn one_point_crossover<T, R: Rng>(a: &mut [T], b: &mut [T], rng: &mut R) {
    let n = a.len().min(b.len());
    if n < 2 {
        return;
    }
    let cut = rng.random_range(1..n);
    a[cut..n].swap_with_slice(&mut b[cut..n]);
}

/// Two-point crossover: swap the segment `[cx1, cx2)` between two distinct
/// cut points drawn from `1..=n`.
pub fn two_point_crossover<T, R: Rng>(a: &mut [T], b: &mut [T], rng: &mut R) {
    let n = a.len().min(b.len());
    if n < 2 {
        return;
    }
    let mut cx1 = rng.random_range(1..=n);
    let mut cx2 = rng.random_range(1..n);
    if cx2 >= cx1 {
        cx2 += 1;
    } else {
        std::mem::swap(&mut cx1, &mut cx2);
    }
    a[cx1..cx2].swap_with_slice(&mut b[cx1..cx2]);
}

/// Uniform crossover: swap each locus with probability `indpb`.
pub fn uniform_crossover<T, R: Rng>(a: &mut [T], b: &mut [T], indpb: f64, rng: &mut R) {
    for (x, y) in a.iter_mut().zip(b.iter_mut()) {
        if rng.random::<f64>() < indpb {
            std::mem::swap(x, y);
        }
    }
}

/// Simulated binary crossover on reals, clamped to `[low, high]`.
///
/// Each locus is crossed with probability 0.5; loci where the parents
/// (nearly) agree are left alone.
pub fn sbx_bounded_crossover<R: Rng>(
    a: &mut [f64],
    b: &mut [f64],
    eta: f64,
    low: f64,
    high: f64,
    rng: &mut R,
) {
    let exponent = 1.0 / (eta + 1.0);
    let spread = |beta: f64, u: f64| -> f64 {
        let alpha = 2.0 - beta.powf(-(eta + 1.0));
        if u <= 1.0 / alpha {
            (u * alpha).powf(exponent)
        } else {
            (1.0 / (2.0 - u * alpha)).powf(exponent)
        }
    };

    for i in 0..a.len().min(b.len()) {
        if rng.random::<f64>() > 0.5 {
            continue;
        }
        if (a[i] - b[i]).abs() <= 1e-14 {
            continue;
        }
        let x1 = a[i].min(b[i]);
        let x2 = a[i].max(b[i]);
        let u: f64 = rng.random();

        let beta_q = spread(1.0 + 2.0 * (x1 - low) / (x2 - x1), u);
        let c1 = (0.5 * (x1 + x2 - beta_q * (x2 - x1))).clamp(low, high);

        let beta_q = spread(1.0 + 2.0 * (high - x2) / (x2 - x1), u);
        let c2 = (0.5 * (x1 + x2 + beta_q * (x2 - x1))).clamp(low, high);

        if rng.random::<f64>() <= 0.5 {
            a[i] = c2;
            b[i] = c1;
        } else {
            a[i] = c1;
            b[i] = c2;
        }
    }
}

// ============================================================================
// Permutation crossover operators
// ============================================================================

/// Order Crossover (OX) for permutations.
///
/// Preserves the **relative order** of elements from both parents.
///
/// # Algorithm (Davis, 1985)
///
/// 1. Select a random segment `[start, end]`
/// 2. Copy the segment from the template parent to the child
/// 3. Fill remaining positions with elements from the other parent, in their
///    original order starting after the segment, skipping duplicates
///
/// Both parents must be permutations of `0..n`.
///
/// # Complexity
/// O(n) time, O(n) space
pub fn order_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let (start, end) = random_segment(n, rng);
    (
        ox_build_child(parent1, parent2, start, end),
        ox_build_child(parent2, parent1, start, end),
    )
}

fn ox_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = template.to_vec();
    let mut taken = vec![false; n];
    for &v in &template[start..=end] {
        taken[v] = true;
    }

    let mut pos = (end + 1) % n;
    for offset in 0..n {
        let val = donor[(end + 1 + offset) % n];
        if !taken[val] {
            child[pos] = val;
            pos = (pos + 1) % n;
        }
    }
    child
}

/// Partially Mapped Crossover (PMX) for permutations.
///
/// Preserves the **absolute position** of elements from both parents
/// as much as possible.
///
/// # Algorithm (Goldberg & Lingle, 1985)
///
/// 1. Select a random segment `[start, end]`
/// 2. Copy the segment from the template parent to the child
/// 3. Place each donor segment value not yet in the child by following the
///    segment mapping until a position outside the segment is reached
/// 4. Fill the remaining positions from the donor
///
/// # Complexity
/// O(n) time, O(n) space
pub fn pmx_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let (start, end) = random_segment(n, rng);
    (
        pmx_build_child(parent1, parent2, start, end),
        pmx_build_child(parent2, parent1, start, end),
    )
}

fn pmx_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut donor_pos = vec![0; n];
    for (i, &v) in donor.iter().enumerate() {
        donor_pos[v] = i;
    }

    let mut child: Vec<Option<usize>> = vec![None; n];
    let mut placed = vec![false; n];
    for i in start..=end {
        child[i] = Some(template[i]);
        placed[template[i]] = true;
    }

    for i in start..=end {
        let val = donor[i];
        if placed[val] {
            continue;
        }
        let mut pos = i;
        loop {
            let next = donor_pos[template[pos]];
            if next < start || next > end {
                child[next] = Some(val);
                placed[val] = true;
                break;
            }
            pos = next;
        }
    }

    child
        .into_iter()
        .zip(donor)
        .map(|(slot, &d)| slot.unwrap_or(d))
        .collect()
}

/// Uniform Partially Mapped Crossover for permutations, in place.
///
/// For each locus, with probability `indpb`, the values at that locus are
/// exchanged inside each parent via a position index, which keeps both
/// vectors permutations.
pub fn uniform_pmx_crossover<R: Rng>(a: &mut [usize], b: &mut [usize], indpb: f64, rng: &mut R) {
    let n = a.len().min(b.len());
    let mut pos_a = vec![0; n];
    let mut pos_b = vec![0; n];
    for i in 0..n {
        pos_a[a[i]] = i;
        pos_b[b[i]] = i;
    }

    for i in 0..n {
        if rng.random::<f64>() >= indpb {
            continue;
        }
        let va = a[i];
        let vb = b[i];

        a.swap(i, pos_a[vb]);
        b.swap(i, pos_b[va]);

        pos_a.swap(va, vb);
        pos_b.swap(va, vb);
    }
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Flips each bit with probability `indpb`.
pub fn flip_bit<R: Rng>(bits: &mut [bool], indpb: f64, rng: &mut R) {
    for bit in bits.iter_mut() {
        if rng.random::<f64>() < indpb {
            *bit = !*bit;
        }
    }
}

/// Swaps each position, with probability `indpb`, with a different random
/// position. Preserves permutations.
pub fn shuffle_indexes<T, R: Rng>(v: &mut [T], indpb: f64, rng: &mut R) {
    let n = v.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        if rng.random::<f64>() < indpb {
            let mut j = rng.random_range(0..n - 1);
            if j >= i {
                j += 1;
            }
            v.swap(i, j);
        }
    }
}

/// Inversion mutation: reverse a random segment (2-opt move).
///
/// # Complexity
/// O(n) worst case for segment reversal
pub fn inversion_mutation<T, R: Rng>(v: &mut [T], rng: &mut R) {
    let n = v.len();
    if n < 2 {
        return;
    }
    let (start, end) = random_segment(n, rng);
    v[start..=end].reverse();
}

/// Resamples each integer uniformly in `low..=high` with probability `indpb`.
pub fn uniform_int_mutation<R: Rng>(v: &mut [i64], low: i64, high: i64, indpb: f64, rng: &mut R) {
    for x in v.iter_mut() {
        if rng.random::<f64>() < indpb {
            *x = rng.random_range(low..=high);
        }
    }
}

/// Polynomial bounded mutation on reals.
///
/// Each allele is perturbed with probability `indpb` by a polynomially
/// distributed step scaled to `high - low` and clamped back into bounds.
pub fn polynomial_bounded_mutation<R: Rng>(
    v: &mut [f64],
    eta: f64,
    low: f64,
    high: f64,
    indpb: f64,
    rng: &mut R,
) {
    let range = high - low;
    let mut_pow = 1.0 / (eta + 1.0);
    for x in v.iter_mut() {
        if rng.random::<f64>() > indpb {
            continue;
        }
        let delta_1 = (*x - low) / range;
        let delta_2 = (high - *x) / range;
        let u: f64 = rng.random();

        let delta_q = if u < 0.5 {
            let xy = 1.0 - delta_1;
            let val = 2.0 * u + (1.0 - 2.0 * u) * xy.powf(eta + 1.0);
            val.powf(mut_pow) - 1.0
        } else {
            let xy = 1.0 - delta_2;
            let val = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * xy.powf(eta + 1.0);
            1.0 - val.powf(mut_pow)
        };
        *x = (*x + delta_q * range).clamp(low, high);
    }
}

/// Adds Gaussian noise N(`mu`, `sigma`) to each real with probability `indpb`.
pub fn gaussian_mutation<R: Rng>(v: &mut [f64], mu: f64, sigma: f64, indpb: f64, rng: &mut R) {
    // validate() guarantees a finite, non-negative sigma
    let Ok(normal) = Normal::new(mu, sigma) else {
        return;
    };
    for x in v.iter_mut() {
        if rng.random::<f64>() < indpb {
            *x += normal.sample(rng);
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ============================================================================
// Tests
// ============================================================================
