//! Genome representations and the built-in random genome factory.

use super::types::GenomeFactory;
use crate::error::ConfigError;
use rand::distr::Uniform;
use rand::seq::SliceRandom;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Encoded candidate solution.
///
/// All variants are fixed-length allele vectors; operators check that the
/// variant matches what they expect and report a
/// [`RepresentationError`](crate::error::RepresentationError) otherwise.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Genome {
    /// Fixed-length bit vector (item selection, shift assignment).
    Bits(Vec<bool>),
    /// Permutation of `0..n` (tours, queen placements).
    Permutation(Vec<usize>),
    /// Integers within configured bounds (color assignment).
    Integers(Vec<i64>),
    /// Reals within configured bounds (numeric minimization).
    Reals(Vec<f64>),
}

impl Genome {
    /// Number of alleles.
    pub fn len(&self) -> usize {
        match self {
            Genome::Bits(v) => v.len(),
            Genome::Permutation(v) => v.len(),
            Genome::Integers(v) => v.len(),
            Genome::Reals(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Genome::Bits(_) => "bits",
            Genome::Permutation(_) => "permutation",
            Genome::Integers(_) => "integers",
            Genome::Reals(_) => "reals",
        }
    }

    pub fn as_bits(&self) -> Option<&[bool]> {
        match self {
            Genome::Bits(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_permutation(&self) -> Option<&[usize]> {
        match self {
            Genome::Permutation(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_integers(&self) -> Option<&[i64]> {
        match self {
            Genome::Integers(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_reals(&self) -> Option<&[f64]> {
        match self {
            Genome::Reals(v) => Some(v),
            _ => None,
        }
    }
}

/// Checks that a slice is a permutation of `0..len`.
pub fn is_permutation(perm: &[usize]) -> bool {
    let n = perm.len();
    let mut seen = vec![false; n];
    for &v in perm {
        if v >= n || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}

/// Built-in genome layouts.
///
/// Implements [`GenomeFactory`] by sampling uniformly within the layout.
///
/// ```
/// use u_evolve::ga::{GenomeFactory, Representation};
/// use u_evolve::random::create_rng;
///
/// let mut rng = create_rng(1);
/// let genome = Representation::Permutation { length: 8 }.create_random(&mut rng);
/// assert_eq!(genome.len(), 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Representation {
    /// `length` fair coin flips.
    Bits { length: usize },
    /// A uniformly shuffled permutation of `0..length`.
    Permutation { length: usize },
    /// `length` integers drawn uniformly from `low..=high`.
    Integers { length: usize, low: i64, high: i64 },
    /// One real per bound pair, drawn uniformly from `lo..=hi`.
    Reals { bounds: Vec<(f64, f64)> },
}

impl Representation {
    /// Reals with the same bounds on every dimension.
    pub fn reals(length: usize, low: f64, high: f64) -> Self {
        Representation::Reals {
            bounds: vec![(low, high); length],
        }
    }

    /// Number of alleles in genomes of this layout.
    pub fn length(&self) -> usize {
        match self {
            Representation::Bits { length }
            | Representation::Permutation { length }
            | Representation::Integers { length, .. } => *length,
            Representation::Reals { bounds } => bounds.len(),
        }
    }
}

impl GenomeFactory for Representation {
    fn create_random<R: Rng>(&self, rng: &mut R) -> Genome {
        match self {
            Representation::Bits { length } => {
                Genome::Bits((0..*length).map(|_| rng.random_bool(0.5)).collect())
            }
            Representation::Permutation { length } => {
                let mut perm: Vec<usize> = (0..*length).collect();
                perm.shuffle(rng);
                Genome::Permutation(perm)
            }
            Representation::Integers { length, low, high } => Genome::Integers(
                (0..*length).map(|_| rng.random_range(*low..=*high)).collect(),
            ),
            Representation::Reals { bounds } => Genome::Reals(
                bounds
                    .iter()
                    .map(|&(lo, hi)| rng.random_range(lo..=hi))
                    .collect(),
            ),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.length() == 0 {
            return Err(ConfigError::EmptyRepresentation);
        }
        match self {
            Representation::Integers { low, high, .. } if low > high => Err(
                ConfigError::InvalidBounds(format!("integer low {low} exceeds high {high}")),
            ),
            Representation::Reals { bounds } => {
                for (i, &(lo, hi)) in bounds.iter().enumerate() {
                    // Same check the sampler applies, including ranges too wide to scale.
                    if let Err(err) = Uniform::new_inclusive(lo, hi) {
                        return Err(ConfigError::InvalidBounds(format!(
                            "real bound {i} is ({lo}, {hi}): {err}"
                        )));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
