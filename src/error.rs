//! Error types for the evolutionary engine.
//!
//! Every failure is either rejected while the engine is being built
//! ([`ConfigError`]) or surfaced immediately from the generation that hit it
//! ([`EvolveError::Evaluation`], [`RepresentationError`]). Nothing is retried.

use thiserror::Error;

/// Boxed error returned by user-supplied fitness evaluators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error of an evolutionary run.
#[derive(Debug, Error)]
pub enum EvolveError {
    /// The configuration was rejected at construction.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The fitness evaluator failed; the run is aborted.
    #[error("fitness evaluation failed: {source}")]
    Evaluation {
        #[source]
        source: BoxError,
    },

    /// A genetic operator was applied to a genome it cannot handle.
    #[error("representation mismatch: {0}")]
    Representation(#[from] RepresentationError),
}

impl EvolveError {
    pub(crate) fn evaluation(source: impl Into<BoxError>) -> Self {
        EvolveError::Evaluation {
            source: source.into(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population size must be at least 1")]
    EmptyPopulation,

    #[error("max_generations must be at least 1")]
    NoGenerations,

    #[error("{name} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("at least one objective is required")]
    NoObjectives,

    #[error("tournament size must be at least 1")]
    EmptyTournament,

    #[error("genome representation must have a non-zero length")]
    EmptyRepresentation,

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("objective index {index} is out of range for {objectives} objective(s)")]
    ObjectiveIndex { index: usize, objectives: usize },

    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}

/// A genetic operator received a genome it cannot process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepresentationError {
    #[error("{operator} cannot operate on a {found} genome")]
    Unsupported {
        operator: &'static str,
        found: &'static str,
    },

    #[error("parents have different representations ({left} vs {right})")]
    Mismatched {
        left: &'static str,
        right: &'static str,
    },

    #[error("parents have different lengths ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("{operator} requires a permutation of 0..{length}")]
    NotAPermutation {
        operator: &'static str,
        length: usize,
    },
}
