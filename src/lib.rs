//! Generic evolutionary optimization.
//!
//! Evolves a population of candidate solutions for any problem that can
//! supply a way to create random candidates and a way to score them:
//!
//! - **Representations**: bit strings, permutations, bounded integer and
//!   real vectors, all behind one tagged [`ga::Genome`] type.
//! - **Operators**: tournament, roulette, rank and random selection;
//!   one-point, two-point, uniform, OX, PMX, uniform PMX and SBX crossover;
//!   bit-flip, index shuffle, inversion, uniform-integer, polynomial and
//!   Gaussian mutation.
//! - **Loop**: a generational loop with a bounded hall of fame, optional
//!   elitism, per-generation statistics and early termination on a target
//!   fitness, stagnation or cancellation.
//!
//! Runs are reproducible: every random draw comes from one seeded generator
//! owned by the engine.
//!
//! # Features
//!
//! - `parallel`: evaluate offspring on the rayon thread pool
//! - `serde`: derive `Serialize`/`Deserialize` for configuration and results

pub mod error;
pub mod ga;
pub mod random;

pub use error::{BoxError, ConfigError, EvolveError, RepresentationError};
