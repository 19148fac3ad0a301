//! Generational evolutionary algorithm.
//!
//! A generic, problem-agnostic engine. Users describe their problem with a
//! [`GenomeFactory`] (how to create random candidates, usually a
//! [`Representation`]) and a [`FitnessEvaluator`] (how to score them), then
//! pick [`Operators`] and an [`EvolutionConfig`].
//!
//! # Core Traits
//!
//! - [`GenomeFactory`]: produces random genomes for the initial population
//! - [`FitnessEvaluator`]: maps a genome to one value per objective
//!
//! # Key Types
//!
//! - [`Genome`]: tagged allele vector (bits, permutation, integers, reals)
//! - [`FitnessValue`]: weighted, lexicographically compared fitness tuple
//! - [`EvolutionEngine`]: executes the evolutionary loop
//! - [`HallOfFame`]: best individuals ever seen, used for elitism
//! - [`Logbook`]: per-generation statistics
//!
//! # Submodules
//!
//! - [`operators`]: crossover and mutation on genomes and raw allele slices
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - De Jong (2006), *Evolutionary Computation: A Unified Approach*

mod config;
mod genome;
mod hall_of_fame;
pub mod operators;
mod runner;
mod selection;
mod statistics;
mod types;

pub use config::{EvolutionConfig, Operators};
pub use genome::{is_permutation, Genome, Representation};
pub use hall_of_fame::HallOfFame;
pub use operators::{Crossover, Mutation};
pub use runner::{EngineState, EvolutionEngine, EvolutionResult, Generations, Termination};
pub use selection::Selection;
pub use statistics::{GenerationRecord, Logbook, Reducer, Statistics};
pub use types::{FitnessEvaluator, FitnessValue, FnEvaluator, GenomeFactory, Individual, Objective};
