//! Engine configuration.
//!
//! [`EvolutionConfig`] holds the numeric parameters of the generational loop;
//! [`Operators`] holds the variation strategies chosen for a problem.

use super::operators::{Crossover, Mutation};
use super::selection::Selection;
use super::statistics::Statistics;
use super::types::Objective;
use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the evolutionary loop.
///
/// # Defaults
///
/// ```
/// use u_evolve::ga::EvolutionConfig;
///
/// let config = EvolutionConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_generations, 100);
/// assert!(config.validate().is_ok());
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::ga::{EvolutionConfig, Objective};
///
/// let config = EvolutionConfig::default()
///     .with_population_size(300)
///     .with_objectives(vec![Objective::Minimize])
///     .with_hall_of_fame_size(30)
///     .with_mutation_rate(0.25)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvolutionConfig {
    /// Number of individuals in every generation.
    pub population_size: usize,

    /// Number of generations after the initial one.
    pub max_generations: usize,

    /// Probability of recombining an adjacent offspring pair (0.0–1.0).
    pub crossover_rate: f64,

    /// Probability of mutating an offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Capacity of the hall of fame.
    ///
    /// With elitism enabled this is also the number of archived individuals
    /// re-injected into every generation.
    pub hall_of_fame_size: usize,

    /// Whether hall-of-fame entries replace the worst offspring.
    ///
    /// Has no effect when `hall_of_fame_size` is 0.
    pub elitism: bool,

    /// Optimization sense of each fitness component.
    pub objectives: Vec<Objective>,

    /// Stop as soon as the best primary fitness reaches this value.
    pub target_fitness: Option<f64>,

    /// Number of generations without improvement of the best-ever fitness
    /// before stopping. 0 disables stagnation-based termination.
    pub stagnation_limit: usize,

    /// Evaluate offspring on the rayon pool.
    ///
    /// Only honored when the crate is built with the `parallel` feature.
    pub parallel: bool,

    /// Random seed for reproducibility. `None` draws a fresh seed.
    pub seed: Option<u64>,

    /// Reducers recorded for every generation.
    pub statistics: Statistics,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 100,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            hall_of_fame_size: 10,
            elitism: true,
            objectives: vec![Objective::Maximize],
            target_fitness: None,
            stagnation_limit: 0,
            parallel: false,
            seed: None,
            statistics: Statistics::default(),
        }
    }
}

impl EvolutionConfig {
    /// Creates a validated configuration from the core loop parameters.
    ///
    /// The fitness defaults to a single maximized objective; use
    /// [`with_objectives`](Self::with_objectives) to change it.
    pub fn new(
        population_size: usize,
        crossover_rate: f64,
        mutation_rate: f64,
        max_generations: usize,
        hall_of_fame_size: usize,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            population_size,
            crossover_rate,
            mutation_rate,
            max_generations,
            hall_of_fame_size,
            seed: Some(seed),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the crossover rate. Out-of-range values are rejected by
    /// [`validate`](Self::validate), not clamped.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the hall-of-fame capacity.
    pub fn with_hall_of_fame_size(mut self, n: usize) -> Self {
        self.hall_of_fame_size = n;
        self
    }

    /// Enables or disables hall-of-fame elitism.
    pub fn with_elitism(mut self, elitism: bool) -> Self {
        self.elitism = elitism;
        self
    }

    /// Sets the objective senses.
    pub fn with_objectives(mut self, objectives: Vec<Objective>) -> Self {
        self.objectives = objectives;
        self
    }

    /// Shorthand for a single maximized objective.
    pub fn maximize(self) -> Self {
        self.with_objectives(vec![Objective::Maximize])
    }

    /// Shorthand for a single minimized objective.
    pub fn minimize(self) -> Self {
        self.with_objectives(vec![Objective::Minimize])
    }

    /// Sets the target fitness for early termination.
    pub fn with_target_fitness(mut self, target: f64) -> Self {
        self.target_fitness = Some(target);
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the recorded statistics.
    pub fn with_statistics(mut self, statistics: Statistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// Number of hall-of-fame individuals injected into each generation.
    pub fn elite_count(&self) -> usize {
        if self.elitism {
            self.hall_of_fame_size.min(self.population_size)
        } else {
            0
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.max_generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        for (name, value) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        if self.objectives.is_empty() {
            return Err(ConfigError::NoObjectives);
        }
        if self.statistics.objective >= self.objectives.len() {
            return Err(ConfigError::ObjectiveIndex {
                index: self.statistics.objective,
                objectives: self.objectives.len(),
            });
        }
        Ok(())
    }
}

/// Variation strategies for one problem, resolved at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Operators {
    pub selection: Selection,
    pub crossover: Crossover,
    pub mutation: Mutation,
}

impl Operators {
    pub fn new(selection: Selection, crossover: Crossover, mutation: Mutation) -> Self {
        Self {
            selection,
            crossover,
            mutation,
        }
    }

    /// Validates every strategy's parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selection.validate()?;
        self.crossover.validate()?;
        self.mutation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::Reducer;

    #[test]
    fn test_default_config() {
        let config = EvolutionConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.max_generations, 100);
        assert!((config.crossover_rate - 0.9).abs() < 1e-10);
        assert!((config.mutation_rate - 0.1).abs() < 1e-10);
        assert_eq!(config.hall_of_fame_size, 10);
        assert!(config.elitism);
        assert_eq!(config.objectives, vec![Objective::Maximize]);
        assert_eq!(config.stagnation_limit, 0);
        assert!(!config.parallel);
        assert!(config.seed.is_none());
        assert!(config.target_fitness.is_none());
    }

    #[test]
    fn test_new_validates() {
        let config = EvolutionConfig::new(200, 0.9, 0.1, 50, 10, 42).unwrap();
        assert_eq!(config.population_size, 200);
        assert_eq!(config.seed, Some(42));

        assert_eq!(
            EvolutionConfig::new(0, 0.9, 0.1, 50, 10, 42),
            Err(ConfigError::EmptyPopulation)
        );
        assert_eq!(
            EvolutionConfig::new(10, 0.9, 0.1, 0, 10, 42),
            Err(ConfigError::NoGenerations)
        );
        assert!(matches!(
            EvolutionConfig::new(10, 1.5, 0.1, 5, 1, 42),
            Err(ConfigError::ProbabilityOutOfRange {
                name: "crossover_rate",
                ..
            })
        ));
        assert!(matches!(
            EvolutionConfig::new(10, 0.5, -0.1, 5, 1, 42),
            Err(ConfigError::ProbabilityOutOfRange {
                name: "mutation_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_builder_pattern() {
        let config = EvolutionConfig::default()
            .with_population_size(300)
            .with_max_generations(200)
            .with_crossover_rate(0.8)
            .with_mutation_rate(0.25)
            .with_hall_of_fame_size(30)
            .with_elitism(false)
            .minimize()
            .with_target_fitness(0.0)
            .with_stagnation_limit(25)
            .with_parallel(true)
            .with_seed(7)
            .with_statistics(Statistics::new(vec![Reducer::Min]));

        assert_eq!(config.population_size, 300);
        assert_eq!(config.max_generations, 200);
        assert_eq!(config.hall_of_fame_size, 30);
        assert!(!config.elitism);
        assert_eq!(config.objectives, vec![Objective::Minimize]);
        assert_eq!(config.target_fitness, Some(0.0));
        assert_eq!(config.stagnation_limit, 25);
        assert!(config.parallel);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.statistics.reducers, vec![Reducer::Min]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rates_not_clamped() {
        let config = EvolutionConfig::default().with_mutation_rate(2.0);
        assert_eq!(config.mutation_rate, 2.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_objectives() {
        let config = EvolutionConfig::default().with_objectives(vec![]);
        assert_eq!(config.validate(), Err(ConfigError::NoObjectives));

        let config = EvolutionConfig::default()
            .with_statistics(Statistics::default().with_objective(1));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ObjectiveIndex { index: 1, .. })
        ));
    }

    #[test]
    fn test_elite_count() {
        let config = EvolutionConfig::default()
            .with_population_size(5)
            .with_hall_of_fame_size(10);
        assert_eq!(config.elite_count(), 5);
        assert_eq!(config.with_elitism(false).elite_count(), 0);
    }

    #[test]
    fn test_operators_validate() {
        let ops = Operators::new(
            Selection::Tournament(0),
            Crossover::TwoPoint,
            Mutation::FlipBit { indpb: 0.01 },
        );
        assert_eq!(ops.validate(), Err(ConfigError::EmptyTournament));

        let ops = Operators::new(
            Selection::Tournament(3),
            Crossover::TwoPoint,
            Mutation::FlipBit { indpb: 0.01 },
        );
        assert!(ops.validate().is_ok());
    }
}
