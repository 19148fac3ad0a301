//! Generational evolutionary loop.
//!
//! [`EvolutionEngine`] orchestrates the complete process:
//! initialization → evaluation → (selection → variation → evaluation of
//! invalidated offspring → elitism → statistics)* → termination.
//!
//! The loop is driven one generation at a time by [`EvolutionEngine::step`];
//! [`EvolutionEngine::generations`] exposes it as a lazy iterator of
//! statistics records and [`EvolutionEngine::run`] drives it to the end.
//! Population and hall of fame are consistent after every completed
//! generation, so callers may stop at any record.

use super::config::{EvolutionConfig, Operators};
use super::hall_of_fame::HallOfFame;
use super::statistics::{GenerationRecord, Logbook};
use super::types::{FitnessEvaluator, FitnessValue, GenomeFactory, Individual, Objective};
use crate::error::EvolveError;
use crate::random::{create_rng, resolve_seed};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// All `max_generations` generations completed.
    MaxGenerations,
    /// The best primary fitness reached `target_fitness`.
    TargetReached,
    /// The best-ever fitness did not improve for `stagnation_limit` generations.
    Stagnation,
    /// The cancellation flag was set.
    Cancelled,
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Built; the initial population does not exist yet.
    Initialized,
    /// At least generation 0 has been recorded.
    Running,
    /// No more generations will be produced.
    Terminated,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// The final generation.
    pub population: Vec<Individual>,

    /// Best individuals seen over the whole run.
    pub hall_of_fame: HallOfFame,

    /// One record per completed generation, generation 0 first.
    pub logbook: Logbook,

    /// Number of generations completed after the initial one.
    pub generations: usize,

    /// Why the run stopped. `None` only if the run never started.
    pub termination: Option<Termination>,
}

impl EvolutionResult {
    /// Best individual found: the hall-of-fame head, or the best of the final
    /// population when the hall of fame is disabled.
    pub fn best(&self) -> Option<&Individual> {
        self.hall_of_fame
            .best()
            .or_else(|| best_of(&self.population))
    }
}

/// Executes the evolutionary loop for one problem.
///
/// # Usage
///
/// ```
/// use u_evolve::ga::{
///     Crossover, EvolutionConfig, EvolutionEngine, FnEvaluator, Genome, Mutation, Operators,
///     Representation, Selection,
/// };
///
/// let config = EvolutionConfig::new(50, 0.9, 0.1, 20, 5, 42).unwrap();
/// let operators = Operators::new(
///     Selection::Tournament(3),
///     Crossover::TwoPoint,
///     Mutation::FlipBit { indpb: 0.05 },
/// );
/// let one_max = FnEvaluator::new(|g: &Genome| {
///     let ones = g.as_bits().map_or(0, |b| b.iter().filter(|&&x| x).count());
///     Ok(vec![ones as f64])
/// });
///
/// let engine = EvolutionEngine::new(
///     config,
///     operators,
///     Representation::Bits { length: 20 },
///     one_max,
/// )
/// .unwrap();
/// let result = engine.run().unwrap();
/// assert_eq!(result.logbook.len(), 21);
/// ```
pub struct EvolutionEngine<F, E> {
    config: EvolutionConfig,
    operators: Operators,
    factory: F,
    evaluator: E,
    objectives: Arc<[Objective]>,
    rng: StdRng,
    seed: u64,
    population: Vec<Individual>,
    hall_of_fame: HallOfFame,
    logbook: Logbook,
    state: EngineState,
    generation: usize,
    best_ever: Option<FitnessValue>,
    stagnation: usize,
    termination: Option<Termination>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<F: GenomeFactory, E: FitnessEvaluator> EvolutionEngine<F, E> {
    /// Validates every collaborator and prepares the random source.
    ///
    /// Configuration problems are reported here, never mid-run.
    pub fn new(
        config: EvolutionConfig,
        operators: Operators,
        factory: F,
        evaluator: E,
    ) -> Result<Self, EvolveError> {
        config.validate()?;
        operators.validate()?;
        factory.validate()?;

        let seed = resolve_seed(config.seed);
        let objectives: Arc<[Objective]> = Arc::from(config.objectives.clone());

        Ok(Self {
            hall_of_fame: HallOfFame::new(config.hall_of_fame_size),
            population: Vec::with_capacity(config.population_size),
            rng: create_rng(seed),
            seed,
            objectives,
            config,
            operators,
            factory,
            evaluator,
            logbook: Logbook::new(),
            state: EngineState::Initialized,
            generation: 0,
            best_ever: None,
            stagnation: 0,
            termination: None,
            cancel: None,
        })
    }

    /// Attaches a cancellation flag, checked before every generation.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Runs to termination.
    pub fn run(mut self) -> Result<EvolutionResult, EvolveError> {
        while self.step()?.is_some() {}
        Ok(self.into_result())
    }

    /// Runs to termination or until `cancel` is set.
    ///
    /// A cancelled run still returns the last completed generation and the
    /// hall of fame accumulated so far.
    pub fn run_with_cancel(self, cancel: Arc<AtomicBool>) -> Result<EvolutionResult, EvolveError> {
        self.with_cancel(cancel).run()
    }

    /// Lazily yields one statistics record per completed generation.
    pub fn generations(&mut self) -> Generations<'_, F, E> {
        Generations { engine: self }
    }

    /// Advances the loop by one generation.
    ///
    /// The first call creates and evaluates the initial population and
    /// returns generation 0. Returns `Ok(None)` once the run has terminated.
    /// An error terminates the engine.
    pub fn step(&mut self) -> Result<Option<GenerationRecord>, EvolveError> {
        let outcome = match self.state {
            EngineState::Terminated => return Ok(None),
            EngineState::Initialized => self.initialize().map(Some),
            EngineState::Running => {
                if self.cancel_requested() {
                    warn!("evolution cancelled after generation {}", self.generation);
                    self.finish(Termination::Cancelled);
                    return Ok(None);
                }
                self.evolve_generation().map(Some)
            }
        };
        if outcome.is_err() {
            self.state = EngineState::Terminated;
        }
        outcome
    }

    /// Current population (empty before the first step).
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    pub fn logbook(&self) -> &Logbook {
        &self.logbook
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Seed actually used by this engine's random source.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Index of the last completed generation.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Consumes the engine, returning its current checkpoint.
    pub fn into_result(self) -> EvolutionResult {
        EvolutionResult {
            population: self.population,
            hall_of_fame: self.hall_of_fame,
            logbook: self.logbook,
            generations: self.generation,
            termination: self.termination,
        }
    }

    fn initialize(&mut self) -> Result<GenerationRecord, EvolveError> {
        info!(
            "evolution started: population={}, max_generations={}, hall_of_fame={}, seed={}",
            self.config.population_size,
            self.config.max_generations,
            self.config.hall_of_fame_size,
            self.seed
        );

        let objectives = &self.objectives;
        let mut population: Vec<Individual> = self
            .factory
            .create_population(self.config.population_size, &mut self.rng)
            .into_iter()
            .map(|genome| Individual::new(genome, objectives.clone()))
            .collect();

        let evaluations = self.evaluate_invalid(&mut population)?;
        self.hall_of_fame.update(&population);
        self.population = population;
        self.state = EngineState::Running;

        Ok(self.record(evaluations))
    }

    fn evolve_generation(&mut self) -> Result<GenerationRecord, EvolveError> {
        let n = self.config.population_size;

        // 1. Selection, cloned so parents are never modified
        let mut offspring: Vec<Individual> = self
            .operators
            .selection
            .select(&self.population, n, &mut self.rng)
            .into_iter()
            .cloned()
            .collect();

        // 2. Variation
        self.vary(&mut offspring)?;

        // 3. Evaluate only what variation invalidated
        let evaluations = self.evaluate_invalid(&mut offspring)?;

        // 4. Elitism, then archive the finalized generation
        self.inject_elites(&mut offspring);
        self.hall_of_fame.update(&offspring);
        self.population = offspring;
        self.generation += 1;

        // 5. Statistics
        Ok(self.record(evaluations))
    }

    /// Pairwise crossover over (0,1), (2,3), ... then independent mutation.
    fn vary(&mut self, offspring: &mut [Individual]) -> Result<(), EvolveError> {
        let crossover = self.operators.crossover;
        let mutation = self.operators.mutation;

        for pair in offspring.chunks_exact_mut(2) {
            if self.rng.random::<f64>() < self.config.crossover_rate {
                let (left, right) = pair.split_at_mut(1);
                crossover.mate(&mut left[0], &mut right[0], &mut self.rng)?;
            }
        }
        for ind in offspring.iter_mut() {
            if self.rng.random::<f64>() < self.config.mutation_rate {
                mutation.mutate(ind, &mut self.rng)?;
            }
        }
        Ok(())
    }

    /// Evaluates individuals with an invalid fitness; returns how many.
    fn evaluate_invalid(&self, individuals: &mut [Individual]) -> Result<usize, EvolveError> {
        let pending = individuals.iter().filter(|i| !i.is_evaluated()).count();

        if self.config.parallel {
            self.evaluate_parallel(individuals)?;
        } else {
            for ind in individuals.iter_mut().filter(|i| !i.is_evaluated()) {
                evaluate_one(&self.evaluator, ind)?;
            }
        }
        Ok(pending)
    }

    #[cfg(feature = "parallel")]
    fn evaluate_parallel(&self, individuals: &mut [Individual]) -> Result<(), EvolveError> {
        let evaluator = &self.evaluator;
        individuals
            .par_iter_mut()
            .filter(|ind| !ind.is_evaluated())
            .try_for_each(|ind| evaluate_one(evaluator, ind))
    }

    /// Without the `parallel` feature the flag is ignored.
    #[cfg(not(feature = "parallel"))]
    fn evaluate_parallel(&self, individuals: &mut [Individual]) -> Result<(), EvolveError> {
        for ind in individuals.iter_mut().filter(|i| !i.is_evaluated()) {
            evaluate_one(&self.evaluator, ind)?;
        }
        Ok(())
    }

    /// Overwrites the worst offspring with the hall of fame's best entries.
    ///
    /// Offspring are stably sorted worst-first and slots `0..k` receive the
    /// archive's entries in best-first order, where
    /// `k = min(elite_count, archive length)`.
    fn inject_elites(&self, offspring: &mut [Individual]) {
        let k = self.config.elite_count().min(self.hall_of_fame.len());
        if k == 0 {
            return;
        }
        offspring.sort_by(|a, b| a.fitness.compare(&b.fitness));
        for (slot, elite) in offspring.iter_mut().zip(self.hall_of_fame.items()).take(k) {
            *slot = elite.clone();
        }
        trace!("generation {}: injected {k} elites", self.generation + 1);
    }

    fn record(&mut self, evaluations: usize) -> GenerationRecord {
        let record = GenerationRecord {
            generation: self.generation,
            evaluations,
            values: self.config.statistics.compile(&self.population),
        };
        debug!(
            "generation {}: evaluations={} {}",
            record.generation,
            record.evaluations,
            record
                .values
                .iter()
                .map(|(r, v)| format!("{}={v:.6}", r.name()))
                .collect::<Vec<_>>()
                .join(" ")
        );
        self.logbook.push(record.clone());
        self.update_progress();
        record
    }

    /// Tracks the best-ever fitness and decides whether to stop.
    fn update_progress(&mut self) {
        let current = self
            .hall_of_fame
            .best()
            .or_else(|| best_of(&self.population))
            .map(|ind| ind.fitness.clone());

        let improved = match (&self.best_ever, &current) {
            (Some(best), Some(cur)) => cur.is_better_than(best),
            (None, Some(_)) => true,
            (_, None) => false,
        };
        if improved {
            self.best_ever = current;
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }

        let reached = match (self.config.target_fitness, &self.best_ever) {
            (Some(target), Some(best)) => best.meets(target),
            _ => false,
        };

        if reached {
            info!("target fitness reached at generation {}", self.generation);
            self.finish(Termination::TargetReached);
        } else if self.generation >= self.config.max_generations {
            self.finish(Termination::MaxGenerations);
        } else if self.config.stagnation_limit > 0
            && self.stagnation >= self.config.stagnation_limit
        {
            warn!(
                "no improvement for {} generations, stopping at generation {}",
                self.stagnation, self.generation
            );
            self.finish(Termination::Stagnation);
        }
    }

    fn finish(&mut self, termination: Termination) {
        self.state = EngineState::Terminated;
        self.termination = Some(termination);
        info!(
            "evolution finished after {} generation(s): {:?}, best={:?}",
            self.generation,
            termination,
            self.best_ever.as_ref().map(|f| f.values().to_vec())
        );
    }

    fn cancel_requested(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Lazy sequence of generation records. See [`EvolutionEngine::generations`].
pub struct Generations<'a, F, E> {
    engine: &'a mut EvolutionEngine<F, E>,
}

impl<F: GenomeFactory, E: FitnessEvaluator> Iterator for Generations<'_, F, E> {
    type Item = Result<GenerationRecord, EvolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.engine.step().transpose()
    }
}

/// Scores one individual, checking the result's arity.
///
/// Non-finite values are rejected: they have no place in the fitness order.
fn evaluate_one<E: FitnessEvaluator>(
    evaluator: &E,
    ind: &mut Individual,
) -> Result<(), EvolveError> {
    let values = evaluator
        .evaluate(&ind.genome)
        .map_err(EvolveError::evaluation)?;
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(EvolveError::evaluation(format!(
            "evaluator returned a non-finite fitness value ({bad})"
        )));
    }
    let found = values.len();
    if !ind.fitness.assign(values) {
        return Err(EvolveError::evaluation(format!(
            "evaluator returned {found} value(s) for {} objective(s)",
            ind.fitness.objectives().len()
        )));
    }
    Ok(())
}

/// Best evaluated individual of a population (first one on ties).
fn best_of(population: &[Individual]) -> Option<&Individual> {
    population
        .iter()
        .filter(|i| i.is_evaluated())
        .fold(None, |best: Option<&Individual>, ind| match best {
            Some(b) if !ind.fitness.is_better_than(&b.fitness) => Some(b),
            _ => Some(ind),
        })
}

// ============================================================================
// Tests
// ============================================================================
