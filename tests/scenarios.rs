//! End-to-end runs on classic benchmark problems.

use u_evolve::ga::{
    Crossover, EvolutionConfig, EvolutionEngine, FnEvaluator, Genome, Mutation, Operators, Reducer,
    Representation, Selection, Termination,
};
use u_evolve::BoxError;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---- OneMax ----

fn ones(genome: &Genome) -> Result<Vec<f64>, BoxError> {
    let bits = genome.as_bits().ok_or("expected a bit string")?;
    Ok(vec![bits.iter().filter(|&&b| b).count() as f64])
}

type Score = fn(&Genome) -> Result<Vec<f64>, BoxError>;

fn one_max_engine(seed: u64) -> EvolutionEngine<Representation, FnEvaluator<Score>> {
    let config = EvolutionConfig::new(200, 0.9, 0.1, 50, 10, seed).unwrap();
    let operators = Operators::new(
        Selection::Tournament(3),
        Crossover::TwoPoint,
        Mutation::FlipBit { indpb: 1.0 / 100.0 },
    );
    EvolutionEngine::new(
        config,
        operators,
        Representation::Bits { length: 100 },
        FnEvaluator::new(ones as Score),
    )
    .unwrap()
}

#[test]
fn one_max_converges() {
    init_logging();
    let result = one_max_engine(42).run().unwrap();

    assert_eq!(result.termination, Some(Termination::MaxGenerations));
    assert_eq!(result.logbook.len(), 51);
    assert!(result.population.iter().all(|i| i.genome.len() == 100));

    let maxima = result.logbook.select(Reducer::Max);
    for w in maxima.windows(2) {
        assert!(w[1] >= w[0], "best fitness regressed: {maxima:?}");
    }
    let best = result.best().unwrap().fitness.primary().unwrap();
    assert!(best >= 95.0, "expected OneMax near 100, got {best}");
}

#[test]
fn same_seed_same_run() {
    let a = one_max_engine(7).run().unwrap();
    let b = one_max_engine(7).run().unwrap();
    assert_eq!(a.logbook, b.logbook);
    assert_eq!(a.population, b.population);
    assert_eq!(a.hall_of_fame.items(), b.hall_of_fame.items());
}

#[test]
fn hall_of_fame_sorted_best_first() {
    let result = one_max_engine(3).run().unwrap();
    let hof = result.hall_of_fame.items();
    assert_eq!(hof.len(), 10);
    for w in hof.windows(2) {
        assert!(!w[1].fitness.is_better_than(&w[0].fitness));
        assert_ne!(w[0].genome, w[1].genome);
    }
}

// ---- 0/1 knapsack ----

const WEIGHTS: [u32; 5] = [2, 3, 4, 5, 9];
const VALUES: [u32; 5] = [3, 4, 5, 6, 10];
const CAPACITY: u32 = 10;

/// Greedy packing: selected items are taken in order while they fit.
fn knapsack_value(bits: &[bool]) -> u32 {
    let mut weight = 0;
    let mut value = 0;
    for (i, &selected) in bits.iter().enumerate() {
        if selected && weight + WEIGHTS[i] <= CAPACITY {
            weight += WEIGHTS[i];
            value += VALUES[i];
        }
    }
    value
}

#[test]
fn knapsack_finds_exhaustive_optimum() {
    init_logging();
    let optimum = (0u32..1 << 5)
        .map(|mask| {
            let bits: Vec<bool> = (0..5).map(|i| mask & (1 << i) != 0).collect();
            knapsack_value(&bits)
        })
        .max()
        .unwrap();
    assert_eq!(optimum, 13);

    let config = EvolutionConfig::new(50, 0.9, 0.1, 50, 1, 42).unwrap();
    let operators = Operators::new(
        Selection::Tournament(3),
        Crossover::TwoPoint,
        Mutation::FlipBit { indpb: 1.0 / 5.0 },
    );
    let evaluator = FnEvaluator::new(|g: &Genome| {
        let bits = g.as_bits().ok_or("expected a bit string")?;
        Ok(vec![knapsack_value(bits) as f64])
    });
    let result = EvolutionEngine::new(
        config,
        operators,
        Representation::Bits { length: 5 },
        evaluator,
    )
    .unwrap()
    .run()
    .unwrap();

    let best = result.best().unwrap();
    assert_eq!(best.fitness.primary(), Some(optimum as f64));
}

// ---- N-queens ----

/// Number of queen pairs sharing a diagonal. Rows and columns never clash
/// in a permutation encoding.
fn diagonal_violations(positions: &[usize]) -> usize {
    let mut violations = 0;
    for i in 0..positions.len() {
        for j in i + 1..positions.len() {
            if positions[i].abs_diff(positions[j]) == j - i {
                violations += 1;
            }
        }
    }
    violations
}

fn solve_queens(n: usize, seed: u64) -> f64 {
    let config = EvolutionConfig::default()
        .minimize()
        .with_population_size(300)
        .with_max_generations(100)
        .with_hall_of_fame_size(30)
        .with_target_fitness(0.0)
        .with_seed(seed);
    let operators = Operators::new(
        Selection::Tournament(2),
        Crossover::UniformPartiallyMatched { indpb: 2.0 / n as f64 },
        Mutation::ShuffleIndexes { indpb: 1.0 / n as f64 },
    );
    let evaluator = FnEvaluator::new(|g: &Genome| {
        let positions = g.as_permutation().ok_or("expected a permutation")?;
        Ok(vec![diagonal_violations(positions) as f64])
    });

    let result = EvolutionEngine::new(
        config,
        operators,
        Representation::Permutation { length: n },
        evaluator,
    )
    .unwrap()
    .run()
    .unwrap();

    assert!(result
        .population
        .iter()
        .all(|i| i.genome.as_permutation().is_some_and(u_evolve::ga::is_permutation)));
    result.best().unwrap().fitness.primary().unwrap()
}

#[test]
fn eight_queens_mostly_solved() {
    init_logging();
    let solved = (0..20).filter(|&seed| solve_queens(8, seed) == 0.0).count();
    assert!(solved >= 18, "only {solved}/20 seeds solved 8-queens");
}

#[test]
fn diagonal_violations_known_board() {
    // A valid 8-queens solution.
    assert_eq!(diagonal_violations(&[0, 4, 7, 5, 2, 6, 1, 3]), 0);
    assert_eq!(diagonal_violations(&[0, 1, 2, 3]), 6);
}

// ---- Minimization on a continuous landscape ----

#[test]
fn eggholder_improves_within_bounds() {
    let eggholder = FnEvaluator::new(|g: &Genome| {
        let x = g.as_reals().ok_or("expected reals")?;
        let (a, b) = (x[0], x[1]);
        let value = -(b + 47.0) * (b + a / 2.0 + 47.0).abs().sqrt().sin()
            - a * (a - (b + 47.0)).abs().sqrt().sin();
        Ok(vec![value])
    });
    let config = EvolutionConfig::default()
        .minimize()
        .with_population_size(200)
        .with_max_generations(100)
        .with_crossover_rate(0.9)
        .with_mutation_rate(0.5)
        .with_hall_of_fame_size(20)
        .with_seed(42);
    let operators = Operators::new(
        Selection::Tournament(2),
        Crossover::SimulatedBinaryBounded {
            eta: 20.0,
            low: -512.0,
            high: 512.0,
        },
        Mutation::PolynomialBounded {
            eta: 20.0,
            low: -512.0,
            high: 512.0,
            indpb: 0.5,
        },
    );
    let result = EvolutionEngine::new(
        config,
        operators,
        Representation::reals(2, -512.0, 512.0),
        eggholder,
    )
    .unwrap()
    .run()
    .unwrap();

    for ind in &result.population {
        let x = ind.genome.as_reals().unwrap();
        assert!(x.iter().all(|v| (-512.0..=512.0).contains(v)));
    }
    let minima = result.logbook.select(Reducer::Min);
    assert!(minima.windows(2).all(|w| w[1] <= w[0]));
    // The elite is always re-injected, so the final minimum is the best ever.
    let best = result.best().unwrap().fitness.primary().unwrap();
    assert_eq!(minima.last().copied(), Some(best));
    assert!(best <= minima[0]);
}

#[test]
fn incremental_stepping_matches_full_run() {
    let full = one_max_engine(11).run().unwrap();

    let mut engine = one_max_engine(11);
    let records: Vec<_> = engine.generations().collect::<Result<_, _>>().unwrap();
    assert_eq!(records, full.logbook.records());
    assert_eq!(engine.population(), &full.population[..]);
}
