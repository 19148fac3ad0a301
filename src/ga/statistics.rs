//! Per-generation statistics.
//!
//! [`Statistics`] reduces one objective's raw values over a population into a
//! [`GenerationRecord`]; the [`Logbook`] keeps one record per completed
//! generation, generation 0 (the initial population) first.

use super::types::Individual;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Aggregate over a generation's fitness values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Reducer {
    Min,
    Max,
    Mean,
    /// Population standard deviation.
    Std,
}

impl Reducer {
    pub fn name(self) -> &'static str {
        match self {
            Reducer::Min => "min",
            Reducer::Max => "max",
            Reducer::Mean => "mean",
            Reducer::Std => "std",
        }
    }

    /// Reduces `values`. Returns NaN for an empty slice.
    pub fn reduce(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        match self {
            Reducer::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reducer::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reducer::Mean => mean(values),
            Reducer::Std => {
                let m = mean(values);
                let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
                var.sqrt()
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Which reducers to record, over which objective.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Statistics {
    /// Index of the fitness component to reduce.
    pub objective: usize,
    pub reducers: Vec<Reducer>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            objective: 0,
            reducers: vec![Reducer::Min, Reducer::Max, Reducer::Mean, Reducer::Std],
        }
    }
}

impl Statistics {
    pub fn new(reducers: Vec<Reducer>) -> Self {
        Self {
            objective: 0,
            reducers,
        }
    }

    pub fn with_objective(mut self, objective: usize) -> Self {
        self.objective = objective;
        self
    }

    /// Applies every reducer to the evaluated individuals' values.
    pub fn compile(&self, population: &[Individual]) -> BTreeMap<Reducer, f64> {
        let values: Vec<f64> = population
            .iter()
            .filter_map(|ind| ind.fitness.values().get(self.objective).copied())
            .collect();
        self.reducers
            .iter()
            .map(|&r| (r, r.reduce(&values)))
            .collect()
    }
}

/// Statistics of one completed generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationRecord {
    /// 0 for the initial population.
    pub generation: usize,
    /// Fitness evaluations performed to produce this generation.
    pub evaluations: usize,
    pub values: BTreeMap<Reducer, f64>,
}

impl GenerationRecord {
    pub fn get(&self, reducer: Reducer) -> Option<f64> {
        self.values.get(&reducer).copied()
    }
}

/// Ordered log of generation records.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Logbook {
    records: Vec<GenerationRecord>,
}

impl Logbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: GenerationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&GenerationRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GenerationRecord> {
        self.records.iter()
    }

    /// One column of the log, e.g. the max fitness of every generation.
    ///
    /// Generations that did not record `reducer` yield NaN.
    pub fn select(&self, reducer: Reducer) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.get(reducer).unwrap_or(f64::NAN))
            .collect()
    }

    /// Total fitness evaluations across all recorded generations.
    pub fn total_evaluations(&self) -> usize {
        self.records.iter().map(|r| r.evaluations).sum()
    }
}

impl<'a> IntoIterator for &'a Logbook {
    type Item = &'a GenerationRecord;
    type IntoIter = std::slice::Iter<'a, GenerationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
