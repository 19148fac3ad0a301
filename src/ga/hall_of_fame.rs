//! Bounded archive of the best individuals ever seen.

use super::types::Individual;

/// Best-first archive of distinct individuals.
///
/// Survives population churn: entries are only displaced by strictly better
/// newcomers. Genomes are deduplicated by equality.
///
/// Insertion is stable: a newcomer with the same fitness as an existing entry
/// is placed after it.
#[derive(Debug, Clone, Default)]
pub struct HallOfFame {
    capacity: usize,
    items: Vec<Individual>,
}

impl HallOfFame {
    /// Creates an empty archive holding at most `capacity` individuals.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity),
        }
    }

    /// Merges evaluated individuals into the archive.
    ///
    /// Unevaluated individuals are ignored.
    pub fn update(&mut self, population: &[Individual]) {
        if self.capacity == 0 {
            return;
        }
        for ind in population.iter().filter(|i| i.is_evaluated()) {
            let qualifies = match self.items.last() {
                Some(worst) if self.items.len() >= self.capacity => {
                    ind.fitness.is_better_than(&worst.fitness)
                }
                _ => true,
            };
            if !qualifies || self.items.iter().any(|h| h.genome == ind.genome) {
                continue;
            }
            if self.items.len() >= self.capacity {
                self.items.pop();
            }
            let pos = self
                .items
                .partition_point(|h| !ind.fitness.is_better_than(&h.fitness));
            self.items.insert(pos, ind.clone());
        }
    }

    /// Archived individuals, best first.
    pub fn items(&self) -> &[Individual] {
        &self.items
    }

    /// The best individual ever seen.
    pub fn best(&self) -> Option<&Individual> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
