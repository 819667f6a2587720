//! Per-generation statistics.

use serde::{Deserialize, Serialize};

/// How many individuals each mutation operator fired on during one generation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationCounts {
    pub translations: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl MutationCounts {
    /// Total number of operator applications.
    pub fn total(&self) -> usize {
        self.translations + self.insertions + self.deletions
    }
}

/// Summary of one completed generation. One instance is emitted per generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationStats {
    /// Zero-based generation index.
    pub generation: u64,
    /// Average fitness of the final (post-mutation) population.
    pub average_fitness: f32,
    /// Theoretical maximum fitness: every bonus earned, no penalty applied.
    pub maximum_fitness: f32,
    /// `average_fitness / maximum_fitness`.
    pub fitness_factor: f32,
    /// Average waypoint count of the final population.
    pub average_node_count: f32,
    /// Number of mating pairs that were crossed over instead of copied.
    pub crossover_count: usize,
    /// Mutation operator applications.
    pub mutations: MutationCounts,
}
