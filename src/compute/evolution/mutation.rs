//! Mutation operators: translate, insert and delete waypoints.

use crate::schema::{
    InsertionMode, MutationConfig, MutationCounts, MutationSelection, WaypointPolicy,
};

use super::genome::{PathGenome, PathRng};
use super::individual::PathIndividual;

/// A single mutation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Translate,
    Insert,
    Delete,
}

/// Applies mutation operators to a population in place.
pub struct Mutator {
    config: MutationConfig,
}

impl Mutator {
    pub fn new(config: MutationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    /// Mutate each individual with the configured probability.
    ///
    /// Returns how many operators actually changed a genome.
    pub fn mutate(&self, population: &mut [PathIndividual], rng: &mut PathRng) -> MutationCounts {
        let mut counts = MutationCounts::default();

        for individual in population.iter_mut() {
            if !rng.chance(self.config.probability) {
                continue;
            }

            for kind in self.pick_operators(rng) {
                if self.apply(kind, individual, rng) {
                    match kind {
                        MutationKind::Translate => counts.translations += 1,
                        MutationKind::Insert => counts.insertions += 1,
                        MutationKind::Delete => counts.deletions += 1,
                    }
                }
            }
        }

        counts
    }

    fn pick_operators(&self, rng: &mut PathRng) -> Vec<MutationKind> {
        let bands = [
            (MutationKind::Translate, self.config.translate_probability),
            (MutationKind::Insert, self.config.insert_probability),
            (MutationKind::Delete, self.config.delete_probability),
        ];

        match self.config.selection {
            MutationSelection::Independent => bands
                .into_iter()
                .filter(|&(_, probability)| rng.chance(probability))
                .map(|(kind, _)| kind)
                .collect(),
            MutationSelection::AggregateSelectOne => {
                let total: f32 = bands.iter().map(|&(_, p)| p).sum();
                if total <= 0.0 {
                    return Vec::new();
                }

                let r = rng.below(total);
                let mut accumulated = 0.0;
                for (kind, probability) in bands {
                    accumulated += probability;
                    if r < accumulated {
                        return vec![kind];
                    }
                }
                // r < total, so only round-off reaches here.
                bands
                    .iter()
                    .rev()
                    .find(|&&(_, p)| p > 0.0)
                    .map(|&(kind, _)| vec![kind])
                    .unwrap_or_default()
            }
        }
    }

    /// Apply one operator. Returns false if the genome was left unchanged.
    fn apply(&self, kind: MutationKind, individual: &mut PathIndividual, rng: &mut PathRng) -> bool {
        match kind {
            MutationKind::Translate => {
                let Some(index) = self.translation_index(individual.genome(), rng) else {
                    return false;
                };
                let translation = &self.config.translation;
                let offset = rng.translation_offset(translation.mode, translation.max_offset);
                individual.genome_mut().translate(index, offset)
            }
            MutationKind::Insert => {
                self.insert(individual.genome_mut(), rng);
                true
            }
            MutationKind::Delete => {
                if individual.node_count() <= 1 {
                    return false;
                }
                let index = rng.index(individual.node_count());
                individual.genome_mut().remove(index).is_some()
            }
        }
    }

    fn translation_index(&self, genome: &PathGenome, rng: &mut PathRng) -> Option<usize> {
        let len = genome.len();
        match self.config.translation.target {
            WaypointPolicy::Random => Some(rng.index(len)),
            WaypointPolicy::RandomExceptFirst if len > 1 => Some(1 + rng.index(len - 1)),
            WaypointPolicy::RandomExceptFirst => None,
            WaypointPolicy::Last => Some(len - 1),
        }
    }

    fn insert(&self, genome: &mut PathGenome, rng: &mut PathRng) {
        let jitter = rng.box_offset(self.config.insertion.jitter);

        if genome.len() == 1 || self.config.insertion.mode == InsertionMode::Extend {
            let tail = genome.last() + jitter;
            genome.insert(genome.len(), tail);
            return;
        }

        let index = rng.index(genome.len() - 1);
        let waypoints = genome.waypoints();
        let midpoint = waypoints[index].lerp(waypoints[index + 1], 0.5);
        genome.insert(index + 1, midpoint + jitter);
    }
}
