//! Fitness-proportionate (roulette wheel) selection.

use std::ops::Deref;

use super::genome::PathRng;
use super::individual::PathIndividual;

/// Parents sampled for one generation, borrowed from the current population.
#[derive(Debug, Clone, Default)]
pub struct MatingPool<'a> {
    parents: Vec<&'a PathIndividual>,
}

impl<'a> MatingPool<'a> {
    pub fn new(parents: Vec<&'a PathIndividual>) -> Self {
        Self { parents }
    }

    /// Iterate over consecutive mating pairs. A trailing odd parent is not included.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a PathIndividual, &'a PathIndividual)> + '_ {
        self.parents.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// The unpaired last parent of an odd-sized pool.
    pub fn unpaired(&self) -> Option<&'a PathIndividual> {
        if self.parents.len() % 2 == 1 {
            self.parents.last().copied()
        } else {
            None
        }
    }
}

impl<'a> Deref for MatingPool<'a> {
    type Target = [&'a PathIndividual];

    fn deref(&self) -> &Self::Target {
        &self.parents
    }
}

/// Sample `count` parents with replacement, each with probability proportional
/// to its share of `total_fitness`.
///
/// Walks the population in its current order, so a descending sort puts the
/// likeliest picks first.
pub fn select_mating_pool<'a>(
    population: &'a [PathIndividual],
    total_fitness: f32,
    count: usize,
    rng: &mut PathRng,
) -> Result<MatingPool<'a>, SelectionError> {
    if population.is_empty() {
        return Err(SelectionError::EmptyPopulation);
    }
    if !total_fitness.is_finite() || total_fitness <= 0.0 {
        return Err(SelectionError::DegenerateFitness {
            total: total_fitness,
        });
    }

    // Round-off can leave the running sum just short of a draw close to 1.
    let fallback = population
        .iter()
        .rposition(|individual| individual.fitness() > 0.0)
        .unwrap_or(population.len() - 1);

    let mut parents = Vec::with_capacity(count);
    for _ in 0..count {
        let r = rng.unit();
        let mut accumulated = 0.0f32;
        let mut chosen = fallback;

        for (index, individual) in population.iter().enumerate() {
            accumulated += individual.fitness() / total_fitness;
            if accumulated >= r {
                chosen = index;
                break;
            }
        }

        parents.push(&population[chosen]);
    }

    Ok(MatingPool::new(parents))
}

/// Selection precondition failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("Cannot select from an empty population")]
    EmptyPopulation,
    #[error("Total fitness must be positive, got {total}")]
    DegenerateFitness { total: f32 },
}
