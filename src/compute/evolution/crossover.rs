//! Recombination of mating pairs into the next generation's genomes.
//!
//! Parents rarely have the same length. Positions shared by both parents are
//! exchanged by the configured operator; the longer parent's remaining
//! waypoints ("junk DNA") are appended to each offspring with a fixed chance.

use glam::Vec3;

use crate::schema::{CrossoverConfig, CrossoverOperator};

use super::genome::{PathGenome, PathRng};
use super::selection::MatingPool;

/// Offspring of one generation plus how many pairs were crossed over.
#[derive(Debug, Clone, Default)]
pub struct Recombination {
    pub offspring: Vec<PathGenome>,
    pub crossovers: usize,
}

/// Produces offspring genomes from a mating pool.
pub struct Recombiner {
    config: CrossoverConfig,
}

impl Recombiner {
    pub fn new(config: CrossoverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CrossoverConfig {
        &self.config
    }

    /// Pair parents in pool order and produce exactly one offspring per parent.
    pub fn recombine(&self, pool: &MatingPool<'_>, rng: &mut PathRng) -> Recombination {
        let mut offspring = Vec::with_capacity(pool.len());
        let mut crossovers = 0;

        for (a, b) in pool.pairs() {
            if rng.chance(self.config.probability) {
                let (first, second) = self.cross(a.genome(), b.genome(), rng);
                offspring.push(first);
                offspring.push(second);
                crossovers += 1;
            } else {
                offspring.push(a.genome().clone());
                offspring.push(b.genome().clone());
            }
        }

        if let Some(lone) = pool.unpaired() {
            offspring.push(lone.genome().clone());
        }

        Recombination {
            offspring,
            crossovers,
        }
    }

    fn cross(&self, a: &PathGenome, b: &PathGenome, rng: &mut PathRng) -> (PathGenome, PathGenome) {
        match self.config.operator {
            CrossoverOperator::SinglePoint => {
                let shorter = a.len().min(b.len());
                let point = rng.inclusive(0, shorter);
                single_point(a, b, point, self.config.junk_dna_probability, rng)
            }
            CrossoverOperator::Uniform => uniform(a, b, self.config.junk_dna_probability, rng),
        }
    }
}

/// Single-point crossover at `point`.
///
/// Offspring 0 takes the shorter parent's waypoints before `point` and the
/// longer parent's from `point` on; offspring 1 the opposite.
pub fn single_point(
    a: &PathGenome,
    b: &PathGenome,
    point: usize,
    junk_dna_probability: f32,
    rng: &mut PathRng,
) -> (PathGenome, PathGenome) {
    exchange(a, b, junk_dna_probability, rng, |index, _| index < point)
}

/// Uniform crossover: a fair coin decides each shared position.
pub fn uniform(
    a: &PathGenome,
    b: &PathGenome,
    junk_dna_probability: f32,
    rng: &mut PathRng,
) -> (PathGenome, PathGenome) {
    exchange(a, b, junk_dna_probability, rng, |_, rng| rng.coin())
}

/// Shared positions go to offspring 0 from the shorter parent when
/// `from_shorter` holds, otherwise from the longer one. Offspring 1 always
/// takes the other parent's waypoint.
fn exchange(
    a: &PathGenome,
    b: &PathGenome,
    junk_dna_probability: f32,
    rng: &mut PathRng,
    mut from_shorter: impl FnMut(usize, &mut PathRng) -> bool,
) -> (PathGenome, PathGenome) {
    let (shorter, longer) = if a.len() > b.len() { (b, a) } else { (a, b) };
    let shorter = shorter.waypoints();
    let longer = longer.waypoints();

    let mut first: Vec<Vec3> = Vec::with_capacity(longer.len());
    let mut second: Vec<Vec3> = Vec::with_capacity(longer.len());

    for (index, (&s, &l)) in shorter.iter().zip(longer).enumerate() {
        if from_shorter(index, rng) {
            first.push(s);
            second.push(l);
        } else {
            first.push(l);
            second.push(s);
        }
    }

    for &junk in &longer[shorter.len()..] {
        if rng.chance(junk_dna_probability) {
            first.push(junk);
        }
        if rng.chance(junk_dna_probability) {
            second.push(junk);
        }
    }

    // Both parents are non-empty, so the shared prefix is too.
    (
        PathGenome::from_nonempty(first),
        PathGenome::from_nonempty(second),
    )
}
