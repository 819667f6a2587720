//! Path genomes and the random source used by every genetic operator.

use glam::Vec3;
use rand::prelude::*;
use rand_distr::{UnitCircle, UnitSphere};
use serde::{Deserialize, Serialize};

use crate::schema::{PopulationConfig, TranslationMode};

/// Ordered, non-empty sequence of waypoints. Order is traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec3>", into = "Vec<Vec3>")]
pub struct PathGenome {
    waypoints: Vec<Vec3>,
}

impl PathGenome {
    /// Create a genome from waypoints. Fails if `waypoints` is empty.
    pub fn new(waypoints: Vec<Vec3>) -> Result<Self, GenomeError> {
        if waypoints.is_empty() {
            return Err(GenomeError::Empty);
        }
        Ok(Self { waypoints })
    }

    /// Single-waypoint genome.
    pub fn from_start(start: Vec3) -> Self {
        Self {
            waypoints: vec![start],
        }
    }

    /// Build from waypoints already known to be non-empty.
    pub(crate) fn from_nonempty(waypoints: Vec<Vec3>) -> Self {
        debug_assert!(!waypoints.is_empty());
        Self { waypoints }
    }

    /// Number of waypoints (node count). Always at least 1.
    #[inline]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Waypoints in traversal order.
    #[inline]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// First waypoint.
    pub fn first(&self) -> Vec3 {
        self.waypoints[0]
    }

    /// Final waypoint (the path's head).
    pub fn last(&self) -> Vec3 {
        self.waypoints[self.waypoints.len() - 1]
    }

    /// Consecutive waypoint pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.waypoints.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Total length: sum of segment lengths.
    pub fn length(&self) -> f32 {
        self.segments().map(|(a, b)| a.distance(b)).sum()
    }

    /// Insert a waypoint before `index` (`index == len` appends).
    ///
    /// Panics if `index > len`, like `Vec::insert`.
    pub fn insert(&mut self, index: usize, waypoint: Vec3) {
        self.waypoints.insert(index, waypoint);
    }

    /// Remove the waypoint at `index`.
    ///
    /// Returns `None` and leaves the genome untouched if it would become empty
    /// or if `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Option<Vec3> {
        if self.waypoints.len() <= 1 || index >= self.waypoints.len() {
            return None;
        }
        Some(self.waypoints.remove(index))
    }

    /// Displace the waypoint at `index`. Returns false if out of range.
    pub fn translate(&mut self, index: usize, offset: Vec3) -> bool {
        match self.waypoints.get_mut(index) {
            Some(waypoint) => {
                *waypoint += offset;
                true
            }
            None => false,
        }
    }

    /// Apply `f` to every waypoint.
    pub fn map_waypoints(&mut self, mut f: impl FnMut(Vec3) -> Vec3) {
        for waypoint in &mut self.waypoints {
            *waypoint = f(*waypoint);
        }
    }
}

impl TryFrom<Vec<Vec3>> for PathGenome {
    type Error = GenomeError;

    fn try_from(waypoints: Vec<Vec3>) -> Result<Self, Self::Error> {
        Self::new(waypoints)
    }
}

impl From<PathGenome> for Vec<Vec3> {
    fn from(genome: PathGenome) -> Self {
        genome.waypoints
    }
}

/// Genome construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenomeError {
    #[error("A path genome needs at least one waypoint")]
    Empty,
}

/// Random number generator wrapper for genetic operators.
pub struct PathRng {
    rng: StdRng,
}

impl PathRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.rng.r#gen::<f32>()
    }

    /// Uniform draw in `[0, 100)`, compared against percentage probabilities.
    pub fn percent(&mut self) -> f32 {
        self.rng.gen_range(0.0..100.0)
    }

    /// True with `probability` percent.
    pub fn chance(&mut self, probability: f32) -> bool {
        self.percent() < probability
    }

    /// Fair coin.
    pub fn coin(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Uniform draw in `[0, upper)`. `upper` must be positive.
    pub fn below(&mut self, upper: f32) -> f32 {
        self.rng.gen_range(0.0..upper)
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Uniform integer in `[low, high]`.
    pub fn inclusive(&mut self, low: usize, high: usize) -> usize {
        self.rng.gen_range(low..=high)
    }

    /// Per-axis uniform offset in `[-extent, extent]`.
    pub fn box_offset(&mut self, extent: f32) -> Vec3 {
        let extent = extent.abs();
        Vec3::new(
            self.rng.gen_range(-extent..=extent),
            self.rng.gen_range(-extent..=extent),
            self.rng.gen_range(-extent..=extent),
        )
    }

    /// Random offset bounded by `max_offset`, shaped by `mode`.
    pub fn translation_offset(&mut self, mode: TranslationMode, max_offset: f32) -> Vec3 {
        match mode {
            TranslationMode::Box => self.box_offset(max_offset),
            TranslationMode::Sphere => {
                let [x, y, z]: [f32; 3] = UnitSphere.sample(&mut self.rng);
                let magnitude = self.rng.gen_range(0.0..=max_offset.abs());
                Vec3::new(x, y, z) * magnitude
            }
            TranslationMode::Planar => {
                let [x, y]: [f32; 2] = UnitCircle.sample(&mut self.rng);
                let magnitude = self.rng.gen_range(0.0..=max_offset.abs());
                Vec3::new(x, y, 0.0) * magnitude
            }
        }
    }

    /// Random initial genome: a random walk from `start` whose length is
    /// uniform in `[min_nodes, max_nodes]`.
    pub fn random_genome(&mut self, start: Vec3, config: &PopulationConfig) -> PathGenome {
        let min_nodes = config.min_nodes.max(1);
        let max_nodes = config.max_nodes.max(min_nodes);
        let node_count = self.inclusive(min_nodes, max_nodes);

        let mut waypoints = Vec::with_capacity(node_count);
        let mut current = start;
        waypoints.push(current);
        for _ in 1..node_count {
            current += self.box_offset(config.initial_variation);
            waypoints.push(current);
        }

        PathGenome::from_nonempty(waypoints)
    }
}
