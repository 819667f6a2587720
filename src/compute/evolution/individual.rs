//! Individuals: a genome plus the snapshot of its latest evaluation.

use serde::{Deserialize, Serialize};

use super::genome::PathGenome;
use super::visualization::ColorCode;

/// Conditions detected while evaluating a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFlags {
    /// A segment intersects an obstacle.
    pub in_obstacle: bool,
    /// A segment passes through terrain.
    pub through_terrain: bool,
    /// A segment is steeper than the tolerated slope.
    pub slope_too_intense: bool,
    /// The final waypoint has line of sight to the target.
    pub can_see_target: bool,
    /// The final waypoint is within the capture radius.
    pub reached_target: bool,
}

impl PathFlags {
    /// True if any penalized condition was detected.
    pub fn is_penalized(&self) -> bool {
        self.in_obstacle || self.through_terrain || self.slope_too_intense
    }
}

/// Normalized per-criterion scores in `[0, 1]`. Higher is better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionBlends {
    pub node_count: f32,
    pub proximity: f32,
    pub length: f32,
}

/// Result of one evaluation pass for one individual.
///
/// Built fresh every pass; never updated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Raw score after penalties.
    pub fitness: f32,
    /// Weighted score before penalties.
    pub raw_score: f32,
    pub flags: PathFlags,
    pub blends: CriterionBlends,
    pub node_count: usize,
    /// Distance from the final waypoint to the target.
    pub distance_to_target: f32,
    /// Sum of segment lengths.
    pub path_length: f32,
}

/// A candidate path in the population.
#[derive(Debug, Clone)]
pub struct PathIndividual {
    genome: PathGenome,
    evaluation: Option<Evaluation>,
    /// Display color, written by the visualization step only.
    pub color: ColorCode,
}

impl PathIndividual {
    /// Create an unevaluated individual.
    pub fn new(genome: PathGenome) -> Self {
        Self {
            genome,
            evaluation: None,
            color: ColorCode::default(),
        }
    }

    pub fn genome(&self) -> &PathGenome {
        &self.genome
    }

    /// Mutable genome access. Discards the now stale evaluation.
    pub fn genome_mut(&mut self) -> &mut PathGenome {
        self.evaluation = None;
        &mut self.genome
    }

    pub fn into_genome(self) -> PathGenome {
        self.genome
    }

    /// Latest evaluation, if the genome has not changed since.
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub(crate) fn set_evaluation(&mut self, evaluation: Evaluation) {
        self.evaluation = Some(evaluation);
    }

    /// Fitness of the latest evaluation, 0 if unevaluated.
    pub fn fitness(&self) -> f32 {
        self.evaluation.map_or(0.0, |e| e.fitness)
    }

    /// Flags of the latest evaluation, all clear if unevaluated.
    pub fn flags(&self) -> PathFlags {
        self.evaluation.map(|e| e.flags).unwrap_or_default()
    }

    /// Number of waypoints.
    pub fn node_count(&self) -> usize {
        self.genome.len()
    }
}

/// Creates and disposes of individuals on behalf of the orchestrator.
///
/// Host integrations hook in here to spawn or despawn their own path objects.
pub trait PathFactory {
    /// Create an individual around `genome`.
    fn create(&mut self, genome: PathGenome) -> PathIndividual {
        PathIndividual::new(genome)
    }

    /// Dispose of an individual no longer referenced by any population.
    fn destroy(&mut self, _individual: PathIndividual) {}
}

/// Factory with no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathFactory;

impl PathFactory for DefaultPathFactory {}
