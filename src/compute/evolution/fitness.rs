//! Fitness evaluation for path populations.
//!
//! Evaluation runs in two passes. The first queries the geometry provider for
//! each path and records population-wide min/max bounds of node count, final
//! distance to the target and total length. The second normalizes those
//! criteria against the bounds, adds the flat bonuses and applies the penalty
//! multipliers.

use glam::Vec3;

use crate::compute::geometry::{GeometryQuery, QueryError, slope_angle_degrees};
use crate::schema::FitnessConfig;

use super::genome::PathGenome;
use super::individual::{CriterionBlends, Evaluation, PathFlags, PathIndividual};

/// Spreads at or below this are treated as degenerate and blend to 0.
const NORMALIZATION_EPSILON: f32 = 0.1;

/// Evaluates populations and assigns fitness.
pub struct FitnessEvaluator {
    config: FitnessConfig,
}

/// Observed minimum and maximum of one criterion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

/// Population-wide bounds used to normalize each criterion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationBounds {
    pub node_count: Bounds<usize>,
    pub distance_to_target: Bounds<f32>,
    pub path_length: Bounds<f32>,
}

impl NormalizationBounds {
    fn empty() -> Self {
        Self {
            node_count: Bounds {
                min: usize::MAX,
                max: 0,
            },
            distance_to_target: Bounds {
                min: f32::MAX,
                max: 0.0,
            },
            path_length: Bounds {
                min: f32::MAX,
                max: 0.0,
            },
        }
    }

    fn include(&mut self, scan: &PathScan) {
        self.node_count.min = self.node_count.min.min(scan.node_count);
        self.node_count.max = self.node_count.max.max(scan.node_count);
        self.distance_to_target.min = self.distance_to_target.min.min(scan.distance_to_target);
        self.distance_to_target.max = self.distance_to_target.max.max(scan.distance_to_target);
        self.path_length.min = self.path_length.min.min(scan.path_length);
        self.path_length.max = self.path_length.max.max(scan.path_length);
    }

    /// Normalized criterion scores for one path. Fewer nodes, a closer final
    /// waypoint and a shorter path score higher.
    pub fn blends(
        &self,
        node_count: usize,
        distance_to_target: f32,
        path_length: f32,
    ) -> CriterionBlends {
        let nodes = self.node_count;
        let node_blend = if nodes.min == nodes.max {
            0.0
        } else {
            // Both numerator and denominator are negative or zero: the
            // smallest count maps to 1, the largest to 0.
            ((node_count as f32 - nodes.max as f32) / (nodes.min as f32 - nodes.max as f32))
                .clamp(0.0, 1.0)
        };

        CriterionBlends {
            node_count: node_blend,
            proximity: blend(distance_to_target, self.distance_to_target),
            length: blend(path_length, self.path_length),
        }
    }
}

/// `(value - max) / (min - max)`, or 0 when the spread is degenerate.
fn blend(value: f32, bounds: Bounds<f32>) -> f32 {
    let spread = bounds.min - bounds.max;
    if spread.abs() <= NORMALIZATION_EPSILON {
        return 0.0;
    }
    ((value - bounds.max) / spread).clamp(0.0, 1.0)
}

/// Population-wide results of an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationAggregates {
    pub total_fitness: f32,
    pub average_fitness: f32,
    pub average_node_count: f32,
    /// Sum of all weights.
    pub maximum_fitness: f32,
    /// `average_fitness / maximum_fitness`, 0 if the maximum is 0.
    pub fitness_factor: f32,
    pub bounds: NormalizationBounds,
}

/// Raw per-path measurements from the first pass.
#[derive(Debug, Clone, Copy)]
struct PathScan {
    flags: PathFlags,
    node_count: usize,
    distance_to_target: f32,
    path_length: f32,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator.
    pub fn new(config: FitnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitnessConfig {
        &self.config
    }

    /// Evaluate every individual, then sort the population by descending fitness.
    ///
    /// Returns `None` without touching anything if the population is empty.
    pub fn evaluate<Q: GeometryQuery + ?Sized>(
        &self,
        population: &mut [PathIndividual],
        target: Vec3,
        query: &Q,
    ) -> Option<PopulationAggregates> {
        if population.is_empty() {
            return None;
        }

        let mut bounds = NormalizationBounds::empty();
        let mut scans = Vec::with_capacity(population.len());

        for individual in population.iter_mut() {
            if self.config.snap_to_terrain {
                individual
                    .genome_mut()
                    .map_waypoints(|point| query.snap_to_terrain(point).unwrap_or(point));
            }

            let scan = self.scan(individual.genome(), target, query);
            bounds.include(&scan);
            scans.push(scan);
        }

        let mut total_fitness = 0.0f32;
        let mut total_nodes = 0usize;

        for (individual, scan) in population.iter_mut().zip(&scans) {
            let evaluation = self.score(scan, &bounds);
            total_fitness += evaluation.fitness;
            total_nodes += scan.node_count;
            individual.set_evaluation(evaluation);
        }

        population.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

        let count = population.len() as f32;
        let average_fitness = total_fitness / count;
        let maximum_fitness = self.config.weights.maximum_fitness();
        let fitness_factor = if maximum_fitness > 0.0 {
            average_fitness / maximum_fitness
        } else {
            0.0
        };

        Some(PopulationAggregates {
            total_fitness,
            average_fitness,
            average_node_count: total_nodes as f32 / count,
            maximum_fitness,
            fitness_factor,
            bounds,
        })
    }

    /// Product of the penalty multipliers that apply to `flags`.
    pub fn penalty_multiplier(&self, flags: &PathFlags) -> f32 {
        let penalties = &self.config.penalties;
        let mut multiplier = 1.0;
        if flags.in_obstacle {
            multiplier *= penalties.obstacle_hit;
        }
        if flags.slope_too_intense {
            multiplier *= penalties.slope_too_intense;
        }
        if flags.through_terrain {
            multiplier *= penalties.terrain;
        }
        multiplier
    }

    fn scan<Q: GeometryQuery + ?Sized>(
        &self,
        genome: &PathGenome,
        target: Vec3,
        query: &Q,
    ) -> PathScan {
        let mut flags = PathFlags::default();

        for (from, to) in genome.segments() {
            if assume_clear(query.segment_blocked(from, to), "obstacle") {
                flags.in_obstacle = true;
            }
            if assume_clear(query.segment_in_terrain(from, to), "terrain") {
                flags.through_terrain = true;
            }
            if slope_angle_degrees(from, to) > self.config.max_slope_angle {
                flags.slope_too_intense = true;
            }
        }

        let head = genome.last();
        flags.can_see_target = query.has_line_of_sight(head, target).unwrap_or_else(|err| {
            log::debug!("Line of sight query failed, assuming clear: {err}");
            true
        });

        let distance_to_target = head.distance(target);
        flags.reached_target = distance_to_target < self.config.capture_radius;

        PathScan {
            flags,
            node_count: genome.len(),
            distance_to_target,
            path_length: genome.length(),
        }
    }

    fn score(&self, scan: &PathScan, bounds: &NormalizationBounds) -> Evaluation {
        let weights = &self.config.weights;
        let blends = bounds.blends(scan.node_count, scan.distance_to_target, scan.path_length);

        let mut raw_score = weights.node_count * blends.node_count
            + weights.proximity * blends.proximity
            + weights.length * blends.length
            + weights.slope;
        if scan.flags.can_see_target {
            raw_score += weights.line_of_sight;
        }
        if scan.flags.reached_target {
            raw_score += weights.target_reached;
        }

        Evaluation {
            fitness: raw_score * self.penalty_multiplier(&scan.flags),
            raw_score,
            flags: scan.flags,
            blends,
            node_count: scan.node_count,
            distance_to_target: scan.distance_to_target,
            path_length: scan.path_length,
        }
    }
}

/// Provider failures count as "no intersection".
fn assume_clear(result: Result<bool, QueryError>, what: &str) -> bool {
    result.unwrap_or_else(|err| {
        log::debug!("{what} query failed, assuming no intersection: {err}");
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::geometry::{Aabb, ObstacleField, OpenSpace};
    use crate::compute::evolution::PathRng;
    use crate::schema::{FitnessWeights, PenaltyMultipliers, PopulationConfig};
    use proptest::prelude::*;

    fn individual(points: &[Vec3]) -> PathIndividual {
        PathIndividual::new(PathGenome::new(points.to_vec()).unwrap())
    }

    /// Straight path along X from the origin to `end`, split into `nodes` waypoints.
    fn straight(nodes: usize, end: f32) -> PathIndividual {
        let step = end / (nodes - 1) as f32;
        let points: Vec<Vec3> = (0..nodes)
            .map(|i| Vec3::new(i as f32 * step, 0.0, 0.0))
            .collect();
        individual(&points)
    }

    fn evaluator() -> FitnessEvaluator {
        FitnessEvaluator::new(FitnessConfig::default())
    }

    #[test]
    fn test_empty_population_is_noop() {
        let mut population: Vec<PathIndividual> = Vec::new();
        assert!(evaluator().evaluate(&mut population, Vec3::ZERO, &OpenSpace).is_none());
    }

    #[test]
    fn test_node_blend_rewards_fewer_nodes() {
        // Same endpoints and length; only the node count differs.
        let mut population = vec![
            straight(3, 300.0),
            straight(5, 300.0),
            straight(3, 300.0),
            straight(7, 300.0),
        ];
        let target = Vec3::new(1000.0, 0.0, 0.0);

        evaluator()
            .evaluate(&mut population, target, &OpenSpace)
            .unwrap();

        let blends: Vec<(usize, f32)> = population
            .iter()
            .map(|p| (p.node_count(), p.evaluation().unwrap().blends.node_count))
            .collect();

        assert_eq!(blends[0].0, 3);
        assert_eq!(blends[1].0, 3);
        assert_eq!(blends[0].1, 1.0);
        assert_eq!(blends[1].1, 1.0);
        assert_eq!(population[0].fitness(), population[1].fitness());

        assert_eq!(blends[2], (5, 0.5));
        assert_eq!(blends[3], (7, 0.0));
        assert!(population[1].fitness() > population[2].fitness());
        assert!(population[2].fitness() > population[3].fitness());

        // Proximity and length are degenerate here.
        let evaluation = population[0].evaluation().unwrap();
        assert_eq!(evaluation.blends.proximity, 0.0);
        assert_eq!(evaluation.blends.length, 0.0);
    }

    #[test]
    fn test_capture_radius() {
        let target = Vec3::new(1000.0, 0.0, 0.0);
        let evaluator = evaluator();

        let mut near = vec![individual(&[Vec3::ZERO, Vec3::new(950.0, 0.0, 0.0)])];
        evaluator.evaluate(&mut near, target, &OpenSpace).unwrap();
        assert!(near[0].flags().reached_target);

        let mut far = vec![individual(&[Vec3::ZERO, Vec3::new(850.0, 0.0, 0.0)])];
        evaluator.evaluate(&mut far, target, &OpenSpace).unwrap();
        assert!(!far[0].flags().reached_target);
    }

    #[test]
    fn test_single_individual_scores_flat_terms_only() {
        let target = Vec3::new(10.0, 0.0, 0.0);
        let mut population = vec![individual(&[Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)])];
        let aggregates = evaluator()
            .evaluate(&mut population, target, &OpenSpace)
            .unwrap();

        // Slope constant + line of sight + target reached.
        assert_eq!(population[0].fitness(), 300.0);
        assert_eq!(aggregates.total_fitness, 300.0);
        assert_eq!(aggregates.maximum_fitness, 600.0);
        assert!((aggregates.fitness_factor - 0.5).abs() < 1e-6);
        assert_eq!(aggregates.average_node_count, 2.0);
    }

    #[test]
    fn test_penalties_compound() {
        let config = FitnessConfig {
            weights: FitnessWeights::default(),
            penalties: PenaltyMultipliers {
                obstacle_hit: 0.5,
                slope_too_intense: 0.4,
                terrain: 0.2,
            },
            max_slope_angle: 30.0,
            ..Default::default()
        };
        let evaluator = FitnessEvaluator::new(config);
        let world = ObstacleField::with_ground(0.0).with_obstacle(Aabb::new(
            Vec3::new(40.0, -10.0, 0.0),
            Vec3::new(60.0, 10.0, 100.0),
        ));
        let target = Vec3::new(5000.0, 0.0, 10.0);

        let mut population = vec![
            // Clean
            individual(&[Vec3::new(0.0, 50.0, 10.0), Vec3::new(100.0, 50.0, 10.0)]),
            // Through the obstacle
            individual(&[Vec3::new(0.0, 0.0, 10.0), Vec3::new(100.0, 0.0, 10.0)]),
            // Through the obstacle, steep, and underground
            individual(&[Vec3::new(30.0, 0.0, 60.0), Vec3::new(50.0, 0.0, -10.0)]),
        ];

        evaluator.evaluate(&mut population, target, &world).unwrap();

        for path in &population {
            let evaluation = path.evaluation().unwrap();
            let flags = evaluation.flags;
            let mut expected = evaluation.raw_score;
            if flags.in_obstacle {
                expected *= 0.5;
            }
            if flags.slope_too_intense {
                expected *= 0.4;
            }
            if flags.through_terrain {
                expected *= 0.2;
            }
            assert!((evaluation.fitness - expected).abs() < 1e-4);
        }

        let worst = population
            .iter()
            .find(|p| {
                let flags = p.flags();
                flags.in_obstacle && flags.slope_too_intense && flags.through_terrain
            })
            .unwrap()
            .evaluation()
            .unwrap();
        assert!((worst.fitness - worst.raw_score * 0.5 * 0.4 * 0.2).abs() < 1e-4);

        let clean = population
            .iter()
            .find(|p| !p.flags().is_penalized())
            .unwrap()
            .evaluation()
            .unwrap();
        assert_eq!(clean.fitness, clean.raw_score);
    }

    #[test]
    fn test_reevaluation_is_idempotent() {
        let world = ObstacleField::with_ground(0.0)
            .with_obstacle(Aabb::new(Vec3::new(20.0, -5.0, 0.0), Vec3::new(30.0, 5.0, 20.0)));
        let target = Vec3::new(200.0, 0.0, 5.0);
        let mut rng = PathRng::new(11);
        let config = PopulationConfig {
            size: 12,
            min_nodes: 2,
            max_nodes: 9,
            initial_variation: 30.0,
        };
        let mut population: Vec<PathIndividual> = (0..12)
            .map(|_| PathIndividual::new(rng.random_genome(Vec3::new(0.0, 0.0, 5.0), &config)))
            .collect();

        let evaluator = evaluator();
        evaluator.evaluate(&mut population, target, &world).unwrap();

        let first = evaluator.evaluate(&mut population, target, &world).unwrap();
        let snapshot: Vec<(PathGenome, Evaluation)> = population
            .iter()
            .map(|p| (p.genome().clone(), *p.evaluation().unwrap()))
            .collect();

        let second = evaluator.evaluate(&mut population, target, &world).unwrap();
        let again: Vec<(PathGenome, Evaluation)> = population
            .iter()
            .map(|p| (p.genome().clone(), *p.evaluation().unwrap()))
            .collect();

        assert_eq!(first, second);
        assert_eq!(snapshot, again);
    }

    struct FailingQuery;

    impl GeometryQuery for FailingQuery {
        fn segment_blocked(&self, _from: Vec3, _to: Vec3) -> Result<bool, QueryError> {
            Err(QueryError::Unavailable("offline".into()))
        }

        fn segment_in_terrain(&self, _from: Vec3, _to: Vec3) -> Result<bool, QueryError> {
            Err(QueryError::Unavailable("offline".into()))
        }

        fn has_line_of_sight(&self, _point: Vec3, _target: Vec3) -> Result<bool, QueryError> {
            Err(QueryError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_query_failures_mean_no_intersection() {
        let mut population = vec![individual(&[Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)])];
        evaluator()
            .evaluate(&mut population, Vec3::new(500.0, 0.0, 0.0), &FailingQuery)
            .unwrap();

        let flags = population[0].flags();
        assert!(!flags.in_obstacle);
        assert!(!flags.through_terrain);
        assert!(flags.can_see_target);
    }

    #[test]
    fn test_snap_to_terrain() {
        let config = FitnessConfig {
            snap_to_terrain: true,
            ..Default::default()
        };
        let world = ObstacleField::with_ground(2.0);
        let mut population = vec![individual(&[
            Vec3::new(0.0, 0.0, 40.0),
            Vec3::new(10.0, 0.0, -40.0),
        ])];

        FitnessEvaluator::new(config)
            .evaluate(&mut population, Vec3::new(20.0, 0.0, 2.0), &world)
            .unwrap();

        assert!(population[0].genome().waypoints().iter().all(|p| p.z == 2.0));
        let flags = population[0].flags();
        assert!(!flags.slope_too_intense);
        assert!(!flags.through_terrain);
    }

    #[test]
    fn test_blend_degenerate_spread() {
        let bounds = Bounds {
            min: 10.0,
            max: 10.05,
        };
        assert_eq!(blend(10.0, bounds), 0.0);

        let bounds = Bounds { min: 0.0, max: 10.0 };
        assert_eq!(blend(0.0, bounds), 1.0);
        assert_eq!(blend(10.0, bounds), 0.0);
        assert!((blend(2.5, bounds) - 0.75).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_fitness_non_negative_and_sorted(seed in any::<u64>(), size in 1usize..20) {
            let world = ObstacleField::with_ground(0.0)
                .with_obstacle(Aabb::new(Vec3::new(10.0, -10.0, -5.0), Vec3::new(20.0, 10.0, 15.0)));
            let mut rng = PathRng::new(seed);
            let config = PopulationConfig {
                size: 2,
                min_nodes: 1,
                max_nodes: 10,
                initial_variation: 25.0,
            };
            let mut population: Vec<PathIndividual> = (0..size)
                .map(|_| PathIndividual::new(rng.random_genome(Vec3::new(0.0, 0.0, 1.0), &config)))
                .collect();

            let aggregates = evaluator()
                .evaluate(&mut population, Vec3::new(100.0, 0.0, 1.0), &world)
                .unwrap();

            prop_assert!(population.iter().all(|p| p.fitness() >= 0.0));
            prop_assert!(population.windows(2).all(|w| w[0].fitness() >= w[1].fitness()));
            prop_assert!(aggregates.total_fitness > 0.0);
            for path in &population {
                let blends = path.evaluation().unwrap().blends;
                for value in [blends.node_count, blends.proximity, blends.length] {
                    prop_assert!((0.0..=1.0).contains(&value));
                }
            }
        }
    }
}
