//! Genetic evolution of waypoint paths toward a target.
//!
//! A population of [`PathIndividual`]s is bred once per generation interval:
//!
//! - **Fitness** (`fitness`): weighted, population-normalized scoring with
//!   multiplicative penalties for obstacle, slope and terrain hits
//! - **Selection** (`selection`): fitness-proportionate mating pool
//! - **Crossover** (`crossover`): single-point or uniform with junk DNA
//! - **Mutation** (`mutation`): translate, insert and delete waypoints
//! - **Orchestrator** (`orchestrator`): the timed generation loop and sinks
//!
//! # Example
//!
//! ```rust,no_run
//! use genetic_paths::compute::{ObstacleField, Aabb};
//! use genetic_paths::compute::evolution::{Anchors, GenerationOrchestrator, LogStatsSink};
//! use genetic_paths::schema::EvolutionConfig;
//! use glam::Vec3;
//!
//! let world = ObstacleField::with_ground(0.0)
//!     .with_obstacle(Aabb::new(Vec3::new(40.0, -20.0, 0.0), Vec3::new(60.0, 20.0, 80.0)));
//! let anchors = Anchors::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(200.0, 0.0, 10.0));
//!
//! let mut orchestrator = GenerationOrchestrator::new(EvolutionConfig::default(), world, anchors)
//!     .unwrap()
//!     .with_stats_sink(LogStatsSink);
//!
//! // Drive from a frame loop; a generation runs once per configured interval.
//! for _ in 0..600 {
//!     orchestrator.maybe_run_generation(1.0 / 60.0);
//! }
//!
//! if let Some(best) = orchestrator.best() {
//!     println!("Best fitness: {:.2}", best.fitness());
//! }
//! ```

mod crossover;
mod fitness;
mod genome;
mod individual;
mod mutation;
mod orchestrator;
mod selection;
mod visualization;

pub use crossover::{Recombination, Recombiner, single_point, uniform};
pub use fitness::{Bounds, FitnessEvaluator, NormalizationBounds, PopulationAggregates};
pub use genome::{GenomeError, PathGenome, PathRng};
pub use individual::{
    CriterionBlends, DefaultPathFactory, Evaluation, PathFactory, PathFlags, PathIndividual,
};
pub use mutation::{MutationKind, Mutator};
pub use orchestrator::{
    Anchors, GenerationError, GenerationOrchestrator, LogStatsSink, OrchestratorState, StatsSink,
};
pub use selection::{MatingPool, SelectionError, select_mating_pool};
pub use visualization::{ColorCode, VisualizationSink, apply_color_codes};
