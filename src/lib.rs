//! Genetic Paths - Evolve 3D waypoint paths toward a target with a genetic algorithm.
//!
//! A population of candidate polylines is re-evaluated and re-bred once per
//! fixed time interval. Fitness combines node count, proximity to the target,
//! path length, line of sight and slope, penalized when a path hits an
//! obstacle, dives through terrain or climbs too steeply.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, scenario and per-generation statistics types
//! - `compute`: Geometry queries and the evolution engine
//!
//! # Example
//!
//! ```rust,no_run
//! use genetic_paths::{
//!     compute::{
//!         ObstacleField,
//!         evolution::{Anchors, GenerationOrchestrator},
//!     },
//!     schema::EvolutionConfig,
//! };
//! use glam::Vec3;
//!
//! let anchors = Anchors::new(Vec3::ZERO, Vec3::new(300.0, 0.0, 0.0));
//! let mut orchestrator = GenerationOrchestrator::new(
//!     EvolutionConfig::default(),
//!     ObstacleField::with_ground(-5.0),
//!     anchors,
//! )
//! .unwrap();
//!
//! for _ in 0..50 {
//!     let stats = orchestrator.run_generation().unwrap();
//!     println!("Generation {}: {:.2}", stats.generation, stats.average_fitness);
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{Anchors, GenerationOrchestrator, PathGenome, PathIndividual};
pub use compute::{GeometryQuery, ObstacleField};
pub use schema::{EvolutionConfig, GenerationStats, ScenarioConfig};
