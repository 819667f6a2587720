//! Configuration types for genetic path evolution.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level evolution configuration.
///
/// Read-only for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Population size and initial genome shape.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Seconds between two generations.
    #[serde(default = "default_generation_interval")]
    pub generation_interval: f32,
    /// Fitness weights, penalties and evaluation settings.
    #[serde(default)]
    pub fitness: FitnessConfig,
    /// Crossover settings.
    #[serde(default)]
    pub crossover: CrossoverConfig,
    /// Mutation settings.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            generation_interval: default_generation_interval(),
            fitness: FitnessConfig::default(),
            crossover: CrossoverConfig::default(),
            mutation: MutationConfig::default(),
            random_seed: None,
        }
    }
}

fn default_generation_interval() -> f32 {
    1.0
}

/// Population settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals. Must be even so the mating pool pairs up.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Minimum waypoint count of an initial genome.
    #[serde(default = "default_min_nodes")]
    pub min_nodes: usize,
    /// Maximum waypoint count of an initial genome.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Per-axis bound of the random step between initial waypoints.
    #[serde(default = "default_initial_variation")]
    pub initial_variation: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            min_nodes: default_min_nodes(),
            max_nodes: default_max_nodes(),
            initial_variation: default_initial_variation(),
        }
    }
}

fn default_population_size() -> usize {
    40
}
fn default_min_nodes() -> usize {
    5
}
fn default_max_nodes() -> usize {
    5
}
fn default_initial_variation() -> f32 {
    40.0
}

/// Fitness evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessConfig {
    /// Criterion weights.
    #[serde(default)]
    pub weights: FitnessWeights,
    /// Multipliers applied when a disqualifying condition is detected.
    #[serde(default)]
    pub penalties: PenaltyMultipliers,
    /// Steepest tolerated segment angle against the horizontal, in degrees.
    #[serde(default = "default_max_slope_angle")]
    pub max_slope_angle: f32,
    /// Distance under which the final waypoint counts as having reached the target.
    #[serde(default = "default_capture_radius")]
    pub capture_radius: f32,
    /// Project waypoints onto the terrain before evaluating them.
    #[serde(default)]
    pub snap_to_terrain: bool,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            weights: FitnessWeights::default(),
            penalties: PenaltyMultipliers::default(),
            max_slope_angle: default_max_slope_angle(),
            capture_radius: default_capture_radius(),
            snap_to_terrain: false,
        }
    }
}

fn default_max_slope_angle() -> f32 {
    45.0
}
fn default_capture_radius() -> f32 {
    100.0
}

/// Weights of the individual fitness criteria.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessWeights {
    /// Fewer waypoints.
    #[serde(default = "default_weight")]
    pub node_count: f32,
    /// Final waypoint closer to the target.
    #[serde(default = "default_weight")]
    pub proximity: f32,
    /// Shorter total path.
    #[serde(default = "default_weight")]
    pub length: f32,
    /// Flat bonus when the final waypoint sees the target.
    #[serde(default = "default_weight")]
    pub line_of_sight: f32,
    /// Flat bonus when the final waypoint is inside the capture radius.
    #[serde(default = "default_weight")]
    pub target_reached: f32,
    /// Constant term added to every raw score.
    #[serde(default = "default_weight")]
    pub slope: f32,
}

impl FitnessWeights {
    /// Sum of all weights: the fitness of a path earning every bonus with no penalty.
    pub fn maximum_fitness(&self) -> f32 {
        self.node_count
            + self.proximity
            + self.length
            + self.line_of_sight
            + self.target_reached
            + self.slope
    }
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            node_count: default_weight(),
            proximity: default_weight(),
            length: default_weight(),
            line_of_sight: default_weight(),
            target_reached: default_weight(),
            slope: default_weight(),
        }
    }
}

fn default_weight() -> f32 {
    100.0
}

/// Penalty multipliers, each in `[0, 1]`. They compound multiplicatively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyMultipliers {
    /// Applied when any segment hits an obstacle.
    #[serde(default = "default_obstacle_penalty")]
    pub obstacle_hit: f32,
    /// Applied when any segment is steeper than the tolerated slope.
    #[serde(default = "default_slope_penalty")]
    pub slope_too_intense: f32,
    /// Applied when any segment passes through terrain.
    #[serde(default = "default_terrain_penalty")]
    pub terrain: f32,
}

impl Default for PenaltyMultipliers {
    fn default() -> Self {
        Self {
            obstacle_hit: default_obstacle_penalty(),
            slope_too_intense: default_slope_penalty(),
            terrain: default_terrain_penalty(),
        }
    }
}

fn default_obstacle_penalty() -> f32 {
    0.1
}
fn default_slope_penalty() -> f32 {
    0.5
}
fn default_terrain_penalty() -> f32 {
    0.25
}

/// Crossover operator selection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CrossoverOperator {
    /// One cut point; waypoints before it come from one parent, after it from the other.
    #[default]
    SinglePoint,
    /// Every position picks its parent with a fair coin.
    Uniform,
}

/// Crossover settings. Probabilities are percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossoverConfig {
    /// Chance (0-100) that a mating pair is crossed over instead of copied.
    #[serde(default = "default_crossover_probability")]
    pub probability: f32,
    /// Operator used for accepted pairs.
    #[serde(default)]
    pub operator: CrossoverOperator,
    /// Chance (0-100) that an offspring carries each junk DNA waypoint.
    #[serde(default = "default_junk_dna_probability")]
    pub junk_dna_probability: f32,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            probability: default_crossover_probability(),
            operator: CrossoverOperator::default(),
            junk_dna_probability: default_junk_dna_probability(),
        }
    }
}

fn default_crossover_probability() -> f32 {
    70.0
}
fn default_junk_dna_probability() -> f32 {
    50.0
}

/// How eligible individuals pick their mutation operators.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum MutationSelection {
    /// Each operator is tested on its own; any subset may fire.
    #[default]
    Independent,
    /// At most one operator fires, chosen in proportion to the three probabilities.
    AggregateSelectOne,
}

/// Displacement shape used by the translation operator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TranslationMode {
    /// Independent uniform offset per axis within `[-max_offset, max_offset]`.
    #[default]
    Box,
    /// Random direction on the unit sphere, magnitude up to `max_offset`.
    Sphere,
    /// Random direction in the XY plane, magnitude up to `max_offset`.
    Planar,
}

/// Which waypoint the translation operator moves.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum WaypointPolicy {
    /// Any waypoint, uniformly.
    #[default]
    Random,
    /// Any waypoint but the first, which stays on the start anchor.
    RandomExceptFirst,
    /// Always the final waypoint.
    Last,
}

/// Translation operator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub mode: TranslationMode,
    /// Largest displacement.
    #[serde(default = "default_max_translation_offset")]
    pub max_offset: f32,
    #[serde(default)]
    pub target: WaypointPolicy,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            mode: TranslationMode::default(),
            max_offset: default_max_translation_offset(),
            target: WaypointPolicy::default(),
        }
    }
}

fn default_max_translation_offset() -> f32 {
    50.0
}

/// Where the insertion operator places a new waypoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum InsertionMode {
    /// Midpoint of a random adjacent pair, plus jitter.
    #[default]
    Midpoint,
    /// After the final waypoint, plus jitter.
    Extend,
}

/// Insertion operator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertionConfig {
    #[serde(default)]
    pub mode: InsertionMode,
    /// Per-axis bound of the random offset added to the inserted waypoint.
    #[serde(default = "default_insertion_jitter")]
    pub jitter: f32,
}

impl Default for InsertionConfig {
    fn default() -> Self {
        Self {
            mode: InsertionMode::default(),
            jitter: default_insertion_jitter(),
        }
    }
}

fn default_insertion_jitter() -> f32 {
    20.0
}

/// Mutation settings. Probabilities are percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Chance (0-100) that an individual is considered for mutation at all.
    #[serde(default = "default_mutation_probability")]
    pub probability: f32,
    #[serde(default = "default_operator_probability")]
    pub translate_probability: f32,
    #[serde(default = "default_operator_probability")]
    pub insert_probability: f32,
    #[serde(default = "default_operator_probability")]
    pub delete_probability: f32,
    #[serde(default)]
    pub selection: MutationSelection,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub insertion: InsertionConfig,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            probability: default_mutation_probability(),
            translate_probability: default_operator_probability(),
            insert_probability: default_operator_probability(),
            delete_probability: default_operator_probability(),
            selection: MutationSelection::default(),
            translation: TranslationConfig::default(),
            insertion: InsertionConfig::default(),
        }
    }
}

fn default_mutation_probability() -> f32 {
    5.0
}
fn default_operator_probability() -> f32 {
    33.333
}

impl EvolutionConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let population = &self.population;
        if population.size < 2 {
            return Err(ConfigError::PopulationTooSmall);
        }
        if population.size % 2 != 0 {
            return Err(ConfigError::OddPopulation(population.size));
        }
        if population.min_nodes == 0 || population.min_nodes > population.max_nodes {
            return Err(ConfigError::InvalidNodeBounds {
                min: population.min_nodes,
                max: population.max_nodes,
            });
        }
        check_non_negative(population.initial_variation, "initial_variation")?;

        if self.generation_interval.is_nan() || self.generation_interval <= 0.0 {
            return Err(ConfigError::InvalidInterval(self.generation_interval));
        }

        let fitness = &self.fitness;
        let weights = &fitness.weights;
        for (name, weight) in [
            ("node_count", weights.node_count),
            ("proximity", weights.proximity),
            ("length", weights.length),
            ("line_of_sight", weights.line_of_sight),
            ("target_reached", weights.target_reached),
            ("slope", weights.slope),
        ] {
            if weight.is_nan() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value: weight });
            }
        }

        let penalties = &fitness.penalties;
        for (name, value) in [
            ("obstacle_hit", penalties.obstacle_hit),
            ("slope_too_intense", penalties.slope_too_intense),
            ("terrain", penalties.terrain),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidPenalty { name, value });
            }
        }

        if !(0.0..=90.0).contains(&fitness.max_slope_angle) {
            return Err(ConfigError::InvalidSlopeAngle(fitness.max_slope_angle));
        }
        check_non_negative(fitness.capture_radius, "capture_radius")?;

        check_percentage(self.crossover.probability, "crossover.probability")?;
        check_percentage(
            self.crossover.junk_dna_probability,
            "crossover.junk_dna_probability",
        )?;

        let mutation = &self.mutation;
        check_percentage(mutation.probability, "mutation.probability")?;
        check_percentage(
            mutation.translate_probability,
            "mutation.translate_probability",
        )?;
        check_percentage(mutation.insert_probability, "mutation.insert_probability")?;
        check_percentage(mutation.delete_probability, "mutation.delete_probability")?;
        check_non_negative(mutation.translation.max_offset, "translation.max_offset")?;
        check_non_negative(mutation.insertion.jitter, "insertion.jitter")?;

        Ok(())
    }
}

fn check_percentage(value: f32, name: &'static str) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

fn check_non_negative(value: f32, name: &'static str) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Population size must be even, got {0}")]
    OddPopulation(usize),
    #[error("Invalid initial node bounds: min {min}, max {max}")]
    InvalidNodeBounds { min: usize, max: usize },
    #[error("Generation interval must be positive, got {0}")]
    InvalidInterval(f32),
    #[error("Weight {name} must be non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f32 },
    #[error("Penalty {name} must be within [0, 1], got {value}")]
    InvalidPenalty { name: &'static str, value: f32 },
    #[error("Maximum slope angle must be within [0, 90] degrees, got {0}")]
    InvalidSlopeAngle(f32),
    #[error("Probability {name} must be a percentage within [0, 100], got {value}")]
    InvalidProbability { name: &'static str, value: f32 },
    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("Scenario tick must be positive and finite, got {0}")]
    InvalidTick(f32),
}

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(#[from] ConfigError),
}
