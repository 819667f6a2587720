//! Scenario files: an evolution configuration placed in a concrete world.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{ConfigError, EvolutionConfig, LoadError};
use crate::compute::{Aabb, ObstacleField};

/// Everything the CLI needs to run an evolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub evolution: EvolutionConfig,
    /// Where every path begins.
    pub start: Vec3,
    /// Where paths should end.
    pub target: Vec3,
    #[serde(default)]
    pub world: ObstacleField,
    /// Simulated seconds per tick.
    #[serde(default = "default_tick")]
    pub tick: f32,
}

fn default_tick() -> f32 {
    1.0 / 60.0
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            evolution: EvolutionConfig::default(),
            start: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::new(400.0, 0.0, 10.0),
            world: ObstacleField::with_ground(0.0).with_obstacle(Aabb::new(
                Vec3::new(180.0, -60.0, 0.0),
                Vec3::new(220.0, 60.0, 120.0),
            )),
            tick: default_tick(),
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario from JSON and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path)?;
        let scenario: Self = serde_json::from_str(&content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Validate the evolution settings and the simulated tick length.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evolution.validate()?;
        if !self.tick.is_finite() || self.tick <= 0.0 {
            return Err(ConfigError::InvalidTick(self.tick));
        }
        Ok(())
    }
}
