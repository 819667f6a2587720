//! Display colors for evaluated paths.

use serde::{Deserialize, Serialize};

use super::individual::PathIndividual;

/// RGBA color in 8-bit channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCode {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorCode {
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    /// Color for paths flagged by obstacle, slope or terrain checks.
    pub const INVALID: Self = Self::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Linear blend, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Color every individual by fitness: red for the least fit, green for the
/// fittest, `invalid` for penalized paths. Penalized paths do not stretch the
/// red-green range.
pub fn apply_color_codes(population: &mut [PathIndividual], invalid: ColorCode) {
    let (min, max) = population
        .iter()
        .filter(|individual| !individual.flags().is_penalized())
        .map(PathIndividual::fitness)
        .fold((f32::MAX, f32::MIN), |(lo, hi), f| (lo.min(f), hi.max(f)));
    let spread = max - min;

    for individual in population.iter_mut() {
        individual.color = if individual.flags().is_penalized() {
            invalid
        } else if spread > 0.0 {
            ColorCode::RED.lerp(ColorCode::GREEN, (individual.fitness() - min) / spread)
        } else {
            ColorCode::GREEN
        };
    }
}

/// Receives the freshly evaluated and colored population after each generation.
pub trait VisualizationSink {
    fn on_population(&mut self, population: &[PathIndividual]);
}

impl<F: FnMut(&[PathIndividual])> VisualizationSink for F {
    fn on_population(&mut self, population: &[PathIndividual]) {
        self(population)
    }
}
