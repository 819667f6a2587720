//! Compute module - Geometry queries and the path evolution engine.

mod geometry;

pub mod evolution;

pub use geometry::*;
