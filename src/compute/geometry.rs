//! Geometry queries consumed by fitness evaluation.
//!
//! The evaluator never inspects the world directly. It asks a [`GeometryQuery`]
//! whether segments hit obstacles or terrain and whether a point can see the
//! target. [`ObstacleField`] is a small self-contained world (boxes plus a flat
//! ground plane) used by the CLI, benches and tests.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Errors a query provider may report.
///
/// The evaluator treats every failure as "no intersection".
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("Geometry provider unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous, stateless spatial queries.
pub trait GeometryQuery {
    /// Does the segment `from -> to` intersect an obstacle?
    fn segment_blocked(&self, from: Vec3, to: Vec3) -> Result<bool, QueryError>;

    /// Does the segment `from -> to` pass through terrain?
    fn segment_in_terrain(&self, from: Vec3, to: Vec3) -> Result<bool, QueryError>;

    /// Is `target` visible from `point`?
    fn has_line_of_sight(&self, point: Vec3, target: Vec3) -> Result<bool, QueryError>;

    /// Project a point onto the terrain surface, if there is terrain below or above it.
    fn snap_to_terrain(&self, _point: Vec3) -> Option<Vec3> {
        None
    }
}

impl<T: GeometryQuery + ?Sized> GeometryQuery for &T {
    fn segment_blocked(&self, from: Vec3, to: Vec3) -> Result<bool, QueryError> {
        (**self).segment_blocked(from, to)
    }

    fn segment_in_terrain(&self, from: Vec3, to: Vec3) -> Result<bool, QueryError> {
        (**self).segment_in_terrain(from, to)
    }

    fn has_line_of_sight(&self, point: Vec3, target: Vec3) -> Result<bool, QueryError> {
        (**self).has_line_of_sight(point, target)
    }

    fn snap_to_terrain(&self, point: Vec3) -> Option<Vec3> {
        (**self).snap_to_terrain(point)
    }
}

impl<T: GeometryQuery + ?Sized> GeometryQuery for Box<T> {
    fn segment_blocked(&self, from: Vec3, to: Vec3) -> Result<bool, QueryError> {
        (**self).segment_blocked(from, to)
    }

    fn segment_in_terrain(&self, from: Vec3, to: Vec3) -> Result<bool, QueryError> {
        (**self).segment_in_terrain(from, to)
    }

    fn has_line_of_sight(&self, point: Vec3, target: Vec3) -> Result<bool, QueryError> {
        (**self).has_line_of_sight(point, target)
    }

    fn snap_to_terrain(&self, point: Vec3) -> Option<Vec3> {
        (**self).snap_to_terrain(point)
    }
}

/// Empty world: nothing blocks, nothing is terrain, everything is visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSpace;

impl GeometryQuery for OpenSpace {
    fn segment_blocked(&self, _from: Vec3, _to: Vec3) -> Result<bool, QueryError> {
        Ok(false)
    }

    fn segment_in_terrain(&self, _from: Vec3, _to: Vec3) -> Result<bool, QueryError> {
        Ok(false)
    }

    fn has_line_of_sight(&self, _point: Vec3, _target: Vec3) -> Result<bool, QueryError> {
        Ok(true)
    }
}

/// Axis-aligned box obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from two opposite corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Check if a point lies inside or on the boundary.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test: does the segment `from -> to` touch the box?
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        if self.contains(from) || self.contains(to) {
            return true;
        }

        let direction = to - from;
        let mut t_enter = 0.0f32;
        let mut t_exit = 1.0f32;

        for axis in 0..3 {
            let origin = from[axis];
            let delta = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if delta.abs() < f32::EPSILON {
                // Parallel to this slab
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }

            let inv = 1.0 / delta;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return false;
            }
        }

        true
    }
}

/// World made of box obstacles above an optional flat ground plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleField {
    /// Obstacles that block segments and sight lines.
    #[serde(default)]
    pub obstacles: Vec<Aabb>,
    /// Height of the ground plane. `None` means no terrain.
    #[serde(default)]
    pub ground_height: Option<f32>,
}

impl ObstacleField {
    /// Create a field with a ground plane and no obstacles.
    pub fn with_ground(height: f32) -> Self {
        Self {
            obstacles: Vec::new(),
            ground_height: Some(height),
        }
    }

    /// Add an obstacle.
    pub fn with_obstacle(mut self, obstacle: Aabb) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    fn below_ground(&self, point: Vec3) -> bool {
        self.ground_height.is_some_and(|ground| point.z < ground)
    }
}

impl GeometryQuery for ObstacleField {
    fn segment_blocked(&self, from: Vec3, to: Vec3) -> Result<bool, QueryError> {
        Ok(self
            .obstacles
            .iter()
            .any(|obstacle| obstacle.intersects_segment(from, to)))
    }

    fn segment_in_terrain(&self, from: Vec3, to: Vec3) -> Result<bool, QueryError> {
        // A straight segment dips below a plane only if one of its endpoints does.
        Ok(self.below_ground(from) || self.below_ground(to))
    }

    fn has_line_of_sight(&self, point: Vec3, target: Vec3) -> Result<bool, QueryError> {
        Ok(!self.segment_blocked(point, target)? && !self.segment_in_terrain(point, target)?)
    }

    fn snap_to_terrain(&self, point: Vec3) -> Option<Vec3> {
        self.ground_height
            .map(|ground| Vec3::new(point.x, point.y, ground))
    }
}

/// Angle in degrees between a segment and its projection onto the horizontal plane.
///
/// Zero-length segments have no slope. Vertical segments are 90 degrees.
pub fn slope_angle_degrees(from: Vec3, to: Vec3) -> f32 {
    let direction = to - from;
    if direction.length_squared() < f32::EPSILON {
        return 0.0;
    }

    let horizontal = Vec3::new(direction.x, direction.y, 0.0).normalize_or_zero();
    let dot = direction.normalize().dot(horizontal).clamp(-1.0, 1.0);
    dot.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_aabb_normalizes_corners() {
        let aabb = Aabb::new(Vec3::new(2.0, -1.0, 5.0), Vec3::new(-2.0, 1.0, 0.0));
        assert_eq!(aabb.min, Vec3::new(-2.0, -1.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(2.0, 1.0, 5.0));
        assert!(aabb.contains(Vec3::new(0.0, 0.0, 2.5)));
        assert!(!aabb.contains(Vec3::new(0.0, 0.0, 6.0)));
    }

    #[test]
    fn test_segment_through_box() {
        let aabb = unit_box();
        assert!(aabb.intersects_segment(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)));
        assert!(aabb.intersects_segment(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(5.0, 5.0, 5.0)));
    }

    #[test]
    fn test_segment_missing_box() {
        let aabb = unit_box();
        // Passes above
        assert!(!aabb.intersects_segment(Vec3::new(-5.0, 0.0, 3.0), Vec3::new(5.0, 0.0, 3.0)));
        // Stops short
        assert!(!aabb.intersects_segment(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_segment_inside_box() {
        let aabb = unit_box();
        assert!(aabb.intersects_segment(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)));
        // Degenerate segment resting inside the box
        assert!(aabb.intersects_segment(Vec3::new(0.2, 0.2, 0.2), Vec3::new(0.2, 0.2, 0.2)));
        // Starts inside, leaves through a face
        assert!(aabb.intersects_segment(Vec3::new(0.9, 0.0, 0.0), Vec3::new(9.0, 9.0, 9.0)));
    }

    #[test]
    fn test_obstacle_field_queries() {
        let field = ObstacleField::with_ground(0.0).with_obstacle(Aabb::new(
            Vec3::new(40.0, -10.0, 0.0),
            Vec3::new(60.0, 10.0, 50.0),
        ));

        let a = Vec3::new(0.0, 0.0, 10.0);
        let b = Vec3::new(100.0, 0.0, 10.0);
        assert!(field.segment_blocked(a, b).unwrap());
        assert!(!field.has_line_of_sight(a, b).unwrap());

        let c = Vec3::new(0.0, 50.0, 10.0);
        let d = Vec3::new(100.0, 50.0, 10.0);
        assert!(!field.segment_blocked(c, d).unwrap());
        assert!(field.has_line_of_sight(c, d).unwrap());

        let underground = Vec3::new(100.0, 50.0, -5.0);
        assert!(field.segment_in_terrain(c, underground).unwrap());
        assert!(!field.segment_in_terrain(c, d).unwrap());
    }

    #[test]
    fn test_snap_to_ground() {
        let field = ObstacleField::with_ground(3.0);
        assert_eq!(
            field.snap_to_terrain(Vec3::new(1.0, 2.0, 10.0)),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(OpenSpace.snap_to_terrain(Vec3::ONE), None);
        assert_eq!(ObstacleField::default().snap_to_terrain(Vec3::ONE), None);
    }

    #[test]
    fn test_slope_angle() {
        let origin = Vec3::ZERO;
        assert!(slope_angle_degrees(origin, Vec3::new(10.0, 0.0, 0.0)).abs() < 1e-3);
        assert!((slope_angle_degrees(origin, Vec3::new(10.0, 0.0, 10.0)) - 45.0).abs() < 1e-3);
        assert!((slope_angle_degrees(origin, Vec3::new(0.0, 10.0, -10.0)) - 45.0).abs() < 1e-3);
        assert!((slope_angle_degrees(origin, Vec3::new(0.0, 0.0, 5.0)) - 90.0).abs() < 1e-3);
        assert_eq!(slope_angle_degrees(origin, origin), 0.0);
    }
}
