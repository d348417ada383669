//! Ray representation for 3D ray tracing.
//!
//! A ray is defined as r(t) = origin + t * direction, representing a semi-infinite
//! line in 3D space used for intersection testing.

use glam::Vec3A;

/// Tolerance for the unit-direction invariant, scaled like the float epsilon.
const DIRECTION_TOLERANCE: f32 = 10.0 * f32::EPSILON;

/// Ray in 3D space defined by origin and direction.
///
/// Mathematical representation: r(t) = origin + t * direction
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Starting point of the ray in world coordinates.
    ///
    /// This represents the ray's origin, typically the camera position for
    /// primary rays or a surface point for secondary rays.
    pub origin: Vec3A,

    /// Direction vector of the ray.
    ///
    /// The integrators require a unit direction so that intersection
    /// distances are parametric lengths; rays that violate this yield
    /// black rather than propagating garbage radiance.
    pub direction: Vec3A,
}

impl Ray {
    /// Create a new ray with origin and direction.
    pub fn new(origin: Vec3A, direction: Vec3A) -> Self {
        Self { origin, direction }
    }

    /// Compute a point at parameter t along the ray.
    ///
    /// Returns r(t) = origin + t * direction.
    pub fn at(&self, t: f32) -> Vec3A {
        self.origin + t * self.direction
    }

    /// Whether the direction length is within tolerance of 1.
    pub fn has_unit_direction(&self) -> bool {
        (self.direction.length_squared() - 1.0).abs() <= DIRECTION_TOLERANCE
    }

    /// The same ray advanced a small distance along its own direction.
    ///
    /// Removes spurious self-misses right at a surface without changing
    /// which primitives the ray can reach.
    pub fn advanced(&self, distance: f32) -> Self {
        Self::new(self.origin + distance * self.direction, self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_along_ray() {
        let r = Ray::new(Vec3A::new(1.0, 0.0, 0.0), Vec3A::new(0.0, 1.0, 0.0));
        assert_eq!(r.at(2.0), Vec3A::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn unit_direction_check() {
        let unit = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, 1.0));
        assert!(unit.has_unit_direction());

        let short = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, 0.5));
        assert!(!short.has_unit_direction());

        let zero = Ray::new(Vec3A::ZERO, Vec3A::ZERO);
        assert!(!zero.has_unit_direction());
    }
}
