//! Geometric primitives.
//!
//! Triangles use the Möller-Trumbore intersection algorithm, spheres the
//! optimized quadratic formula. Primitives are tagged variants so the
//! intersection loop dispatches with a plain match.

use glam::Vec3A;

use crate::aabb::Aabb;
use crate::random;
use crate::ray::Ray;

/// Intersections closer than this along the ray are rejected as
/// self-intersections.
pub const MIN_HIT_DISTANCE: f32 = f32::EPSILON;

/// A renderable surface.
#[derive(Debug, Clone, Copy)]
pub enum Primitive {
    /// Triangle with a precomputed outward unit normal.
    Triangle {
        /// First vertex.
        v0: Vec3A,
        /// Second vertex.
        v1: Vec3A,
        /// Third vertex.
        v2: Vec3A,
        /// Outward-facing unit normal.
        normal: Vec3A,
    },
    /// Sphere defined by center and radius.
    Sphere {
        /// Center point in world coordinates.
        center: Vec3A,
        /// Radius, always positive.
        radius: f32,
    },
}

impl Primitive {
    /// Create a triangle whose normal follows the counter-clockwise
    /// winding of its vertices.
    pub fn triangle(v0: Vec3A, v1: Vec3A, v2: Vec3A) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize();
        Self::Triangle { v0, v1, v2, normal }
    }

    /// Create a sphere. Non-positive radii are clamped to a small epsilon.
    pub fn sphere(center: Vec3A, radius: f32) -> Self {
        Self::Sphere {
            center,
            radius: radius.max(f32::EPSILON),
        }
    }

    /// Intersect with `ray`, returning the parametric distance of the
    /// closest hit beyond [`MIN_HIT_DISTANCE`].
    ///
    /// With `cull_back_face` set, hits whose outward normal points along
    /// the ray direction are discarded: a triangle seen from behind is
    /// invisible, a sphere only reports its front surface.
    pub fn ray_intersect(&self, ray: &Ray, cull_back_face: bool) -> Option<f32> {
        match *self {
            Self::Triangle { v0, v1, v2, .. } => {
                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                let h = ray.direction.cross(edge2);
                let det = edge1.dot(h);

                // det > 0 means the ray faces the front side.
                if cull_back_face {
                    if det < f32::EPSILON {
                        return None;
                    }
                } else if det.abs() < f32::EPSILON {
                    return None;
                }

                let inv_det = 1.0 / det;
                let s = ray.origin - v0;
                let u = inv_det * s.dot(h);
                if !(0.0..=1.0).contains(&u) {
                    return None;
                }

                let q = s.cross(edge1);
                let v = inv_det * ray.direction.dot(q);
                if v < 0.0 || u + v > 1.0 {
                    return None;
                }

                let t = inv_det * edge2.dot(q);
                (t > MIN_HIT_DISTANCE).then_some(t)
            }
            Self::Sphere { center, radius } => {
                let oc = center - ray.origin;
                let a = ray.direction.length_squared();
                let h = ray.direction.dot(oc);
                let c = oc.length_squared() - radius * radius;

                let discriminant = h * h - a * c;
                if discriminant < 0.0 {
                    return None;
                }
                let sqrtd = discriminant.sqrt();

                for root in [(h - sqrtd) / a, (h + sqrtd) / a] {
                    if root <= MIN_HIT_DISTANCE {
                        continue;
                    }
                    if cull_back_face {
                        let outward = (ray.at(root) - center) / radius;
                        if outward.dot(ray.direction) > 0.0 {
                            continue;
                        }
                    }
                    return Some(root);
                }
                None
            }
        }
    }

    /// Outward-facing unit normal at a point on the surface.
    pub fn normal_at(&self, point: Vec3A) -> Vec3A {
        match *self {
            Self::Triangle { normal, .. } => normal,
            Self::Sphere { center, radius } => (point - center) / radius,
        }
    }

    /// Uniform random point on the surface.
    pub fn random_surface_point(&self) -> Vec3A {
        match *self {
            Self::Triangle { v0, v1, v2, .. } => {
                let mut u = random::random_f32();
                let mut v = random::random_f32();
                // Fold samples outside the triangle back inside.
                if u + v > 1.0 {
                    u = 1.0 - u;
                    v = 1.0 - v;
                }
                v0 + u * (v1 - v0) + v * (v2 - v0)
            }
            Self::Sphere { center, radius } => center + radius * random::random_unit_vector(),
        }
    }

    /// Geometric center of the primitive.
    pub fn center(&self) -> Vec3A {
        match *self {
            Self::Triangle { v0, v1, v2, .. } => (v0 + v1 + v2) / 3.0,
            Self::Sphere { center, .. } => center,
        }
    }

    /// Axis-aligned bounding box of the primitive.
    pub fn aabb(&self) -> Aabb {
        match *self {
            Self::Triangle { v0, v1, v2, .. } => {
                let mut aabb = Aabb::from_points(v0, v1);
                aabb.grow(v2);
                aabb
            }
            Self::Sphere { center, radius } => {
                Aabb::from_points(center - Vec3A::splat(radius), center + Vec3A::splat(radius))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::reseed;

    fn facing_triangle() -> Primitive {
        // Normal points toward +Z, visible from origin side.
        Primitive::triangle(
            Vec3A::new(-1.0, -1.0, -1.0),
            Vec3A::new(1.0, -1.0, -1.0),
            Vec3A::new(0.0, 1.0, -1.0),
        )
    }

    #[test]
    fn triangle_hit_and_distance() {
        let tri = facing_triangle();
        let ray = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, -1.0));
        let t = tri.ray_intersect(&ray, true).expect("front hit");
        assert!((t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn triangle_miss_outside_edges() {
        let tri = facing_triangle();
        let ray = Ray::new(Vec3A::new(5.0, 5.0, 0.0), Vec3A::new(0.0, 0.0, -1.0));
        assert!(tri.ray_intersect(&ray, true).is_none());
    }

    #[test]
    fn triangle_back_face_is_culled() {
        let tri = facing_triangle();
        // From behind the triangle the normal points away from the ray.
        let ray = Ray::new(Vec3A::new(0.0, 0.0, -2.0), Vec3A::new(0.0, 0.0, 1.0));
        assert!(tri.ray_intersect(&ray, true).is_none());
        assert!(tri.ray_intersect(&ray, false).is_some());
    }

    #[test]
    fn triangle_normal_follows_winding() {
        let tri = facing_triangle();
        let n = tri.normal_at(Vec3A::new(0.0, 0.0, -1.0));
        assert!((n - Vec3A::new(0.0, 0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn sphere_nearest_root_selected() {
        let sphere = Primitive::sphere(Vec3A::new(0.0, 0.0, -3.0), 1.0);
        let ray = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, -1.0));
        let t = sphere.ray_intersect(&ray, true).expect("front hit");
        assert!((t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_inside_hit_depends_on_culling() {
        let sphere = Primitive::sphere(Vec3A::ZERO, 1.0);
        let ray = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, -1.0));
        // From inside every visible surface is a back face.
        assert!(sphere.ray_intersect(&ray, true).is_none());
        let t = sphere.ray_intersect(&ray, false).expect("exit hit");
        assert!((t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_normal_is_radial() {
        let sphere = Primitive::sphere(Vec3A::new(1.0, 0.0, 0.0), 2.0);
        let n = sphere.normal_at(Vec3A::new(3.0, 0.0, 0.0));
        assert!((n - Vec3A::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn surface_points_lie_on_surface() {
        reseed(23);
        let tri = facing_triangle();
        for _ in 0..1000 {
            let p = tri.random_surface_point();
            // All triangle points live in the z = -1 plane.
            assert!((p.z + 1.0).abs() < 1e-6);
            assert!(tri.aabb().contains(p));
        }

        let sphere = Primitive::sphere(Vec3A::new(0.0, 2.0, 0.0), 1.5);
        for _ in 0..1000 {
            let p = sphere.random_surface_point();
            assert!(((p - Vec3A::new(0.0, 2.0, 0.0)).length() - 1.5).abs() < 1e-4);
        }
    }

    #[test]
    fn centers_and_bounds() {
        let tri = facing_triangle();
        assert!((tri.center() - Vec3A::new(0.0, -1.0 / 3.0, -1.0)).length() < 1e-6);

        let sphere = Primitive::sphere(Vec3A::new(1.0, 1.0, 1.0), 0.5);
        let aabb = sphere.aabb();
        assert_eq!(aabb.min, Vec3A::splat(0.5));
        assert_eq!(aabb.max, Vec3A::splat(1.5));
    }
}
