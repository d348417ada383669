//! Direction sampling and shading math shared by the integrators.
//!
//! Hemisphere sampling routines draw from the thread-local PRNG in
//! [`crate::random`]; the remaining functions are pure.

use glam::Vec3A;
use std::f32::consts::PI;

use crate::random;

/// Sample a direction in the hemisphere above `normal` with pdf ∝ cos θ.
///
/// `normal` must be unit length. The returned direction is unit length and
/// satisfies `dot(d, normal) >= -ε`.
pub fn cosine_weighted_hemisphere_sample(normal: Vec3A) -> Vec3A {
    // Concentric-free mapping: uniform disk radius² then lift to the
    // hemisphere, which gives the cosine density directly.
    let u1 = random::random_f32();
    let u2 = random::random_f32();
    let r = u1.sqrt();
    let theta = 2.0 * PI * u2;
    let x = r * theta.cos();
    let y = r * theta.sin();
    let z = (1.0 - u1).max(0.0).sqrt();

    let tangent = normal.any_orthonormal_vector();
    let bitangent = normal.cross(tangent);
    (x * tangent + y * bitangent + z * normal).normalize()
}

/// Sample a direction uniformly over the hemisphere above `normal`.
///
/// Returns a unit direction with `dot(d, normal) >= 0`.
pub fn uniform_hemisphere_sample(normal: Vec3A) -> Vec3A {
    let on_unit_sphere = random::random_unit_vector();
    if on_unit_sphere.dot(normal) >= 0.0 {
        on_unit_sphere
    } else {
        -on_unit_sphere
    }
}

/// Schlick's approximation of the Fresnel reflectance at an interface.
///
/// `incident` points toward the surface, `normal` away from it; `n1` and
/// `n2` are the refractive indices on the incident and transmitted sides.
/// The result is clamped to [0, 1] and equals R0 at normal incidence.
pub fn schlick(incident: Vec3A, normal: Vec3A, n1: f32, n2: f32) -> f32 {
    let r0 = ((n1 - n2) / (n1 + n2)).powi(2);
    let cosine = normal.dot(-incident).abs().min(1.0);
    (r0 + (1.0 - r0) * (1.0 - cosine).powi(5)).clamp(0.0, 1.0)
}

/// Reflect `v` about the surface normal `n`.
pub fn reflect(v: Vec3A, n: Vec3A) -> Vec3A {
    v - 2.0 * v.dot(n) * n
}

/// Refract `v` through an interface with relative index `eta` = n1 / n2.
///
/// `v` must be unit length and point toward the surface, `n` away from it.
/// Returns `None` at and beyond the critical angle (total internal
/// reflection), which callers treat as a miss.
pub fn refract(v: Vec3A, n: Vec3A, eta: f32) -> Option<Vec3A> {
    let cos_theta = n.dot(-v).min(1.0);
    let k = 1.0 - eta * eta * (1.0 - cos_theta * cos_theta);
    if k < 0.0 {
        return None;
    }
    Some(eta * v + (eta * cos_theta - k.sqrt()) * n)
}

/// Bilinear interpolation between four corner values of a quad.
///
/// `dy` and `dz` are the normalized coordinates on the quad's width and
/// height axes; both are clamped to [0, 1]. `x1..x4` are the corner values
/// in the order lower-left, upper-left, upper-right, lower-right.
pub fn quad_interpolate(dy: f32, dz: f32, x1: f32, x2: f32, x3: f32, x4: f32) -> f32 {
    let dy = dy.clamp(0.0, 1.0);
    let dz = dz.clamp(0.0, 1.0);
    let idy = 1.0 - dy;
    let idz = 1.0 - dz;
    let a1 = idy * dz; // lower right area.
    let a2 = dy * dz; // lower left area.
    let a3 = dy * idz; // upper left area.
    let a4 = idy * idz; // upper right area.
    a3 * x1 + a4 * x2 + a1 * x3 + a2 * x4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::reseed;

    #[test]
    fn cosine_sample_stays_above_surface() {
        reseed(11);
        let normal = Vec3A::new(0.0, 0.0, 1.0);
        for _ in 0..10_000 {
            let d = cosine_weighted_hemisphere_sample(normal);
            assert!((d.length() - 1.0).abs() < 1e-5);
            assert!(d.dot(normal) >= -f32::EPSILON);
        }
    }

    #[test]
    fn cosine_sample_mean_matches_density() {
        // E[cos θ] = 2/3 for a pdf proportional to cos θ.
        reseed(13);
        let normal = Vec3A::new(0.0, 0.0, 1.0);
        let samples = 1_000_000;
        let mut mean_z = 0.0f64;
        for _ in 0..samples {
            mean_z += cosine_weighted_hemisphere_sample(normal).z as f64;
        }
        mean_z /= samples as f64;
        let expected = 2.0 / 3.0;
        assert!(
            (mean_z - expected).abs() / expected < 0.01,
            "mean z = {mean_z}"
        );
    }

    #[test]
    fn uniform_sample_stays_above_surface() {
        reseed(17);
        let normal = Vec3A::new(0.0, 1.0, 0.0).normalize();
        for _ in 0..10_000 {
            let d = uniform_hemisphere_sample(normal);
            assert!(d.dot(normal) >= 0.0);
        }
    }

    #[test]
    fn cosine_sample_handles_arbitrary_normals() {
        reseed(19);
        let normal = Vec3A::new(1.0, -2.0, 0.5).normalize();
        for _ in 0..10_000 {
            let d = cosine_weighted_hemisphere_sample(normal);
            assert!(d.dot(normal) >= -f32::EPSILON);
        }
    }

    #[test]
    fn schlick_is_r0_at_normal_incidence() {
        let normal = Vec3A::new(0.0, 0.0, 1.0);
        let incident = Vec3A::new(0.0, 0.0, -1.0);
        let r0 = ((1.0 - 1.5) / (1.0 + 1.5_f32)).powi(2);
        let f = schlick(incident, normal, 1.0, 1.5);
        assert!((f - r0).abs() < 1e-6);
    }

    #[test]
    fn schlick_stays_in_unit_interval() {
        let normal = Vec3A::new(0.0, 0.0, 1.0);
        for i in 0..=90 {
            let angle = (i as f32).to_radians();
            let incident = Vec3A::new(angle.sin(), 0.0, -angle.cos()).normalize();
            let f = schlick(incident, normal, 1.0, 1.5);
            assert!((0.0..=1.0).contains(&f), "f = {f} at {i} degrees");
        }
    }

    #[test]
    fn schlick_grows_toward_grazing() {
        let normal = Vec3A::new(0.0, 0.0, 1.0);
        let head_on = schlick(Vec3A::new(0.0, 0.0, -1.0), normal, 1.0, 1.5);
        let grazing = schlick(
            Vec3A::new(0.999, 0.0, -0.0447).normalize(),
            normal,
            1.0,
            1.5,
        );
        assert!(grazing > head_on);
    }

    #[test]
    fn reflect_mirrors_about_normal() {
        let n = Vec3A::new(0.0, 0.0, 1.0);
        let v = Vec3A::new(1.0, 0.0, -1.0).normalize();
        let r = reflect(v, n);
        assert!((r - Vec3A::new(1.0, 0.0, 1.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn refract_bends_toward_normal_entering_dense_medium() {
        let n = Vec3A::new(0.0, 0.0, 1.0);
        let v = Vec3A::new(1.0, 0.0, -1.0).normalize();
        let t = refract(v, n, 1.0 / 1.5).expect("below critical angle");
        // The transmitted direction makes a smaller angle with -n.
        assert!(t.dot(-n) > v.dot(-n));
        assert!((t.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn refract_reports_total_internal_reflection() {
        let n = Vec3A::new(0.0, 0.0, 1.0);
        // Grazing exit from glass into air is past the critical angle.
        let v = Vec3A::new(0.9, 0.0, -0.436).normalize();
        assert!(refract(v, n, 1.5).is_none());
    }

    #[test]
    fn quad_interpolate_hits_corners() {
        let (x1, x2, x3, x4) = (1.0, 2.0, 3.0, 4.0);
        assert_eq!(quad_interpolate(1.0, 0.0, x1, x2, x3, x4), x1);
        assert_eq!(quad_interpolate(0.0, 0.0, x1, x2, x3, x4), x2);
        assert_eq!(quad_interpolate(0.0, 1.0, x1, x2, x3, x4), x3);
        assert_eq!(quad_interpolate(1.0, 1.0, x1, x2, x3, x4), x4);
    }

    #[test]
    fn quad_interpolate_clamps_inputs() {
        let inside = quad_interpolate(1.0, 1.0, 1.0, 2.0, 3.0, 4.0);
        assert_eq!(quad_interpolate(2.0, 5.0, 1.0, 2.0, 3.0, 4.0), inside);
    }
}
