//! Integrator interface and shading helpers shared by both integrators.

use glam::Vec3A;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::material::{Color, Material};
use crate::ray::Ray;
use crate::scene::Scene;

/// Offset along the hit normal for refraction and restart rays.
pub const NORMAL_BIAS: f32 = 0.001;

/// Offset along the hit normal for shadow-ray origins.
pub const SHADOW_BIAS: f32 = 0.0001;

/// Distance a primary ray is advanced along itself before casting, which
/// removes spurious misses right at the origin surface.
pub const RAY_ADVANCE: f32 = 0.001;

/// Cooperative cancellation flag shared between the driver and the
/// integrators; set it to make every in-flight `pixel_color` return black.
pub type CancelFlag = Arc<AtomicBool>;

/// A radiance integrator.
///
/// `pixel_color` is pure from the caller's point of view and safe to call
/// from many threads at once: the scene and any photon map are read-only
/// and all per-sample state is thread local.
pub trait Renderer: Sync {
    /// Human-readable integrator name for logs.
    fn name(&self) -> &'static str;

    /// Radiance arriving along `ray`, as non-negative finite RGB.
    fn pixel_color(&self, ray: &Ray) -> Color;
}

/// Whether the flag has been raised.
pub(crate) fn is_cancelled(flag: &CancelFlag) -> bool {
    flag.load(Ordering::Relaxed)
}

/// Replace NaN/Inf components with zero and clamp negatives away, so
/// degenerate arithmetic deep in the recursion can never reach the image.
pub(crate) fn sanitize(color: Color) -> Color {
    fn clean(v: f32) -> f32 {
        if v.is_finite() {
            v.max(0.0)
        } else {
            0.0
        }
    }
    Vec3A::new(clean(color.x), clean(color.y), clean(color.z))
}

/// Next-event estimation: one shadow ray per emissive group.
///
/// Samples a point on each light, tests occlusion against the whole
/// scene, and accumulates the diffuse (weighted by `diffuse_weight`,
/// which is `(1 - reflectivity) * (1 - transparency)`) plus Phong
/// contribution. The sum is normalized by the number of lights.
pub(crate) fn direct_lighting(
    scene: &Scene,
    position: Vec3A,
    normal: Vec3A,
    ray_direction: Vec3A,
    material: &Material,
    diffuse_weight: f32,
) -> Color {
    let mut accumulator = Color::ZERO;

    for &light_index in scene.emissive_groups() {
        let light_group = scene.group(light_index);
        let light_material = scene.material_of(light_index);

        let target = light_group.random_surface_point();
        let to_light = (target - position).normalize();
        if to_light.dot(normal) < f32::EPSILON {
            continue;
        }
        let shadow_ray = Ray::new(position + SHADOW_BIAS * normal, to_light);

        // Occluded unless the closest hit is the sampled light itself.
        let Some(hit) = scene.ray_cast(&shadow_ray, true) else {
            continue;
        };
        if hit.group != light_index {
            continue;
        }

        let light_primitive = &light_group.primitives[hit.primitive];
        let light_normal = light_primitive.normal_at(shadow_ray.at(hit.distance));
        let light_factor = (-to_light).dot(light_normal);
        if light_factor < f32::EPSILON {
            continue;
        }

        let radiance = light_factor * light_material.emission_color();
        accumulator +=
            diffuse_weight * material.diffuse_brdf(-to_light, -ray_direction, normal, radiance);
        if material.is_specular() {
            accumulator +=
                diffuse_weight * material.specular_brdf(-to_light, ray_direction, normal, radiance);
        }
    }

    accumulator / (scene.emissive_groups().len().max(1) as f32)
}

/// Refraction branch shared by both integrators.
///
/// Refracts into the object at `position`, finds the exit surface with a
/// single-group ray cast, refracts back out and recurses along the
/// transmitted ray; both interfaces are weighted by Schlick's
/// approximation and the result is shaded through the entry surface's
/// diffuse lobe. A Fresnel-reflected specular ray at the entry point is
/// accumulated as well. Total internal reflection counts as a miss.
#[allow(clippy::too_many_arguments)]
pub(crate) fn refracted_lighting(
    scene: &Scene,
    ray: &Ray,
    group: usize,
    position: Vec3A,
    normal: Vec3A,
    material: &Material,
    depth: u32,
    trace: &dyn Fn(&Ray, u32) -> Color,
) -> Color {
    use crate::sampling::{reflect, refract, schlick};

    let mut accumulator = Color::ZERO;
    let n2 = material.refractive_index;
    let schlick_in = schlick(ray.direction, normal, 1.0, n2);

    if let Some(inner) = refract(ray.direction, normal, 1.0 / n2) {
        let inner_ray = Ray::new(position - NORMAL_BIAS * normal, inner.normalize());

        if let Some((exit_index, exit_distance)) = scene.render_group_ray_cast(&inner_ray, group) {
            let exit_position = inner_ray.at(exit_distance);
            let exit_normal = scene.group(group).primitives[exit_index].normal_at(exit_position);
            let schlick_out = schlick(inner_ray.direction, -exit_normal, n2, 1.0);

            if let Some(outgoing) = refract(inner_ray.direction, -exit_normal, n2) {
                let out_ray =
                    Ray::new(exit_position + NORMAL_BIAS * exit_normal, outgoing.normalize());
                let entry_weight = (1.0 - schlick_in) * material.transparency;
                let exit_weight = 1.0 - schlick_out;
                let incoming = exit_weight * trace(&out_ray, depth + 1);
                // Transmitted radiance is shaded through the entry
                // surface's diffuse lobe.
                accumulator += entry_weight
                    * material.diffuse_brdf(inner_ray.direction, -ray.direction, normal, incoming);
            }
            // Total internal reflection at the exit counts as a miss.
        } else {
            // Thin surface with no exit; keep going inside.
            accumulator +=
                (1.0 - schlick_in) * material.transparency * trace(&inner_ray, depth + 1);
        }
    }

    let specular_ray = Ray::new(position, reflect(ray.direction, normal));
    let specular_weight = schlick_in * material.specularity;
    accumulator += specular_weight
        * material.specular_brdf(
            -specular_ray.direction,
            ray.direction,
            normal,
            trace(&specular_ray, depth + 1),
        );
    accumulator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_zeroes_non_finite_components() {
        let dirty = Vec3A::new(f32::NAN, f32::INFINITY, -2.0);
        assert_eq!(sanitize(dirty), Vec3A::ZERO);
        let clean = Vec3A::new(0.25, 1.5, 0.0);
        assert_eq!(sanitize(clean), clean);
    }

    #[test]
    fn cancel_flag_round_trip() {
        let flag: CancelFlag = Arc::new(AtomicBool::new(false));
        assert!(!is_cancelled(&flag));
        flag.store(true, Ordering::Relaxed);
        assert!(is_cancelled(&flag));
    }
}
