//! Pure Monte Carlo path-tracing integrator.

use log::info;

use crate::material::Color;
use crate::ray::Ray;
use crate::renderer::{
    direct_lighting, is_cancelled, refracted_lighting, sanitize, CancelFlag, Renderer, RAY_ADVANCE,
};
use crate::sampling::{cosine_weighted_hemisphere_sample, reflect};
use crate::scene::Scene;

/// Tuning knobs for the path tracer.
#[derive(Debug, Clone, Copy)]
pub struct MonteCarloConfig {
    /// Recursion depth bound.
    pub max_depth: u32,
    /// Cosine-weighted indirect samples averaged per hit.
    pub bounces_per_hit: u32,
    /// Add the legacy self-emission diffuse term on emissive hits.
    ///
    /// The term double-counts light seen directly, so it defaults to off;
    /// it exists to reproduce older renders that baked it in.
    pub emissive_self_term: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            bounces_per_hit: 1,
            emissive_self_term: false,
        }
    }
}

/// Recursive unbiased Monte Carlo integrator.
pub struct MonteCarloRenderer<'s> {
    scene: &'s Scene,
    config: MonteCarloConfig,
    cancel: CancelFlag,
}

impl<'s> MonteCarloRenderer<'s> {
    /// Create an integrator over an initialized scene.
    pub fn new(scene: &'s Scene, config: MonteCarloConfig) -> Self {
        info!(
            "monte carlo renderer: max depth {}, {} bounce(s) per hit",
            config.max_depth, config.bounces_per_hit
        );
        Self {
            scene,
            config,
            cancel: CancelFlag::default(),
        }
    }

    /// Flag that aborts in-flight evaluation when raised.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    fn trace(&self, ray: &Ray, depth: u32) -> Color {
        if is_cancelled(&self.cancel) || depth >= self.config.max_depth {
            return Color::ZERO;
        }
        if !ray.has_unit_direction() {
            return Color::ZERO;
        }

        // Advancing slightly removes misses right at the origin surface.
        let ray = ray.advanced(RAY_ADVANCE);
        let Some(hit) = self.scene.ray_cast(&ray, true) else {
            return Color::ZERO;
        };

        let position = ray.at(hit.distance);
        let primitive = &self.scene.group(hit.group).primitives[hit.primitive];
        let normal = primitive.normal_at(position);
        if (-ray.direction).dot(normal) < f32::EPSILON {
            return Color::ZERO; // Back face.
        }

        let material = *self.scene.material_of(hit.group);

        // Emissive surfaces terminate the path. The camera sees the light
        // at full strength; bounced hits are dimmed by the cosine.
        if material.is_emissive() {
            let factor = if depth >= 1 {
                (-ray.direction).dot(normal)
            } else {
                1.0
            };
            let mut emitted = factor * material.emission_color();
            if self.config.emissive_self_term {
                emitted +=
                    material.diffuse_brdf(-normal, -ray.direction, normal, material.emission_color());
            }
            return emitted;
        }

        let rf = 1.0 - material.reflectivity;
        let tf = 1.0 - material.transparency;
        let mut accumulator = Color::ZERO;

        // Direct and indirect diffuse, gated by the diffuse weight.
        if rf > f32::EPSILON && tf > f32::EPSILON {
            accumulator += direct_lighting(
                self.scene,
                position,
                normal,
                ray.direction,
                &material,
                rf * tf,
            );

            let bounces = self.config.bounces_per_hit.max(1);
            let mut indirect = Color::ZERO;
            for _ in 0..bounces {
                let direction = cosine_weighted_hemisphere_sample(normal);
                let bounce = Ray::new(position, direction);
                let incoming = self.trace(&bounce, depth + 1);
                indirect += material.diffuse_brdf(-direction, -ray.direction, normal, incoming);
            }
            accumulator += indirect / bounces as f32;
        }
        accumulator *= rf * tf;

        // Refraction through the hit object.
        if material.is_transparent() {
            accumulator += refracted_lighting(
                self.scene,
                &ray,
                hit.group,
                position,
                normal,
                &material,
                depth,
                &|bounce, next_depth| self.trace(bounce, next_depth),
            );
        }

        // Perfect mirror component.
        if material.is_reflective() {
            let reflected = Ray::new(position, reflect(ray.direction, normal));
            accumulator += material.reflectivity * self.trace(&reflected, depth + 1);
        }

        accumulator
    }
}

impl Renderer for MonteCarloRenderer<'_> {
    fn name(&self) -> &'static str {
        "monte carlo"
    }

    fn pixel_color(&self, ray: &Ray) -> Color {
        sanitize(self.trace(ray, 0))
    }
}
