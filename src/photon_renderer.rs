//! Photon-map-assisted integrator.
//!
//! Shares the path tracer's recursion skeleton, but replaces the diffuse
//! indirect bounce with a radius gather over the indirect photon pool and
//! adds a caustic gather before the direct term.

use std::cell::RefCell;
use std::f32::consts::PI;

use glam::Vec3A;
use log::info;

use crate::material::{Color, Material};
use crate::photon_map::{Photon, PhotonMap, PhotonMapConfig, PhotonPool};
use crate::ray::Ray;
use crate::renderer::{
    direct_lighting, is_cancelled, refracted_lighting, sanitize, CancelFlag, Renderer, RAY_ADVANCE,
};
use crate::sampling::reflect;
use crate::scene::Scene;

/// Trailing attenuation on every shaded bounce.
///
/// Ad-hoc tuning inherited from the reference renderer: stored photons
/// and next-event estimation overlap slightly, and this factor burns off
/// the excess.
pub const PHOTON_MAP_ATTENUATION: f32 = 0.95;

/// Default gather radius around a shading point.
pub const DEFAULT_SEARCH_RADIUS: f32 = 0.5;

thread_local! {
    /// Reusable gather buffer; grows to the densest query ever made on
    /// this thread and never shrinks.
    static GATHER: RefCell<Vec<Photon>> = RefCell::new(Vec::new());
}

/// Tuning knobs for the photon integrator.
#[derive(Debug, Clone, Copy)]
pub struct PhotonRendererConfig {
    /// Recursion depth bound.
    pub max_depth: u32,
    /// Gather radius for both the indirect and caustic pools.
    pub search_radius: f32,
    /// Slope of the cone kernel; photon weight reaches zero at distance
    /// `1 / weight_factor`.
    pub weight_factor: f32,
    /// Ad-hoc caustic brightness scale.
    pub caustics_strength: f32,
    /// Normalization area for the caustic estimate; keep it at
    /// `PI * search_radius^2` when changing the radius.
    pub search_area: f32,
}

impl Default for PhotonRendererConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            search_radius: DEFAULT_SEARCH_RADIUS,
            weight_factor: 1.0,
            caustics_strength: 1.0,
            search_area: PI * DEFAULT_SEARCH_RADIUS * DEFAULT_SEARCH_RADIUS,
        }
    }
}

/// Integrator backed by a built photon map.
///
/// Owning the map makes "queried before built" unrepresentable: the
/// constructor runs the emission pass and the map is frozen from then on.
pub struct PhotonMapRenderer<'s> {
    scene: &'s Scene,
    map: PhotonMap,
    config: PhotonRendererConfig,
    cancel: CancelFlag,
}

impl<'s> PhotonMapRenderer<'s> {
    /// Build the photon map for `scene` and wrap it in an integrator.
    pub fn new(
        scene: &'s Scene,
        map_config: &PhotonMapConfig,
        config: PhotonRendererConfig,
    ) -> Self {
        info!(
            "photon map renderer: max depth {}, search radius {}",
            config.max_depth, config.search_radius
        );
        let map = PhotonMap::build(scene, map_config);
        Self {
            scene,
            map,
            config,
            cancel: CancelFlag::default(),
        }
    }

    /// The frozen photon map this integrator gathers from.
    pub fn photon_map(&self) -> &PhotonMap {
        &self.map
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

        if material.is_emissive() {
            let factor = if depth >= 1 {
                (-ray.direction).dot(normal)
            } else {
                1.0
            };
            return factor * material.emission_color();
        }

        let rf = 1.0 - material.reflectivity;
        let tf = 1.0 - material.transparency;
        let mut accumulator = Color::ZERO;

        // Caustics ride along with the direct term and share its
        // per-light normalization.
        let lights = self.scene.emissive_groups().len().max(1) as f32;
        accumulator += self.caustic_lighting(&ray, position, normal, &material) / lights;

        if rf > f32::EPSILON && tf > f32::EPSILON {
            accumulator += direct_lighting(
                self.scene,
                position,
                normal,
                ray.direction,
                &material,
                rf * tf,
            );
            accumulator += self.gathered_indirect_lighting(&ray, position, normal, &material);
        }
        accumulator *= rf * tf;

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

        if material.is_reflective() {
            let reflected = Ray::new(position, reflect(ray.direction, normal));
            accumulator += material.reflectivity * self.trace(&reflected, depth + 1);
        }

        PHOTON_MAP_ATTENUATION * accumulator
    }

    /// Cone-kernel estimate over the caustic pool, clamped per channel.
    fn caustic_lighting(
        &self,
        ray: &Ray,
        position: Vec3A,
        normal: Vec3A,
        material: &Material,
    ) -> Color {
        GATHER.with(|buffer| {
            let mut photons = buffer.borrow_mut();
            photons.clear();
            self.map.photons_within_radius(
                PhotonPool::Caustic,
                position,
                self.config.search_radius,
                &mut photons,
            );
            if photons.is_empty() {
                return Color::ZERO;
            }

            let mut accumulator = Color::ZERO;
            for photon in photons.iter() {
                let distance = (position - photon.position).length();
                let weight = (1.0 - distance * self.config.weight_factor).max(0.0);
                let photon_normal = photon.surface_normal(self.scene);
                let photon_color =
                    photon_normal.dot(normal).max(0.0) * weight * photon.color;
                accumulator += material.diffuse_brdf(
                    photon.direction,
                    ray.direction,
                    photon_normal,
                    photon_color,
                );
            }
            let scaled = accumulator * self.config.caustics_strength / self.config.search_area;
            scaled.min(Color::ONE)
        })
    }

    /// Count-normalized cone-kernel estimate over the indirect pool,
    /// standing in for the path tracer's recursive diffuse bounce.
    fn gathered_indirect_lighting(
        &self,
        ray: &Ray,
        position: Vec3A,
        normal: Vec3A,
        material: &Material,
    ) -> Color {
        GATHER.with(|buffer| {
            let mut photons = buffer.borrow_mut();
            photons.clear();
            self.map.photons_within_radius(
                PhotonPool::Indirect,
                position,
                self.config.search_radius,
                &mut photons,
            );
            if photons.is_empty() {
                return Color::ZERO;
            }

            let normalization = 1.0 / photons.len() as f32;
            let mut accumulator = Color::ZERO;
            for photon in photons.iter() {
                let distance = (position - photon.position).length();
                let weight = (1.0 - distance * self.config.weight_factor).max(0.0);
                let photon_normal = photon.surface_normal(self.scene);
                let factor = normalization * photon_normal.dot(normal).max(0.0) * weight;
                accumulator += material.diffuse_brdf(
                    photon.direction,
                    -ray.direction,
                    normal,
                    factor * photon.color,
                );
            }
            accumulator
        })
    }
}

impl Renderer for PhotonMapRenderer<'_> {
    fn name(&self) -> &'static str {
        "photon map"
    }

    fn pixel_color(&self, ray: &Ray) -> Color {
        sanitize(self.trace(ray, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monte_carlo::{MonteCarloConfig, MonteCarloRenderer};
    use crate::random::reseed;
    use crate::test_scenes;
    use std::sync::atomic::Ordering;

    fn map_config(seed: u64) -> PhotonMapConfig {
        PhotonMapConfig {
            photons_per_light_source: 10_000,
            max_photon_depth: 5,
            seed,
        }
    }

    fn luminance(color: Color) -> f32 {
        0.2126 * color.x + 0.7152 * color.y + 0.0722 * color.z
    }

    #[test]
    fn empty_scene_is_black() {
        let scene = test_scenes::empty_scene();
        let renderer =
            PhotonMapRenderer::new(&scene, &map_config(1), PhotonRendererConfig::default());
        let ray = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, -1.0));
        assert_eq!(renderer.pixel_color(&ray), Color::ZERO);
    }

    #[test]
    fn unlit_scene_is_black() {
        let scene = test_scenes::single_sphere_scene();
        let renderer =
            PhotonMapRenderer::new(&scene, &map_config(1), PhotonRendererConfig::default());
        reseed(2);
        let ray = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, -1.0));
        assert_eq!(renderer.pixel_color(&ray), Color::ZERO);
    }

    #[test]
    fn emissive_hit_at_depth_zero_is_unscaled() {
        let scene = test_scenes::cornell_box();
        let renderer =
            PhotonMapRenderer::new(&scene, &map_config(1), PhotonRendererConfig::default());
        let ray = Ray::new(Vec3A::new(0.0, 5.0, -5.0), Vec3A::new(0.0, 1.0, 0.0));
        let color = renderer.pixel_color(&ray);
        assert!((color - Color::splat(15.0)).length() < 1e-4);
    }

    #[test]
    fn degenerate_direction_is_black() {
        let scene = test_scenes::cornell_box();
        let renderer =
            PhotonMapRenderer::new(&scene, &map_config(1), PhotonRendererConfig::default());
        let ray = Ray::new(Vec3A::new(0.0, 5.0, -1.0), Vec3A::new(0.0, 0.0, -2.0));
        assert_eq!(renderer.pixel_color(&ray), Color::ZERO);
    }

    #[test]
    fn output_is_finite_and_non_negative() {
        let scene = test_scenes::cornell_box();
        let renderer =
            PhotonMapRenderer::new(&scene, &map_config(4), PhotonRendererConfig::default());
        reseed(5);
        for _ in 0..200 {
            let direction = crate::random::random_unit_vector();
            let ray = Ray::new(Vec3A::new(0.0, 5.0, -5.0), direction);
            let color = renderer.pixel_color(&ray);
            assert!(color.is_finite());
            assert!(color.min_element() >= 0.0);
        }
    }

    #[test]
    fn identical_seeds_are_bit_identical() {
        let scene = test_scenes::cornell_box();
        let renderer =
            PhotonMapRenderer::new(&scene, &map_config(6), PhotonRendererConfig::default());
        let ray = Ray::new(Vec3A::new(0.0, 5.0, -5.0), Vec3A::new(0.0, -1.0, 0.0));

        reseed(77);
        let first: Vec<Color> = (0..16).map(|_| renderer.pixel_color(&ray)).collect();
        reseed(77);
        let second: Vec<Color> = (0..16).map(|_| renderer.pixel_color(&ray)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn cancel_flag_blacks_out_rendering() {
        let scene = test_scenes::cornell_box();
        let renderer =
            PhotonMapRenderer::new(&scene, &map_config(6), PhotonRendererConfig::default());
        renderer.cancel_flag().store(true, Ordering::Relaxed);
        let ray = Ray::new(Vec3A::new(0.0, 5.0, -5.0), Vec3A::new(0.0, 1.0, 0.0));
        assert_eq!(renderer.pixel_color(&ray), Color::ZERO);
    }

    #[test]
    fn caustics_light_the_shadow_under_the_glass_sphere() {
        let scene = test_scenes::glass_caustic_scene();
        // The caustic disk under the sphere has roughly the sphere's
        // radius; gather wide enough to straddle it.
        let config = PhotonRendererConfig {
            search_radius: 1.5,
            weight_factor: 0.5,
            search_area: PI * 1.5 * 1.5,
            ..PhotonRendererConfig::default()
        };
        let renderer = PhotonMapRenderer::new(&scene, &map_config(9), config);
        assert!(!renderer.photon_map().pool(PhotonPool::Caustic).is_empty());

        // The sphere occludes the light from the floor point right under
        // it, so any brightness there is carried by stored photons.
        reseed(10);
        let ray = Ray::new(
            Vec3A::new(0.0, 2.0, -5.0),
            Vec3A::new(0.0, -1.0, 0.0),
        );
        let mut sum = Color::ZERO;
        for _ in 0..64 {
            sum += renderer.pixel_color(&ray);
        }
        assert!(sum.max_element() > 0.0);
    }

    #[test]
    fn agrees_with_path_tracer_on_cornell_box() {
        let scene = test_scenes::cornell_box();

        let path_tracer = MonteCarloRenderer::new(
            &scene,
            MonteCarloConfig {
                max_depth: 5,
                bounces_per_hit: 1,
                emissive_self_term: false,
            },
        );
        let photon = PhotonMapRenderer::new(&scene, &map_config(21), PhotonRendererConfig::default());

        // Pixel center aimed at the directly lit floor.
        let origin = Vec3A::new(0.0, 5.0, -1.0);
        let direction = (Vec3A::new(0.0, 0.0, -6.0) - origin).normalize();
        let ray = Ray::new(origin, direction);

        let samples = 1500;
        reseed(31);
        let mut mc_sum = Color::ZERO;
        for _ in 0..samples {
            mc_sum += path_tracer.pixel_color(&ray);
        }
        reseed(31);
        let mut ph_sum = Color::ZERO;
        for _ in 0..samples {
            ph_sum += photon.pixel_color(&ray);
        }

        let mc = luminance(mc_sum / samples as f32);
        let ph = luminance(ph_sum / samples as f32);
        assert!(mc > 0.0 && ph > 0.0);
        let relative = (mc - ph).abs() / mc.max(1e-6);
        assert!(relative < 0.2, "mc = {mc}, photon = {ph}");
    }
}
