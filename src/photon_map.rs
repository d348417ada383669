//! Photon emission, classification and storage.
//!
//! Lights shoot a fixed budget of photons into the scene; every diffuse
//! landing is recorded into one of three pools (direct, indirect, caustic)
//! and each pool is indexed by a kd-tree for radius queries during
//! shading. The map is built once and frozen.

use glam::Vec3A;
use log::info;

use crate::kd_tree::KdTree;
use crate::material::Color;
use crate::random;
use crate::ray::Ray;
use crate::sampling::{cosine_weighted_hemisphere_sample, reflect, refract, schlick};
use crate::scene::Scene;

/// Offset along the surface normal when restarting a photon from a
/// surface, mirroring the integrators' refraction bias.
const SURFACE_BIAS: f32 = 0.001;

/// A stored photon hit.
///
/// Photons carry indices into the scene rather than references, so the
/// landing surface's normal can be recomputed at gather time.
#[derive(Debug, Clone, Copy)]
pub struct Photon {
    /// World position of the landing point.
    pub position: Vec3A,
    /// Unit direction the photon was travelling when it landed.
    pub direction: Vec3A,
    /// Photon power; the gather kernel normalizes by photon count.
    pub color: Color,
    /// Render group of the landing surface.
    pub group: u32,
    /// Primitive within that group.
    pub primitive: u32,
}

impl Photon {
    /// Outward normal of the surface this photon landed on.
    pub fn surface_normal(&self, scene: &Scene) -> Vec3A {
        scene.group(self.group as usize).primitives[self.primitive as usize]
            .normal_at(self.position)
    }
}

/// The three independently indexed photon sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotonPool {
    /// First hit from a light onto a non-specular surface.
    Direct,
    /// Any later diffuse bounce that never crossed a transparent surface.
    Indirect,
    /// Landed on a diffuse surface after at least one refraction.
    Caustic,
}

/// Photon emission parameters.
#[derive(Debug, Clone, Copy)]
pub struct PhotonMapConfig {
    /// Photons shot per emissive render group.
    pub photons_per_light_source: u32,
    /// Maximum bounces along one photon path.
    pub max_photon_depth: u32,
    /// Seed for the emission pass, for reproducible maps.
    pub seed: u64,
}

impl Default for PhotonMapConfig {
    fn default() -> Self {
        Self {
            photons_per_light_source: 100_000,
            max_photon_depth: 5,
            seed: 0,
        }
    }
}

/// Buffers the emission pass fills before the trees are built.
#[derive(Default)]
struct PoolBuffers {
    direct: Vec<Photon>,
    indirect: Vec<Photon>,
    caustic: Vec<Photon>,
}

/// Three photon pools, each behind its own kd-tree.
#[derive(Debug, Default)]
pub struct PhotonMap {
    direct: KdTree,
    indirect: KdTree,
    caustic: KdTree,
}

impl PhotonMap {
    /// Emit and trace photons from every emissive group in the scene,
    /// then build the per-pool spatial indices.
    pub fn build(scene: &Scene, config: &PhotonMapConfig) -> Self {
        random::reseed(config.seed);

        let start = std::time::Instant::now();
        let mut pools = PoolBuffers::default();
        for &group_index in scene.emissive_groups() {
            let power = scene.material_of(group_index).emission_color();
            let group = scene.group(group_index);
            for _ in 0..config.photons_per_light_source {
                let (primitive_index, origin) = group.random_surface_sample();
                let normal = group.primitives[primitive_index].normal_at(origin);
                let direction = cosine_weighted_hemisphere_sample(normal);
                let ray = Ray::new(origin + SURFACE_BIAS * normal, direction);
                trace_photon(scene, &ray, power, 0, false, config.max_photon_depth, &mut pools);
            }
        }

        info!(
            "photon map built in {:.2?}: {} direct, {} indirect, {} caustic",
            start.elapsed(),
            pools.direct.len(),
            pools.indirect.len(),
            pools.caustic.len()
        );

        Self {
            direct: KdTree::build(pools.direct),
            indirect: KdTree::build(pools.indirect),
            caustic: KdTree::build(pools.caustic),
        }
    }

    /// The kd-tree behind one pool.
    pub fn pool(&self, pool: PhotonPool) -> &KdTree {
        match pool {
            PhotonPool::Direct => &self.direct,
            PhotonPool::Indirect => &self.indirect,
            PhotonPool::Caustic => &self.caustic,
        }
    }

    /// Append every photon of `pool` within `radius` of `point` to `out`.
    ///
    /// `out` is caller-provided and reused across shading points.
    pub fn photons_within_radius(
        &self,
        pool: PhotonPool,
        point: Vec3A,
        radius: f32,
        out: &mut Vec<Photon>,
    ) {
        self.pool(pool).within_radius(point, radius, out);
    }
}

/// Follow one photon through the scene, recording diffuse landings.
///
/// `refracted` tracks whether the path crossed a transparent surface; a
/// diffuse bounce resets it, so only genuine specular chains feed the
/// caustic pool.
fn trace_photon(
    scene: &Scene,
    ray: &Ray,
    power: Color,
    depth: u32,
    refracted: bool,
    max_depth: u32,
    pools: &mut PoolBuffers,
) {
    if depth >= max_depth || power.max_element() <= f32::EPSILON {
        return;
    }

    let Some(hit) = scene.ray_cast(ray, true) else {
        return;
    };
    let material = *scene.material_of(hit.group);
    if material.is_emissive() {
        return;
    }

    let group = scene.group(hit.group);
    let primitive = &group.primitives[hit.primitive];
    let position = ray.at(hit.distance);
    let normal = primitive.normal_at(position);

    // Record the landing if the surface has a diffuse component.
    let diffuse_weight = (1.0 - material.reflectivity) * (1.0 - material.transparency);
    if diffuse_weight > f32::EPSILON {
        let photon = Photon {
            position,
            direction: ray.direction,
            color: power,
            group: hit.group as u32,
            primitive: hit.primitive as u32,
        };
        if depth == 0 {
            pools.direct.push(photon);
        } else if refracted {
            pools.caustic.push(photon);
        } else {
            pools.indirect.push(photon);
        }
    }

    // Choose the next interaction in proportion to the lobe weights.
    let roll = random::random_f32();
    if roll < material.reflectivity {
        let bounced = Ray::new(position + SURFACE_BIAS * normal, reflect(ray.direction, normal));
        trace_photon(
            scene,
            &bounced,
            power * material.albedo,
            depth + 1,
            refracted,
            max_depth,
            pools,
        );
    } else if roll < material.reflectivity + material.transparency {
        refract_photon(scene, ray, &material, hit.group, position, normal, power, depth, max_depth, pools);
    } else {
        let bounced = Ray::new(
            position + SURFACE_BIAS * normal,
            cosine_weighted_hemisphere_sample(normal),
        );
        // A diffuse bounce ends any caustic chain.
        trace_photon(
            scene,
            &bounced,
            power * material.albedo,
            depth + 1,
            false,
            max_depth,
            pools,
        );
    }
}

/// Push a photon through a transparent object and continue it from the
/// exit surface, attenuated by the Fresnel factors at both interfaces.
#[allow(clippy::too_many_arguments)]
fn refract_photon(
    scene: &Scene,
    ray: &Ray,
    material: &crate::material::Material,
    group: usize,
    position: Vec3A,
    normal: Vec3A,
    power: Color,
    depth: u32,
    max_depth: u32,
    pools: &mut PoolBuffers,
) {
    let n2 = material.refractive_index;
    let schlick_in = schlick(ray.direction, normal, 1.0, n2);

    let Some(inner_direction) = refract(ray.direction, normal, 1.0 / n2) else {
        // Entering a denser medium cannot reflect totally; a sub-unit
        // refractive index can, and the photon then bounces off.
        let bounced = Ray::new(position + SURFACE_BIAS * normal, reflect(ray.direction, normal));
        trace_photon(scene, &bounced, power, depth + 1, true, max_depth, pools);
        return;
    };
    let inner_ray = Ray::new(position - SURFACE_BIAS * normal, inner_direction.normalize());

    if let Some((exit_primitive, exit_distance)) = scene.render_group_ray_cast(&inner_ray, group) {
        let exit_position = inner_ray.at(exit_distance);
        let exit_normal = scene.group(group).primitives[exit_primitive].normal_at(exit_position);
        let schlick_out = schlick(inner_ray.direction, -exit_normal, n2, 1.0);
        let Some(out_direction) = refract(inner_ray.direction, -exit_normal, n2) else {
            // Total internal reflection at the exit; absorb the photon.
            return;
        };
        let out_ray = Ray::new(
            exit_position + SURFACE_BIAS * exit_normal,
            out_direction.normalize(),
        );
        let attenuated = power * (1.0 - schlick_in) * (1.0 - schlick_out);
        trace_photon(scene, &out_ray, attenuated, depth + 1, true, max_depth, pools);
    } else {
        // Pathological thin surface: keep going along the inner direction.
        trace_photon(
            scene,
            &inner_ray,
            power * (1.0 - schlick_in),
            depth + 1,
            true,
            max_depth,
            pools,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_scenes;

    fn small_config(seed: u64) -> PhotonMapConfig {
        PhotonMapConfig {
            photons_per_light_source: 10_000,
            max_photon_depth: 5,
            seed,
        }
    }

    #[test]
    fn cornell_box_fills_direct_and_indirect_pools() {
        let scene = test_scenes::cornell_box();
        let map = PhotonMap::build(&scene, &small_config(1));
        assert!(!map.pool(PhotonPool::Direct).is_empty());
        assert!(!map.pool(PhotonPool::Indirect).is_empty());
        // A box of matte walls cannot produce caustics.
        assert!(map.pool(PhotonPool::Caustic).is_empty());
    }

    #[test]
    fn direct_photons_point_away_from_light() {
        let scene = test_scenes::cornell_box();
        let map = PhotonMap::build(&scene, &small_config(2));
        // The only light faces straight down, so first hits must travel
        // with a downward component.
        for photon in map.pool(PhotonPool::Direct).photons() {
            assert!(photon.direction.y <= 0.0);
            assert!(photon.color.max_element() > 0.0);
        }
    }

    #[test]
    fn glass_sphere_produces_caustics_under_it() {
        let scene = test_scenes::glass_caustic_scene();
        let map = PhotonMap::build(&scene, &small_config(3));
        assert!(!map.pool(PhotonPool::Caustic).is_empty());

        // The sphere sits at (0, 3, -5) over the floor; refracted photons
        // concentrate in a disk of roughly the sphere's radius below it.
        let mut nearby = Vec::new();
        map.photons_within_radius(
            PhotonPool::Caustic,
            Vec3A::new(0.0, 0.0, -5.0),
            2.0,
            &mut nearby,
        );
        assert!(!nearby.is_empty());
    }

    #[test]
    fn build_is_deterministic_for_a_seed() {
        let scene = test_scenes::cornell_box();
        let first = PhotonMap::build(&scene, &small_config(7));
        let second = PhotonMap::build(&scene, &small_config(7));
        for pool in [PhotonPool::Direct, PhotonPool::Indirect, PhotonPool::Caustic] {
            let a = first.pool(pool).photons();
            let b = second.pool(pool).photons();
            assert_eq!(a.len(), b.len());
            for (pa, pb) in a.iter().zip(b) {
                assert_eq!(pa.position, pb.position);
                assert_eq!(pa.direction, pb.direction);
                assert_eq!(pa.color, pb.color);
            }
        }
    }

    #[test]
    fn photon_normals_recompute_from_scene() {
        let scene = test_scenes::cornell_box();
        let map = PhotonMap::build(&scene, &small_config(11));
        for photon in map.pool(PhotonPool::Direct).photons().iter().take(100) {
            let normal = photon.surface_normal(&scene);
            assert!((normal.length() - 1.0).abs() < 1e-4);
            // Landing surfaces face the incoming photon.
            assert!(normal.dot(-photon.direction) > 0.0);
        }
    }
}
