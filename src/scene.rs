//! Scene storage and ray casting.
//!
//! A scene is a set of render groups over a material arena. Groups are the
//! light-sampling unit: a group whose material is emissive acts as one
//! area light regardless of how many primitives it holds. Intersection is
//! a brute-force scan over every primitive, which is plenty for the scene
//! sizes this renderer targets.

use glam::Vec3A;
use log::debug;

use crate::aabb::Aabb;
use crate::material::Material;
use crate::primitive::Primitive;
use crate::random;
use crate::ray::Ray;

/// Set of primitives sharing one material.
#[derive(Debug, Clone)]
pub struct RenderGroup {
    /// Surfaces belonging to this group.
    pub primitives: Vec<Primitive>,
    /// Index of the group's material in the scene's material arena.
    pub material: usize,
}

impl RenderGroup {
    /// Create an empty group referencing a material.
    pub fn new(material: usize) -> Self {
        Self {
            primitives: Vec::new(),
            material,
        }
    }

    /// Append a primitive to the group.
    pub fn add(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Uniform random point on the group's surface.
    pub fn random_surface_point(&self) -> Vec3A {
        self.random_surface_sample().1
    }

    /// Uniform random point on the group's surface together with the
    /// index of the primitive it lies on.
    ///
    /// Picks a uniform random member primitive first, so primitives of
    /// wildly different area are weighted by count, not area. Good enough
    /// for the evenly tessellated light quads this renderer uses.
    pub fn random_surface_sample(&self) -> (usize, Vec3A) {
        let index = random::random_index(self.primitives.len());
        (index, self.primitives[index].random_surface_point())
    }
}

/// Result of a scene-wide ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Index of the hit render group.
    pub group: usize,
    /// Index of the hit primitive within its group.
    pub primitive: usize,
    /// Parametric distance along the (unit) ray direction.
    pub distance: f32,
}

/// All render groups, materials and derived indices of one scene.
///
/// Lifecycle: construct empty, append materials and groups, call
/// [`Scene::initialize`] once, then treat as read-only while rendering.
#[derive(Debug)]
pub struct Scene {
    groups: Vec<RenderGroup>,
    materials: Vec<Material>,
    emissive_groups: Vec<usize>,
    bounds: Aabb,
    initialized: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            materials: Vec::new(),
            emissive_groups: Vec::new(),
            bounds: Aabb::EMPTY,
            initialized: false,
        }
    }

    /// Store a material and return its arena index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Append a render group.
    pub fn add_group(&mut self, group: RenderGroup) -> usize {
        self.groups.push(group);
        self.groups.len() - 1
    }

    /// Build the emissive-group index and the scene bounding box.
    ///
    /// Idempotent; must run before rendering or photon emission.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        for (index, group) in self.groups.iter().enumerate() {
            if self.materials[group.material].is_emissive() {
                self.emissive_groups.push(index);
            }
        }

        let mut bounds = Aabb::EMPTY;
        for group in &self.groups {
            for primitive in &group.primitives {
                bounds = bounds.union(&primitive.aabb());
            }
        }
        self.bounds = bounds;
        self.initialized = true;

        debug!(
            "scene initialized: {} groups, {} lights, bounds {:?}..{:?}",
            self.groups.len(),
            self.emissive_groups.len(),
            self.bounds.min,
            self.bounds.max
        );
    }

    /// All render groups.
    pub fn groups(&self) -> &[RenderGroup] {
        &self.groups
    }

    /// Group by index.
    pub fn group(&self, index: usize) -> &RenderGroup {
        &self.groups[index]
    }

    /// Material of a group.
    pub fn material_of(&self, group: usize) -> &Material {
        &self.materials[self.groups[group].material]
    }

    /// Indices of groups with emissive materials, valid after
    /// [`Scene::initialize`].
    pub fn emissive_groups(&self) -> &[usize] {
        &self.emissive_groups
    }

    /// Informational scene bounding box, valid after
    /// [`Scene::initialize`].
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Closest intersection of `ray` with any primitive in the scene.
    ///
    /// Scans every primitive in group/primitive order, so ties on distance
    /// resolve deterministically to the first group encountered.
    pub fn ray_cast(&self, ray: &Ray, cull_back_face: bool) -> Option<RayHit> {
        let mut closest: Option<RayHit> = None;
        for (group_index, group) in self.groups.iter().enumerate() {
            for (primitive_index, primitive) in group.primitives.iter().enumerate() {
                if let Some(distance) = primitive.ray_intersect(ray, cull_back_face) {
                    if closest.map_or(true, |hit| distance < hit.distance) {
                        closest = Some(RayHit {
                            group: group_index,
                            primitive: primitive_index,
                            distance,
                        });
                    }
                }
            }
        }
        closest
    }

    /// Closest intersection within a single render group.
    ///
    /// Back-face culling is off: the caller is typically inside a solid
    /// object looking for the exit surface of a refracted ray.
    pub fn render_group_ray_cast(&self, ray: &Ray, group: usize) -> Option<(usize, f32)> {
        let mut closest: Option<(usize, f32)> = None;
        for (primitive_index, primitive) in self.groups[group].primitives.iter().enumerate() {
            if let Some(distance) = primitive.ray_intersect(ray, false) {
                if closest.map_or(true, |(_, best)| distance < best) {
                    closest = Some((primitive_index, distance));
                }
            }
        }
        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Color;

    fn two_sphere_scene() -> Scene {
        let mut scene = Scene::new();
        let grey = scene.add_material(Material::diffuse(Color::splat(0.5)));
        let light = scene.add_material(Material::emissive(Color::ONE, 5.0));

        let mut near = RenderGroup::new(grey);
        near.add(Primitive::sphere(Vec3A::new(0.0, 0.0, -3.0), 1.0));
        scene.add_group(near);

        let mut far = RenderGroup::new(light);
        far.add(Primitive::sphere(Vec3A::new(0.0, 0.0, -10.0), 1.0));
        scene.add_group(far);

        scene.initialize();
        scene
    }

    #[test]
    fn ray_cast_returns_closest_hit() {
        let scene = two_sphere_scene();
        let ray = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, -1.0));
        let hit = scene.ray_cast(&ray, true).expect("hit");
        assert_eq!(hit.group, 0);
        assert!((hit.distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn ray_cast_miss_is_none() {
        let scene = two_sphere_scene();
        let ray = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 1.0, 0.0));
        assert!(scene.ray_cast(&ray, true).is_none());
    }

    #[test]
    fn group_cast_ignores_other_groups() {
        let scene = two_sphere_scene();
        let ray = Ray::new(Vec3A::ZERO, Vec3A::new(0.0, 0.0, -1.0));
        let (_, distance) = scene.render_group_ray_cast(&ray, 1).expect("hit");
        // Skips the nearer sphere in group 0 entirely.
        assert!((distance - 9.0).abs() < 1e-4);
    }

    #[test]
    fn group_cast_sees_back_faces() {
        let scene = two_sphere_scene();
        // From inside the near sphere the only surface is a back face.
        let ray = Ray::new(Vec3A::new(0.0, 0.0, -3.0), Vec3A::new(0.0, 0.0, -1.0));
        let (_, distance) = scene.render_group_ray_cast(&ray, 0).expect("exit");
        assert!((distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn initialize_indexes_emissive_groups() {
        let scene = two_sphere_scene();
        assert_eq!(scene.emissive_groups(), &[1]);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut scene = two_sphere_scene();
        scene.initialize();
        scene.initialize();
        assert_eq!(scene.emissive_groups(), &[1]);
    }

    #[test]
    fn bounds_cover_all_primitives() {
        let scene = two_sphere_scene();
        let bounds = scene.bounds();
        assert!(bounds.contains(Vec3A::new(0.0, 0.0, -2.0)));
        assert!(bounds.contains(Vec3A::new(0.0, 0.0, -11.0)));
        assert!(!bounds.contains(Vec3A::new(0.0, 5.0, -3.0)));
    }
}
