//! Scene builders shared by the unit tests.

use glam::Vec3A;

use crate::material::{Color, Material};
use crate::primitive::Primitive;
use crate::scene::{RenderGroup, Scene};

/// Add an axis-aligned quad as two triangles.
///
/// Corners must be given so that `(b - a) x (c - a)` points toward the
/// interior of the scene.
pub fn add_quad(group: &mut RenderGroup, a: Vec3A, b: Vec3A, c: Vec3A, d: Vec3A) {
    group.add(Primitive::triangle(a, b, c));
    group.add(Primitive::triangle(a, c, d));
}

/// Closed Cornell-style box, x in [-5, 5], y in [0, 10], z in [-10, 0],
/// with a downward-facing ceiling light. All normals point inward.
pub fn cornell_box() -> Scene {
    let mut scene = Scene::new();
    let wall = scene.add_material(Material::diffuse(Color::splat(0.4)));
    let light = scene.add_material(Material::emissive(Color::ONE, 15.0));

    let mut walls = RenderGroup::new(wall);
    // Floor, normal +Y.
    add_quad(
        &mut walls,
        Vec3A::new(-5.0, 0.0, 0.0),
        Vec3A::new(5.0, 0.0, 0.0),
        Vec3A::new(5.0, 0.0, -10.0),
        Vec3A::new(-5.0, 0.0, -10.0),
    );
    // Ceiling, normal -Y.
    add_quad(
        &mut walls,
        Vec3A::new(-5.0, 10.0, -10.0),
        Vec3A::new(5.0, 10.0, -10.0),
        Vec3A::new(5.0, 10.0, 0.0),
        Vec3A::new(-5.0, 10.0, 0.0),
    );
    // Back wall, normal +Z.
    add_quad(
        &mut walls,
        Vec3A::new(-5.0, 0.0, -10.0),
        Vec3A::new(5.0, 0.0, -10.0),
        Vec3A::new(5.0, 10.0, -10.0),
        Vec3A::new(-5.0, 10.0, -10.0),
    );
    // Front wall, normal -Z.
    add_quad(
        &mut walls,
        Vec3A::new(5.0, 0.0, 0.0),
        Vec3A::new(-5.0, 0.0, 0.0),
        Vec3A::new(-5.0, 10.0, 0.0),
        Vec3A::new(5.0, 10.0, 0.0),
    );
    // Left wall, normal +X.
    add_quad(
        &mut walls,
        Vec3A::new(-5.0, 0.0, 0.0),
        Vec3A::new(-5.0, 0.0, -10.0),
        Vec3A::new(-5.0, 10.0, -10.0),
        Vec3A::new(-5.0, 10.0, 0.0),
    );
    // Right wall, normal -X.
    add_quad(
        &mut walls,
        Vec3A::new(5.0, 0.0, -10.0),
        Vec3A::new(5.0, 0.0, 0.0),
        Vec3A::new(5.0, 10.0, 0.0),
        Vec3A::new(5.0, 10.0, -10.0),
    );
    scene.add_group(walls);

    // Ceiling light, slightly below the ceiling, facing down.
    let mut lamp = RenderGroup::new(light);
    add_quad(
        &mut lamp,
        Vec3A::new(-1.5, 9.99, -7.0),
        Vec3A::new(1.5, 9.99, -7.0),
        Vec3A::new(1.5, 9.99, -3.0),
        Vec3A::new(-1.5, 9.99, -3.0),
    );
    scene.add_group(lamp);

    scene.initialize();
    scene
}

/// A small light over a glass sphere over a large floor; the classic
/// caustic setup. Sphere center (0, 3, -5) with radius 1.
pub fn glass_caustic_scene() -> Scene {
    let mut scene = Scene::new();
    let floor_mat = scene.add_material(Material::diffuse(Color::splat(0.6)));
    let glass = scene.add_material(Material::transparent(0.95, 1.5));
    let light = scene.add_material(Material::emissive(Color::ONE, 15.0));

    let mut floor = RenderGroup::new(floor_mat);
    add_quad(
        &mut floor,
        Vec3A::new(-8.0, 0.0, 3.0),
        Vec3A::new(8.0, 0.0, 3.0),
        Vec3A::new(8.0, 0.0, -13.0),
        Vec3A::new(-8.0, 0.0, -13.0),
    );
    scene.add_group(floor);

    let mut sphere = RenderGroup::new(glass);
    sphere.add(Primitive::sphere(Vec3A::new(0.0, 3.0, -5.0), 1.0));
    scene.add_group(sphere);

    let mut lamp = RenderGroup::new(light);
    add_quad(
        &mut lamp,
        Vec3A::new(-0.5, 6.0, -5.5),
        Vec3A::new(0.5, 6.0, -5.5),
        Vec3A::new(0.5, 6.0, -4.5),
        Vec3A::new(-0.5, 6.0, -4.5),
    );
    scene.add_group(lamp);

    scene.initialize();
    scene
}

/// A perfect mirror at z = -2 facing +Z and an emissive quad at z = +5
/// facing -Z; a ray down -Z from the origin reflects straight into the
/// light.
pub fn mirror_facing_light() -> Scene {
    let mut scene = Scene::new();
    let mirror = scene.add_material(Material::mirror(Color::ONE, 1.0));
    let light = scene.add_material(Material::emissive(Color::ONE, 5.0));

    let mut wall = RenderGroup::new(mirror);
    add_quad(
        &mut wall,
        Vec3A::new(-4.0, -4.0, -2.0),
        Vec3A::new(4.0, -4.0, -2.0),
        Vec3A::new(4.0, 4.0, -2.0),
        Vec3A::new(-4.0, 4.0, -2.0),
    );
    scene.add_group(wall);

    let mut lamp = RenderGroup::new(light);
    add_quad(
        &mut lamp,
        Vec3A::new(4.0, -4.0, 5.0),
        Vec3A::new(-4.0, -4.0, 5.0),
        Vec3A::new(-4.0, 4.0, 5.0),
        Vec3A::new(4.0, 4.0, 5.0),
    );
    scene.add_group(lamp);

    scene.initialize();
    scene
}

/// One grey sphere, no lights anywhere.
pub fn single_sphere_scene() -> Scene {
    let mut scene = Scene::new();
    let grey = scene.add_material(Material::diffuse(Color::splat(0.5)));
    let mut group = RenderGroup::new(grey);
    group.add(Primitive::sphere(Vec3A::new(0.0, 0.0, -4.0), 1.0));
    scene.add_group(group);
    scene.initialize();
    scene
}

/// Empty scene with nothing to hit.
pub fn empty_scene() -> Scene {
    let mut scene = Scene::new();
    scene.initialize();
    scene
}
