use clap::Parser;
use glam::Vec3A;
use log::info;

use photonpath::camera::Camera;
use photonpath::cli::{Args, IntegratorKind};
use photonpath::logger::init_logger;
use photonpath::material::{Color, Material};
use photonpath::monte_carlo::{MonteCarloConfig, MonteCarloRenderer};
use photonpath::output::{save_image_as_exr, save_image_as_png, send_image_to_tev};
use photonpath::photon_map::PhotonMapConfig;
use photonpath::photon_renderer::{PhotonMapRenderer, PhotonRendererConfig};
use photonpath::primitive::Primitive;
use photonpath::sampling::quad_interpolate;
use photonpath::scene::{RenderGroup, Scene};

/// Add an axis-aligned quad as two triangles; corners wound so the
/// normal points toward the room interior.
fn add_quad(group: &mut RenderGroup, a: Vec3A, b: Vec3A, c: Vec3A, d: Vec3A) {
    group.add(Primitive::triangle(a, b, c));
    group.add(Primitive::triangle(a, c, d));
}

/// Add a wall as a grid of `patches`x`patches` quads whose albedo is
/// bilinearly blended between four corner tints.
///
/// `origin` is one wall corner; `across` and `up` span the wall. The
/// patch colors come from [`quad_interpolate`] evaluated at each patch
/// center, giving the soft gradients the box walls are known for.
#[allow(clippy::too_many_arguments)]
fn add_tinted_wall(
    scene: &mut Scene,
    origin: Vec3A,
    across: Vec3A,
    up: Vec3A,
    tints: [Color; 4],
    patches: u32,
) {
    for px in 0..patches {
        for py in 0..patches {
            let du = (px as f32 + 0.5) / patches as f32;
            let dv = (py as f32 + 0.5) / patches as f32;
            let albedo = Color::new(
                quad_interpolate(du, dv, tints[0].x, tints[1].x, tints[2].x, tints[3].x),
                quad_interpolate(du, dv, tints[0].y, tints[1].y, tints[2].y, tints[3].y),
                quad_interpolate(du, dv, tints[0].z, tints[1].z, tints[2].z, tints[3].z),
            );
            let material = scene.add_material(Material::diffuse(albedo));

            let base = origin
                + across * (px as f32 / patches as f32)
                + up * (py as f32 / patches as f32);
            let step_across = across / patches as f32;
            let step_up = up / patches as f32;

            let mut patch = RenderGroup::new(material);
            add_quad(
                &mut patch,
                base,
                base + step_across,
                base + step_across + step_up,
                base + step_up,
            );
            scene.add_group(patch);
        }
    }
}

/// Build the demonstration scene: a Cornell-style room with tinted side
/// walls, a ceiling light, a glass sphere and a mirror sphere.
///
/// The room spans x in [-5, 5], y in [0, 10], z in [-10, 0]; the camera
/// sits just inside the open front plane.
fn create_scene() -> Scene {
    let mut scene = Scene::new();

    let white = scene.add_material(Material::diffuse(Color::splat(0.75)));
    let light = scene.add_material(Material::emissive(Color::ONE, 15.0));
    let glass = scene.add_material(Material::transparent(0.95, 1.5));
    let mirror = scene.add_material(Material::mirror(Color::splat(0.95), 0.95));

    // Floor, ceiling and back wall in plain white.
    let mut walls = RenderGroup::new(white);
    add_quad(
        &mut walls,
        Vec3A::new(-5.0, 0.0, 0.0),
        Vec3A::new(5.0, 0.0, 0.0),
        Vec3A::new(5.0, 0.0, -10.0),
        Vec3A::new(-5.0, 0.0, -10.0),
    );
    add_quad(
        &mut walls,
        Vec3A::new(-5.0, 10.0, -10.0),
        Vec3A::new(5.0, 10.0, -10.0),
        Vec3A::new(5.0, 10.0, 0.0),
        Vec3A::new(-5.0, 10.0, 0.0),
    );
    add_quad(
        &mut walls,
        Vec3A::new(-5.0, 0.0, -10.0),
        Vec3A::new(5.0, 0.0, -10.0),
        Vec3A::new(5.0, 10.0, -10.0),
        Vec3A::new(-5.0, 10.0, -10.0),
    );
    scene.add_group(walls);

    // Red and green side walls with a soft corner-to-corner gradient.
    add_tinted_wall(
        &mut scene,
        Vec3A::new(-5.0, 0.0, 0.0),
        Vec3A::new(0.0, 0.0, -10.0),
        Vec3A::new(0.0, 10.0, 0.0),
        [
            Color::new(0.75, 0.15, 0.15),
            Color::new(0.65, 0.10, 0.10),
            Color::new(0.55, 0.10, 0.10),
            Color::new(0.70, 0.20, 0.15),
        ],
        2,
    );
    add_tinted_wall(
        &mut scene,
        Vec3A::new(5.0, 0.0, -10.0),
        Vec3A::new(0.0, 0.0, 10.0),
        Vec3A::new(0.0, 10.0, 0.0),
        [
            Color::new(0.15, 0.75, 0.15),
            Color::new(0.10, 0.65, 0.10),
            Color::new(0.10, 0.55, 0.10),
            Color::new(0.15, 0.70, 0.20),
        ],
        2,
    );

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

    let mut glass_sphere = RenderGroup::new(glass);
    glass_sphere.add(Primitive::sphere(Vec3A::new(-2.0, 1.8, -6.5), 1.8));
    scene.add_group(glass_sphere);

    let mut mirror_sphere = RenderGroup::new(mirror);
    mirror_sphere.add(Primitive::sphere(Vec3A::new(2.5, 1.5, -4.5), 1.5));
    scene.add_group(mirror_sphere);

    scene.initialize();
    scene
}

/// Create the camera for the demonstration scene.
fn create_camera(args: &Args) -> Camera {
    let mut camera = Camera::new();
    camera.image_width = args.width;
    camera.image_height = args.height;
    camera.samples_per_pixel = args.samples_per_pixel;
    camera.vfov = 65.0;
    camera.lookfrom = Vec3A::new(0.0, 5.0, -0.2);
    camera.lookat = Vec3A::new(0.0, 4.0, -6.0);
    camera.vup = Vec3A::new(0.0, 1.0, 0.0);
    camera.focus_dist = 6.0;
    camera.seed = args.seed;
    camera
}

fn main() {
    let args = Args::parse();

    init_logger(args.debug_level.clone().into());

    // Log application startup with version information
    info!(
        "photonpath - Git Version {} ({})",
        env!("GIT_HASH"),
        env!("GIT_DATE")
    );
    info!(
        "Image resolution: {}x{}, samples per pixel: {}",
        args.width, args.height, args.samples_per_pixel
    );

    let scene = create_scene();
    let mut camera = create_camera(&args);

    let image = match args.integrator {
        IntegratorKind::MonteCarlo => {
            let renderer = MonteCarloRenderer::new(
                &scene,
                MonteCarloConfig {
                    max_depth: args.max_depth,
                    ..MonteCarloConfig::default()
                },
            );
            camera.render(&renderer)
        }
        IntegratorKind::PhotonMap => {
            let renderer = PhotonMapRenderer::new(
                &scene,
                &PhotonMapConfig {
                    photons_per_light_source: args.photons,
                    max_photon_depth: args.photon_depth,
                    seed: args.seed,
                },
                PhotonRendererConfig {
                    max_depth: args.max_depth,
                    ..PhotonRendererConfig::default()
                },
            );
            camera.render(&renderer)
        }
    };

    // Send image to TEV if requested
    let should_send_to_tev = args.tev || args.tev_address.is_some();
    if should_send_to_tev {
        let tev_address = args.tev_address.as_deref().unwrap_or("localhost:14158");
        send_image_to_tev(&image, tev_address, args.width, args.height);
    }

    // Save image based on file extension
    if args.output.ends_with(".exr") {
        save_image_as_exr(&image, &args.output, args.width, args.height);
    } else if args.output.ends_with(".png") {
        save_image_as_png(&image, &args.output, args.width, args.height);
    } else {
        log::error!(
            "Unsupported file extension '{}'. Only .png and .exr formats are supported.",
            std::path::Path::new(&args.output)
                .extension()
                .unwrap_or_default()
                .to_string_lossy()
        );
        std::process::exit(1);
    }
}
