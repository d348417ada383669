//! Camera for ray generation and the parallel pixel driver.

use glam::Vec3A;
use image::{ImageBuffer, Rgb};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;

use crate::material::Color;
use crate::random;
use crate::ray::Ray;
use crate::renderer::Renderer;

/// Pinhole camera with optional defocus blur.
///
/// Pixel evaluation is embarrassingly parallel: the integrator is
/// read-only during rendering and every pixel reseeds its thread's PRNG
/// from the pixel coordinates, so images are reproducible regardless of
/// how rayon schedules the work.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Rendered image width in pixel count
    pub image_width: u32,
    /// Rendered image height in pixel count
    pub image_height: u32,
    /// Number of random samples for each pixel (for anti-aliasing)
    pub samples_per_pixel: u32,
    /// Vertical field of view in degrees (default: 90)
    pub vfov: f32,
    /// Point camera is looking from (camera position)
    pub lookfrom: Vec3A,
    /// Point camera is looking at (look target)
    pub lookat: Vec3A,
    /// Camera-relative "up" direction vector
    pub vup: Vec3A,
    /// Variation angle of rays through each pixel (defocus blur control)
    pub defocus_angle: f32,
    /// Distance from camera lookfrom point to plane of perfect focus
    pub focus_dist: f32,
    /// Base seed mixed into every pixel's PRNG stream
    pub seed: u64,

    /// Camera position in world space (same as lookfrom)
    center: Vec3A,
    /// World position of the top-left pixel (pixel 0,0)
    pixel00_loc: Vec3A,
    /// Offset vector from pixel to pixel horizontally (right direction)
    pixel_delta_u: Vec3A,
    /// Offset vector from pixel to pixel vertically (down direction)
    pixel_delta_v: Vec3A,
    /// Color scale factor for a sum of pixel samples (1.0 / samples_per_pixel)
    pixel_samples_scale: f32,
    /// Defocus disk horizontal radius vector
    defocus_disk_u: Vec3A,
    /// Defocus disk vertical radius vector
    defocus_disk_v: Vec3A,
    /// Flag to track whether camera parameters have been calculated
    initialized: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Creates a new camera with default settings.
    ///
    /// Default: 100x100 image, 50 samples per pixel, 90° FOV, no defocus blur.
    pub fn new() -> Self {
        Self {
            image_width: 100,
            image_height: 100,
            samples_per_pixel: 50,
            vfov: 90.0,
            lookfrom: Vec3A::new(0.0, 0.0, 0.0),
            lookat: Vec3A::new(0.0, 0.0, -1.0),
            vup: Vec3A::new(0.0, 1.0, 0.0),
            defocus_angle: 0.0,
            focus_dist: 10.0,
            seed: 0,
            center: Vec3A::ZERO,
            pixel00_loc: Vec3A::ZERO,
            pixel_delta_u: Vec3A::ZERO,
            pixel_delta_v: Vec3A::ZERO,
            pixel_samples_scale: 0.1,
            defocus_disk_u: Vec3A::ZERO,
            defocus_disk_v: Vec3A::ZERO,
            initialized: false,
        }
    }

    /// Renders the scene through the given integrator.
    ///
    /// Generates rays through each pixel, evaluates them with
    /// [`Renderer::pixel_color`], and accumulates the samples. Pixels are
    /// processed in parallel with rayon.
    ///
    /// Returns an HDR image buffer with linear f32 RGB values.
    pub fn render(&mut self, renderer: &dyn Renderer) -> ImageBuffer<Rgb<f32>, Vec<f32>> {
        self.initialize();

        let mut image: ImageBuffer<Rgb<f32>, Vec<f32>> =
            ImageBuffer::new(self.image_width, self.image_height);

        info!(
            "rendering with the {} integrator on {} CPU cores...",
            renderer.name(),
            rayon::current_num_threads()
        );
        let generation_start = std::time::Instant::now();
        let pb = ProgressBar::new((self.image_width * self.image_height) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40} {pos}/{len} ETA: {eta}")
                .unwrap(),
        );

        // Parallel pixel processing using rayon with anti-aliasing.
        image.enumerate_pixels_mut().par_bridge().for_each(|(i, j, pixel)| {
            random::reseed(self.pixel_seed(i, j));

            let mut pixel_color = Color::ZERO;
            for _sample in 0..self.samples_per_pixel {
                let r = self.get_ray(i, j);
                pixel_color += renderer.pixel_color(&r);
            }

            // Average the samples
            pixel_color *= self.pixel_samples_scale;
            *pixel = Rgb([pixel_color.x, pixel_color.y, pixel_color.z]);
            pb.inc(1);
        });

        pb.finish();
        let generation_time = generation_start.elapsed();
        info!("Image generated in {:.2?}", generation_time);

        image
    }

    /// Initialize camera parameters based on current settings.
    ///
    /// Sets up the camera coordinate system and viewport for ray
    /// generation. Automatically called by render().
    fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        self.image_height = self.image_height.max(1);
        self.pixel_samples_scale = 1.0 / self.samples_per_pixel as f32;
        self.center = self.lookfrom;

        // Determine viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width =
            viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate the u,v,w unit basis vectors for the camera coordinate frame
        let w = (self.lookfrom - self.lookat).normalize(); // Points opposite view direction
        let u = self.vup.cross(w).normalize(); // Points to camera right
        let v = w.cross(u); // Points to camera up

        // Calculate the vectors across the horizontal and down the vertical viewport edges
        let viewport_u = viewport_width * u; // Vector across viewport horizontal edge
        let viewport_v = viewport_height * -v; // Vector down viewport vertical edge (negative v)

        // Calculate the horizontal and vertical delta vectors from pixel to pixel
        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        // Calculate the location of the upper left pixel
        let viewport_upper_left =
            self.center - (self.focus_dist * w) - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        // Calculate the camera defocus disk basis vectors
        let defocus_radius = self.focus_dist * (self.defocus_angle.to_radians() / 2.0).tan();
        self.defocus_disk_u = u * defocus_radius;
        self.defocus_disk_v = v * defocus_radius;

        self.initialized = true;
    }

    /// Generate a ray through a pixel with random sampling.
    ///
    /// Uses random sampling within the pixel for anti-aliasing and
    /// optionally samples from the defocus disk for depth-of-field blur.
    /// The returned direction is unit length, as the integrators require.
    fn get_ray(&self, i: u32, j: u32) -> Ray {
        let offset = self.sample_square();
        let pixel_sample = self.pixel00_loc
            + ((i as f32 + offset.x) * self.pixel_delta_u)
            + ((j as f32 + offset.y) * self.pixel_delta_v);

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample()
        };
        let ray_direction = (pixel_sample - ray_origin).normalize();

        Ray::new(ray_origin, ray_direction)
    }

    /// Generate random offset within [-0.5, 0.5] square for pixel sampling.
    fn sample_square(&self) -> Vec3A {
        Vec3A::new(random::random_f32() - 0.5, random::random_f32() - 0.5, 0.0)
    }

    /// Sample random point on the defocus disk for depth-of-field blur.
    fn defocus_disk_sample(&self) -> Vec3A {
        let p = random::random_in_unit_disk();
        self.center + (p.x * self.defocus_disk_u) + (p.y * self.defocus_disk_v)
    }

    /// Mix the base seed with the pixel coordinates.
    ///
    /// SplitMix64 finalizer, so neighbouring pixels land on uncorrelated
    /// PRNG streams.
    fn pixel_seed(&self, x: u32, y: u32) -> u64 {
        let mut h = self.seed ^ (((x as u64) << 32) | y as u64);
        h = (h ^ (h >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        h = (h ^ (h >> 27)).wrapping_mul(0x94d049bb133111eb);
        h ^ (h >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monte_carlo::{MonteCarloConfig, MonteCarloRenderer};
    use crate::test_scenes;

    fn small_camera() -> Camera {
        let mut camera = Camera::new();
        camera.image_width = 8;
        camera.image_height = 8;
        camera.samples_per_pixel = 4;
        camera.vfov = 60.0;
        camera.lookfrom = Vec3A::new(0.0, 5.0, -0.5);
        camera.lookat = Vec3A::new(0.0, 4.0, -6.0);
        camera.seed = 42;
        camera
    }

    #[test]
    fn renders_expected_dimensions() {
        let scene = test_scenes::cornell_box();
        let renderer = MonteCarloRenderer::new(&scene, MonteCarloConfig::default());
        let image = small_camera().render(&renderer);
        assert_eq!(image.dimensions(), (8, 8));
    }

    #[test]
    fn render_is_reproducible() {
        let scene = test_scenes::cornell_box();
        let renderer = MonteCarloRenderer::new(&scene, MonteCarloConfig::default());
        let first = small_camera().render(&renderer);
        let second = small_camera().render(&renderer);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn camera_rays_are_unit_length() {
        let mut camera = small_camera();
        camera.initialize();
        crate::random::reseed(1);
        for i in 0..8 {
            for j in 0..8 {
                assert!(camera.get_ray(i, j).has_unit_direction());
            }
        }
    }

    #[test]
    fn pixel_seeds_differ_between_pixels() {
        let camera = small_camera();
        assert_ne!(camera.pixel_seed(0, 0), camera.pixel_seed(0, 1));
        assert_ne!(camera.pixel_seed(0, 0), camera.pixel_seed(1, 0));
    }
}
