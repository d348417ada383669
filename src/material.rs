//! Material system for the renderer.
//!
//! A single parameter block covers diffuse, emissive, mirror, transparent
//! and glossy surfaces; the integrators decide which lobes to evaluate from
//! the epsilon-thresholded classifiers.

use glam::Vec3A;

use crate::sampling::reflect;

/// RGB color type using Vec3A for SIMD optimization.
pub type Color = Vec3A;

/// Surface material parameters.
///
/// A material may simultaneously be reflective, transparent, diffuse and
/// specular; the integrators weight the lobes so the branches stay
/// disjoint. Construct with one of the helpers and adjust fields through
/// struct update syntax.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    /// Diffuse surface color/reflectance.
    pub albedo: Color,
    /// Radiated color, meaningful when `emissivity` is non-zero.
    pub emission: Color,
    /// Light intensity scale; zero for everything but light sources.
    pub emissivity: f32,
    /// Mirror reflection weight in [0, 1].
    pub reflectivity: f32,
    /// Refraction weight in [0, 1].
    pub transparency: f32,
    /// Refractive index of the interior, at least 1.
    pub refractive_index: f32,
    /// Phong lobe strength.
    pub specularity: f32,
    /// Phong lobe exponent.
    pub specular_exponent: f32,
}

impl Material {
    /// Matte surface with the given albedo.
    pub fn diffuse(albedo: Color) -> Self {
        Self {
            albedo,
            emission: Color::ZERO,
            emissivity: 0.0,
            reflectivity: 0.0,
            transparency: 0.0,
            refractive_index: 1.0,
            specularity: 0.0,
            specular_exponent: 75.0,
        }
    }

    /// Area light source radiating `emission` scaled by `emissivity`.
    pub fn emissive(emission: Color, emissivity: f32) -> Self {
        Self {
            emission,
            emissivity,
            ..Self::diffuse(Color::ONE)
        }
    }

    /// Mirror with the given reflection weight.
    pub fn mirror(albedo: Color, reflectivity: f32) -> Self {
        Self {
            reflectivity,
            ..Self::diffuse(albedo)
        }
    }

    /// Transparent surface such as glass or water.
    pub fn transparent(transparency: f32, refractive_index: f32) -> Self {
        Self {
            transparency,
            refractive_index,
            specularity: 1.0,
            ..Self::diffuse(Color::ONE)
        }
    }

    /// Whether this material radiates light.
    pub fn is_emissive(&self) -> bool {
        self.emissivity > f32::EPSILON
    }

    /// Whether this material has a mirror component.
    pub fn is_reflective(&self) -> bool {
        self.reflectivity > f32::EPSILON
    }

    /// Whether this material refracts light through itself.
    pub fn is_transparent(&self) -> bool {
        self.transparency > f32::EPSILON
    }

    /// Whether this material has a Phong specular lobe.
    pub fn is_specular(&self) -> bool {
        self.specularity > f32::EPSILON
    }

    /// The color this material radiates.
    pub fn emission_color(&self) -> Color {
        self.emissivity * self.emission
    }

    /// Lambertian reflection of `incoming_radiance` arriving along
    /// `in_direction` toward a viewer along `out_direction`.
    ///
    /// Both directions and the normal must be unit length; `in_direction`
    /// points toward the surface.
    pub fn diffuse_brdf(
        &self,
        in_direction: Vec3A,
        out_direction: Vec3A,
        normal: Vec3A,
        incoming_radiance: Color,
    ) -> Color {
        debug_assert!((in_direction.length_squared() - 1.0).abs() < 1e-4);
        debug_assert!((out_direction.length_squared() - 1.0).abs() < 1e-4);
        let _ = out_direction; // Lambertian lobe is view independent.
        (-in_direction).dot(normal).max(0.0) * incoming_radiance * self.albedo
    }

    /// Phong specular reflection of `incoming_radiance`.
    ///
    /// `in_direction` is the direction the light travels toward the
    /// surface; `out_direction` is the direction the viewing ray travels
    /// (also toward the surface). The lobe peaks when the mirrored light
    /// direction lines up with the path back to the viewer.
    pub fn specular_brdf(
        &self,
        in_direction: Vec3A,
        out_direction: Vec3A,
        normal: Vec3A,
        incoming_radiance: Color,
    ) -> Color {
        let mirrored = reflect(in_direction, normal);
        let alignment = mirrored.dot(-out_direction).max(0.0);
        self.specularity * alignment.powf(self.specular_exponent) * incoming_radiance
    }
}
