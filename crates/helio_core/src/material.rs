//! Surface material descriptions.
//!
//! These are plain data populated by the scene loader. How each variant
//! scatters light lives in the renderer.

use helio_math::Vec3;

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// Emission magnitude above which a material counts as a light source.
pub const EMISSION_THRESHOLD: f32 = 1e-5;

/// Default index of refraction for dielectrics that do not specify one.
pub const DEFAULT_IOR: f32 = 1.5;

/// Surface material.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Lambertian reflector, or a pure emitter when `emission` is non-zero.
    Diffuse { color: Color, emission: Color },
    /// Perfect mirror tinted by `color`.
    Metallic { color: Color, emission: Color },
    /// Glass-like refractor; `color` tints light entering the medium.
    Dielectric { color: Color, ior: f32 },
}

impl Default for Material {
    fn default() -> Self {
        Material::diffuse(Color::splat(0.5))
    }
}

impl Material {
    /// Non-emissive diffuse material.
    pub fn diffuse(color: Color) -> Self {
        Material::Diffuse {
            color,
            emission: Color::ZERO,
        }
    }

    /// Diffuse light source.
    pub fn emitter(emission: Color) -> Self {
        Material::Diffuse {
            color: Color::ZERO,
            emission,
        }
    }

    /// Non-emissive mirror.
    pub fn metallic(color: Color) -> Self {
        Material::Metallic {
            color,
            emission: Color::ZERO,
        }
    }

    /// Dielectric with the given index of refraction.
    pub fn dielectric(color: Color, ior: f32) -> Self {
        Material::Dielectric { color, ior }
    }

    /// Surface tint.
    pub fn color(&self) -> Color {
        match self {
            Material::Diffuse { color, .. }
            | Material::Metallic { color, .. }
            | Material::Dielectric { color, .. } => *color,
        }
    }

    /// Emitted radiance (zero for dielectrics).
    pub fn emission(&self) -> Color {
        match self {
            Material::Diffuse { emission, .. } | Material::Metallic { emission, .. } => *emission,
            Material::Dielectric { .. } => Color::ZERO,
        }
    }

    /// Check if this material is a light source.
    pub fn is_emissive(&self) -> bool {
        self.emission().length() > EMISSION_THRESHOLD
    }
}
