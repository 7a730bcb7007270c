//! How each material scatters light.
//!
//! Scattering is a single Monte Carlo step: pick one outgoing ray, ask the
//! integrator for the radiance along it, and weight the answer.

use std::f32::consts::PI;

use helio_core::{Color, Intersection, Material};
use helio_math::{Ray, Vec3};
use rand::RngCore;

use crate::distribution::MixedDistribution;
use crate::error::{RenderError, RenderResult};
use crate::sampling::bernoulli;

/// Continuation that traces a ray one bounce deeper.
pub type Trace<'t> = dyn FnMut(&Ray, &mut dyn RngCore) -> RenderResult<Color> + 't;

/// Scene-wide inputs to scattering.
#[derive(Debug, Clone, Copy)]
pub struct ScatterContext<'a> {
    pub lights: &'a MixedDistribution,
    pub ambient: Color,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Scatter {
    /// Radiance leaving the surface towards the origin of `ray_in`.
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &Intersection,
        ctx: &ScatterContext<'_>,
        rng: &mut dyn RngCore,
        trace: &mut Trace<'_>,
    ) -> RenderResult<Color>;
}

impl Scatter for Material {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &Intersection,
        ctx: &ScatterContext<'_>,
        rng: &mut dyn RngCore,
        trace: &mut Trace<'_>,
    ) -> RenderResult<Color> {
        let position = ray_in.at(hit.t);
        let normal = hit.normal;

        match *self {
            Material::Diffuse { color, emission } => {
                // Lights are pure emitters
                if self.is_emissive() {
                    return Ok(emission);
                }

                let ambient = ctx.ambient * color;
                let direction = ctx.lights.sample(position, normal, rng);
                let cos = normal.dot(direction);
                // Below the surface only the ambient term survives
                if cos <= 0.0 {
                    return Ok(ambient);
                }

                let pdf = ctx.lights.pdf(position, normal, direction);
                if !(pdf > 0.0) || !pdf.is_finite() {
                    return Err(RenderError::InconsistentPdf {
                        position,
                        direction,
                        pdf,
                    });
                }

                let incoming = trace(&Ray::new(position, direction).bump(), rng)?;
                Ok(emission + ambient + color / PI * incoming * cos / pdf)
            }

            Material::Metallic { color, emission } => {
                let reflected = Ray::new(position, reflect(ray_in.direction, normal)).bump();
                Ok(emission + color * trace(&reflected, rng)?)
            }

            Material::Dielectric { color, ior } => {
                let d = ray_in.direction;
                let k = if hit.inside { ior } else { 1.0 / ior };
                let cos1 = normal.dot(-d);
                let sin2 = k * (1.0 - cos1 * cos1).max(0.0).sqrt();
                let cos2 = (1.0 - sin2 * sin2).sqrt();

                let cannot_refract = !(sin2 <= 1.0) || !cos2.is_finite();
                if cannot_refract || bernoulli(rng, reflectance(cos1, ior)) {
                    let reflected = Ray::new(position, reflect(d, normal)).bump();
                    return trace(&reflected, rng);
                }

                let refracted = Ray::new(position, refract(d, normal, k, cos1, cos2)).bump();
                let radiance = trace(&refracted, rng)?;
                // Only light entering the medium picks up its tint
                Ok(if hit.inside { radiance } else { color * radiance })
            }
        }
    }
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract `d` through a surface with relative index `k`.
#[inline]
fn refract(d: Vec3, n: Vec3, k: f32, cos1: f32, cos2: f32) -> Vec3 {
    (k * d + (k * cos1 - cos2) * n).normalize_or_zero()
}

/// Schlick's approximation for reflectance
#[inline]
fn reflectance(cosine: f32, ior: f32) -> f32 {
    let r0 = ((ior - 1.0) / (ior + 1.0)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
