//! Direction sampling for diffuse bounces.
//!
//! Mixes cosine-weighted hemisphere sampling with sampling toward the
//! scene's emitters (one-sample multiple importance sampling).

use std::f32::consts::PI;

use helio_math::{Ray, Vec3};
use rand::RngCore;

use crate::bvh::Bvh;
use crate::light::LightDistribution;
use crate::query::LightPdf;
use crate::sampling::{bernoulli, on_unit_sphere, uniform_int};

/// Probability of drawing from the cosine lobe when lights are present.
pub const COSINE_WEIGHT: f32 = 0.5;

/// Cosine-weighted direction around `normal`.
pub fn cosine_sample(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let d = (normal + on_unit_sphere(rng)).normalize_or_zero();
    if d == Vec3::ZERO {
        normal
    } else {
        d
    }
}

/// Density of [`cosine_sample`] per unit solid angle.
#[inline]
pub fn cosine_pdf(normal: Vec3, direction: Vec3) -> f32 {
    normal.dot(direction).max(0.0) / PI
}

/// Cosine lobe mixed with uniform light selection.
#[derive(Debug, Clone)]
pub struct MixedDistribution {
    lights: Bvh<LightDistribution>,
}

impl MixedDistribution {
    /// Index the given lights for pdf queries.
    pub fn new(lights: Vec<LightDistribution>, leaf_size: usize) -> Self {
        Self {
            lights: Bvh::build(lights, leaf_size, LightDistribution::bounding_box),
        }
    }

    /// Number of emitters that can be sampled.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// The light sampling index.
    pub fn lights(&self) -> &Bvh<LightDistribution> {
        &self.lights
    }

    /// Draw a unit direction leaving `position`.
    pub fn sample(&self, position: Vec3, normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let count = self.light_count();
        if count == 0 || bernoulli(rng, COSINE_WEIGHT) {
            return cosine_sample(normal, rng);
        }
        let light = &self.lights.elements()[uniform_int(rng, 0, count)];
        light.sample(position, rng)
    }

    /// Density of [`sample`](Self::sample) for `direction`, per unit solid angle.
    pub fn pdf(&self, position: Vec3, normal: Vec3, direction: Vec3) -> f32 {
        let cosine = cosine_pdf(normal, direction);
        let count = self.light_count();
        if count == 0 {
            return cosine;
        }
        let light = self.lights.query(&Ray::new(position, direction), &LightPdf) / count as f32;
        COSINE_WEIGHT * cosine + (1.0 - COSINE_WEIGHT) * light
    }
}
