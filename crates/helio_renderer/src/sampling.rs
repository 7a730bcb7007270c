//! Random sampling helpers over an explicitly passed generator.
//!
//! Every function takes `&mut dyn RngCore` so callers can hand in whatever
//! per-thread generator they own.

use helio_math::Vec3;
use rand::{Rng, RngCore};
use std::f32::consts::TAU;

/// Uniform float in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Uniform float in `[min, max)`.
#[inline]
pub fn uniform(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    min + (max - min) * gen_f32(rng)
}

/// Uniform integer in `[min, max)`. Returns `min` for an empty range.
#[inline]
pub fn uniform_int(rng: &mut dyn RngCore, min: usize, max: usize) -> usize {
    if max <= min {
        return min;
    }
    rng.gen_range(min..max)
}

/// `true` with probability `p`.
#[inline]
pub fn bernoulli(rng: &mut dyn RngCore, p: f32) -> bool {
    gen_f32(rng) < p
}

/// Uniform point on the unit sphere.
pub fn on_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    let z = uniform(rng, -1.0, 1.0);
    let phi = uniform(rng, 0.0, TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}
