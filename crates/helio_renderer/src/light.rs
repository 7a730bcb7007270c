//! Area sampling of emissive shapes.
//!
//! A [`LightDistribution`] draws points on one emitter's surface and reports
//! the density of that draw, first per unit area and then, for a ray leaving
//! a shading point, per unit solid angle.

use std::f32::consts::PI;
use std::sync::Arc;

use helio_core::{Geometry, Shape};
use helio_math::{Aabb, Ray, Vec3};
use rand::RngCore;

use crate::sampling::{bernoulli, gen_f32, on_unit_sphere, uniform};

/// Hits more grazing than this contribute no solid-angle density.
const GRAZING_COS: f32 = 1e-6;

/// Per-shape sampling parameters, in the shape's local frame.
#[derive(Debug, Clone, PartialEq)]
enum AreaSampler {
    /// Face pair areas per axis and the total surface area.
    Box {
        half_size: Vec3,
        pair_areas: [f32; 3],
        total_area: f32,
    },
    Triangle { a: Vec3, b: Vec3, c: Vec3, area: f32 },
    Ellipsoid { radii: Vec3 },
}

/// Sampling distribution over the surface of one bounded emitter.
#[derive(Debug, Clone)]
pub struct LightDistribution {
    geometry: Arc<Geometry>,
    sampler: AreaSampler,
}

impl LightDistribution {
    /// Distribution for a bounded shape with non-zero area.
    ///
    /// Returns `None` for planes and degenerate shapes.
    pub fn new(geometry: Arc<Geometry>) -> Option<Self> {
        let sampler = match geometry.shape {
            Shape::Plane { .. } => return None,
            Shape::Box { half_size } => {
                let s = half_size.abs();
                let pair_areas = [8.0 * s.y * s.z, 8.0 * s.x * s.z, 8.0 * s.x * s.y];
                let total_area: f32 = pair_areas.iter().sum();
                if !(total_area > 0.0) {
                    return None;
                }
                AreaSampler::Box {
                    half_size: s,
                    pair_areas,
                    total_area,
                }
            }
            Shape::Triangle { a, b, c } => {
                let area = 0.5 * (b - a).cross(c - a).length();
                if !(area > 0.0) {
                    return None;
                }
                AreaSampler::Triangle { a, b, c, area }
            }
            Shape::Ellipsoid { radii } => {
                if radii.min_element() <= 0.0 {
                    return None;
                }
                AreaSampler::Ellipsoid { radii }
            }
        };
        Some(Self { geometry, sampler })
    }

    /// The emitter's placed geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// World-space bounds of the emitter.
    pub fn bounding_box(&self) -> Aabb {
        self.geometry.bounding_box().unwrap_or(Aabb::EMPTY)
    }

    /// Draw a point on the surface, in local coordinates.
    pub fn sample_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        match &self.sampler {
            AreaSampler::Box {
                half_size,
                pair_areas,
                total_area,
            } => {
                // Pick a face pair by area, then one face of the pair
                let pick = gen_f32(rng) * total_area;
                let axis = if pick < pair_areas[0] {
                    0
                } else if pick < pair_areas[0] + pair_areas[1] {
                    1
                } else {
                    2
                };
                let mut p = Vec3::new(
                    uniform(rng, -half_size.x, half_size.x),
                    uniform(rng, -half_size.y, half_size.y),
                    uniform(rng, -half_size.z, half_size.z),
                );
                p[axis] = if bernoulli(rng, 0.5) {
                    half_size[axis]
                } else {
                    -half_size[axis]
                };
                p
            }
            AreaSampler::Triangle { a, b, c, .. } => {
                let (mut u, mut v) = (gen_f32(rng), gen_f32(rng));
                if u + v > 1.0 {
                    u = 1.0 - u;
                    v = 1.0 - v;
                }
                *a + u * (*b - *a) + v * (*c - *a)
            }
            AreaSampler::Ellipsoid { radii } => *radii * on_unit_sphere(rng),
        }
    }

    /// Density of [`sample_point`](Self::sample_point) per unit area at a local surface point.
    pub fn area_density(&self, local_point: Vec3) -> f32 {
        match &self.sampler {
            AreaSampler::Box { total_area, .. } => 1.0 / total_area,
            AreaSampler::Triangle { area, .. } => 1.0 / area,
            AreaSampler::Ellipsoid { radii: r } => {
                // Area element of the sphere-to-ellipsoid map at u
                let u = (local_point / *r).normalize_or_zero();
                let stretch = (u.x * u.x * r.y * r.y * r.z * r.z
                    + r.x * r.x * u.y * u.y * r.z * r.z
                    + r.x * r.x * r.y * r.y * u.z * u.z)
                    .sqrt();
                1.0 / (4.0 * PI * stretch)
            }
        }
    }

    /// Unit direction from `position` towards a freshly sampled surface point.
    pub fn sample(&self, position: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let local = self.sample_point(rng);
        let world = self.geometry.placement.to_world_point(local);
        (world - position).normalize_or_zero()
    }

    /// Solid-angle density of [`sample`](Self::sample) along `ray`.
    ///
    /// Sums the converted area density over every crossing of the surface.
    pub fn solid_angle_pdf(&self, ray: &Ray) -> f32 {
        self.geometry
            .intersect_all(ray)
            .iter()
            .filter_map(|hit| {
                let cos = hit.intersection.normal.dot(ray.direction).abs();
                if cos < GRAZING_COS {
                    return None;
                }
                let t = hit.intersection.t;
                Some(self.area_density(hit.local_point) * t * t / cos)
            })
            .sum()
    }
}
