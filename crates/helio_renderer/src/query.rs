//! The two traversals the renderer runs over its BVHs.

use helio_core::{Intersection, SceneObject};
use helio_math::Ray;

use crate::bvh::BvhQuery;
use crate::light::LightDistribution;

/// A ray hit together with the object that produced it.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    pub object: &'a SceneObject,
    pub intersection: Intersection,
}

/// Nearest intersection along a ray.
///
/// Subtrees entered beyond the best hit so far are pruned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestHit;

impl ClosestHit {
    /// Fold a list of objects without any acceleration.
    pub fn fold<'a, I>(&self, objects: I, ray: &Ray) -> Option<Hit<'a>>
    where
        I: IntoIterator<Item = &'a SceneObject>,
    {
        objects
            .into_iter()
            .fold(self.identity(), |acc, object| self.merge(acc, self.map(object, ray)))
    }
}

impl<'a> BvhQuery<'a, SceneObject> for ClosestHit {
    type Output = Option<Hit<'a>>;

    fn identity(&self) -> Self::Output {
        None
    }

    fn map(&self, object: &'a SceneObject, ray: &Ray) -> Self::Output {
        object
            .intersect(ray)
            .map(|intersection| Hit { object, intersection })
    }

    fn merge(&self, a: Self::Output, b: Self::Output) -> Self::Output {
        match (a, b) {
            (Some(a), Some(b)) => Some(if b.intersection.t < a.intersection.t { b } else { a }),
            (a, None) => a,
            (None, b) => b,
        }
    }

    fn early_out(&self, acc: &Self::Output, entry: f32) -> bool {
        acc.is_some_and(|hit| hit.intersection.t < entry)
    }
}

/// Sum of the solid-angle densities of every light along a ray.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightPdf;

impl<'a> BvhQuery<'a, LightDistribution> for LightPdf {
    type Output = f32;

    fn identity(&self) -> f32 {
        0.0
    }

    fn map(&self, light: &'a LightDistribution, ray: &Ray) -> f32 {
        light.solid_angle_pdf(ray)
    }

    fn merge(&self, a: f32, b: f32) -> f32 {
        a + b
    }
}
