//! Render-time acceleration structures for a scene.

use helio_core::{SceneObject, Shape};
use helio_math::{Aabb, Ray};

use crate::bvh::{Bvh, BvhQuery};
use crate::distribution::MixedDistribution;
use crate::light::LightDistribution;
use crate::query::{ClosestHit, Hit};

/// Everything the integrator queries: the object BVH, the unbounded objects
/// that cannot live in it, and the light sampling distribution.
#[derive(Debug, Clone)]
pub struct SceneIndex {
    objects: Bvh<SceneObject>,
    unbounded: Vec<SceneObject>,
    lights: MixedDistribution,
}

impl SceneIndex {
    /// Build the index once, before rendering.
    pub fn build(objects: Vec<SceneObject>, leaf_size: usize) -> Self {
        let mut bounded = Vec::with_capacity(objects.len());
        let mut unbounded = Vec::new();
        let mut lights = Vec::new();

        for object in objects {
            if object.material.is_emissive() {
                match LightDistribution::new(object.geometry.clone()) {
                    Some(light) => lights.push(light),
                    None if matches!(object.geometry.shape, Shape::Plane { .. }) => {
                        log::warn!("Emissive plane is visible but cannot be sampled as a light")
                    }
                    None => log::warn!("Degenerate emitter skipped for light sampling"),
                }
            }

            if object.geometry.shape.is_bounded() {
                bounded.push(object);
            } else {
                unbounded.push(object);
            }
        }

        let objects = Bvh::build(bounded, leaf_size, |object| {
            object.bounding_box().unwrap_or(Aabb::EMPTY)
        });
        let lights = MixedDistribution::new(lights, leaf_size);

        log::info!(
            "Scene index: {} objects in {} BVH nodes (depth {}), {} unbounded, {} lights",
            objects.len(),
            objects.node_count(),
            objects.depth(),
            unbounded.len(),
            lights.light_count()
        );

        Self {
            objects,
            unbounded,
            lights,
        }
    }

    /// Nearest hit over the BVH and the unbounded objects.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        let bounded = self.objects.query(ray, &ClosestHit);
        ClosestHit.merge(bounded, ClosestHit.fold(&self.unbounded, ray))
    }

    pub fn objects(&self) -> &Bvh<SceneObject> {
        &self.objects
    }

    pub fn unbounded(&self) -> &[SceneObject] {
        &self.unbounded
    }

    /// Light sampling distribution for diffuse bounces.
    pub fn lights(&self) -> &MixedDistribution {
        &self.lights
    }
}
