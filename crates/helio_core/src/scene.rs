//! Scene model shared by the loader and the renderer.

use std::sync::Arc;

use helio_math::{Aabb, Ray};

use crate::camera::Camera;
use crate::geometry::{Geometry, Intersection};
use crate::material::{Color, Material};

/// Render settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSetup {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Samples per pixel
    pub samples: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Radiance of rays that escape or run out of depth
    pub background: Color,
    /// Constant ambient term added at diffuse bounces
    pub ambient: Color,
    /// Maximum elements per BVH leaf
    pub leaf_size: usize,
    /// Base seed for the per-row random generators
    pub seed: u64,
}

impl Default for RenderSetup {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            samples: 64,
            max_depth: 6,
            background: Color::ZERO,
            ambient: Color::ZERO,
            leaf_size: 8,
            seed: 0,
        }
    }
}

/// An immutable pairing of geometry and material.
///
/// Handles are shared so light distributions can refer to the same geometry.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
}

impl SceneObject {
    /// Create a scene object.
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry: Arc::new(geometry),
            material: Arc::new(material),
        }
    }

    /// Create a scene object from shared handles.
    pub fn from_shared(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self { geometry, material }
    }

    /// Nearest intersection with this object.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        self.geometry.intersect(ray)
    }

    /// World-space bounding box (`None` for unbounded shapes).
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.geometry.bounding_box()
    }
}

/// Everything needed to render: settings, camera and objects.
#[derive(Debug, Clone, Default)]
pub struct SceneDescription {
    pub setup: RenderSetup,
    pub camera: Camera,
    pub objects: Vec<SceneObject>,
}

impl SceneDescription {
    /// Number of objects in the scene.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of objects with an emissive material.
    pub fn emitter_count(&self) -> usize {
        self.objects.iter().filter(|o| o.material.is_emissive()).count()
    }
}
