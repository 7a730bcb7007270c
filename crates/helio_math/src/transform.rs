// Rigid placement of a primitive in world space.
//
// Primitives are defined around their local origin; a placement moves them
// with a rotation followed by a translation. Rotations preserve length, so
// ray parameters `t` agree between local and world space.

use glam::{Quat, Vec3, Vec4};
use crate::{Aabb, Ray};

/// Position and orientation of an object in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Placement {
    /// Create a placement from a position and a (not necessarily unit) rotation.
    ///
    /// A zero or non-finite rotation falls back to the identity.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        let rotation = Vec4::from(rotation)
            .try_normalize()
            .map_or(Quat::IDENTITY, Quat::from_vec4);
        Self { position, rotation }
    }

    /// Placement with translation only.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Map a world-space point into local space.
    #[inline]
    pub fn to_local_point(&self, p: Vec3) -> Vec3 {
        self.rotation.inverse() * (p - self.position)
    }

    /// Map a world-space ray into local space.
    #[inline]
    pub fn to_local_ray(&self, ray: &Ray) -> Ray {
        let inverse = self.rotation.inverse();
        Ray {
            origin: inverse * (ray.origin - self.position),
            direction: inverse * ray.direction,
        }
    }

    /// Map a local point into world space.
    #[inline]
    pub fn to_world_point(&self, p: Vec3) -> Vec3 {
        self.position + self.rotation * p
    }

    /// Map a local direction or normal into world space.
    ///
    /// Rotations are orthogonal, so normals transform like vectors.
    #[inline]
    pub fn to_world_vector(&self, v: Vec3) -> Vec3 {
        self.rotation * v
    }

    /// World-space bounding box of a local-space box.
    ///
    /// Computes the bounding box of all 8 transformed corners.
    pub fn transform_aabb(&self, local: &Aabb) -> Aabb {
        Aabb::enclosing(local.corners().into_iter().map(|c| self.to_world_point(c)))
    }
}
