use crate::Vec3;

/// Distance a scattered ray's origin is pushed along its direction.
///
/// Sized for `f32` scenes of roughly unit scale.
pub const RAY_BUMP_EPSILON: f32 = 1e-4;

/// A ray in 3D space with an origin and a unit-length direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray. The direction is normalized.
    ///
    /// A zero-length direction stays zero, which every intersection
    /// routine treats as "no hit".
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Nudge the origin along the direction so the ray does not
    /// immediately re-hit the surface it leaves.
    #[inline]
    pub fn bump(mut self) -> Self {
        self.origin += self.direction * RAY_BUMP_EPSILON;
        self
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!((ray.direction - Vec3::new(0.0, 0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_ray_zero_direction() {
        let ray = Ray::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(ray.direction, Vec3::ZERO);
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_bump() {
        let ray = Ray::new(Vec3::new(1.0, 0.0, 0.0), Vec3::Y).bump();
        assert_eq!(ray.origin, Vec3::new(1.0, RAY_BUMP_EPSILON, 0.0));
        assert_eq!(ray.direction, Vec3::Y);
    }

    #[test]
    fn test_ray_copy() {
        let ray1 = Ray::new(Vec3::ZERO, Vec3::Y);
        let ray2 = ray1; // Copy, not move

        assert_eq!(ray1.origin, ray2.origin);
        assert_eq!(ray1.at(1.0), ray2.at(1.0));
    }
}
