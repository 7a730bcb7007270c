//! Pinhole camera for primary ray generation.

use helio_math::{Ray, Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Pinhole camera described by an orthonormal frame and a horizontal field of view.
///
/// The vertical field of view follows from the image aspect ratio:
/// `tan(fov_y / 2) = tan(fov_x / 2) * height / width`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
    /// Horizontal field of view in radians
    pub fov_x: f32,
}

impl Camera {
    /// Camera at the origin looking down -Z with a 90 degree field of view.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            right: Vec3::X,
            up: Vec3::Y,
            forward: -Vec3::Z,
            fov_x: FRAC_PI_2,
        }
    }

    /// Set camera position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the camera frame.
    pub fn with_orientation(mut self, right: Vec3, up: Vec3, forward: Vec3) -> Self {
        self.right = right;
        self.up = up;
        self.forward = forward;
        self
    }

    /// Set horizontal field of view (radians).
    pub fn with_fov_x(mut self, fov_x: f32) -> Self {
        self.fov_x = fov_x;
        self
    }

    /// Vertical field of view for an image of the given size.
    pub fn fov_y(&self, width: u32, height: u32) -> f32 {
        2.0 * (height as f32 * (self.fov_x / 2.0).tan() / width as f32).atan()
    }

    /// Ray through normalized screen coordinates `x, y` in `[-1, 1]`, +y up.
    pub fn ray_through(&self, x: f32, y: f32, width: u32, height: u32) -> Ray {
        let tan_x = (self.fov_x / 2.0).tan();
        let tan_y = tan_x * height as f32 / width as f32;
        let direction = self.forward + self.up * (y * tan_y) + self.right * (x * tan_x);
        Ray::new(self.position, direction)
    }

    /// Ray through pixel `(px, py)` of a `width x height` image.
    ///
    /// `offset` in `[0, 1)^2` places the sample inside the pixel footprint;
    /// row 0 is the top of the image.
    pub fn pixel_ray(&self, px: u32, py: u32, offset: Vec2, width: u32, height: u32) -> Ray {
        let x01 = (px as f32 + offset.x) / width as f32;
        let y01 = (py as f32 + offset.y) / height as f32;
        self.ray_through(x01 * 2.0 - 1.0, -(y01 * 2.0 - 1.0), width, height)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
