//! Recursive radiance estimation.

use helio_core::{Camera, Color, RenderSetup};
use helio_math::{Ray, Vec2};
use rand::RngCore;

use crate::error::RenderResult;
use crate::index::SceneIndex;
use crate::material::{Scatter, ScatterContext};
use crate::sampling::gen_f32;

/// Depth-bounded path tracing estimator over a built scene.
#[derive(Debug, Clone, Copy)]
pub struct Integrator<'a> {
    scene: &'a SceneIndex,
    background: Color,
    ambient: Color,
}

impl<'a> Integrator<'a> {
    pub fn new(scene: &'a SceneIndex, setup: &RenderSetup) -> Self {
        Self {
            scene,
            background: setup.background,
            ambient: setup.ambient,
        }
    }

    /// Compute the radiance arriving along `ray` with `depth` bounces left.
    pub fn radiance(&self, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> RenderResult<Color> {
        if depth == 0 {
            return Ok(self.background);
        }

        let Some(hit) = self.scene.intersect(ray) else {
            return Ok(self.background);
        };

        let ctx = ScatterContext {
            lights: self.scene.lights(),
            ambient: self.ambient,
        };
        hit.object.material.scatter(
            ray,
            &hit.intersection,
            &ctx,
            rng,
            &mut |next: &Ray, rng: &mut dyn RngCore| self.radiance(next, depth - 1, rng),
        )
    }

    /// Mean of `setup.samples` jittered estimates through pixel `(x, y)`.
    pub fn render_pixel(
        &self,
        camera: &Camera,
        x: u32,
        y: u32,
        setup: &RenderSetup,
        rng: &mut dyn RngCore,
    ) -> RenderResult<Color> {
        let samples = setup.samples.max(1);
        let mut pixel_color = Color::ZERO;

        for _ in 0..samples {
            let offset = Vec2::new(gen_f32(rng), gen_f32(rng));
            let ray = camera.pixel_ray(x, y, offset, setup.width, setup.height);
            pixel_color += self.radiance(&ray, setup.max_depth, rng)?;
        }

        Ok(pixel_color / samples as f32)
    }
}
