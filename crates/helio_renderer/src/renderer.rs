//! Parallel image rendering and display conversion.
//!
//! Rows are rendered independently on the rayon thread pool, each with its
//! own generator seeded from the render seed and the row index, so a render
//! is reproducible for a given seed regardless of scheduling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use helio_core::{Camera, Color, RenderSetup};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::{RenderError, RenderResult};
use crate::index::SceneIndex;
use crate::integrator::Integrator;

/// Display gamma applied after tonemapping.
pub const DISPLAY_GAMMA: f32 = 2.2;

/// ACES filmic tonemapping curve (Narkowicz fit).
#[inline]
pub fn aces(x: f32) -> f32 {
    x * (2.51 * x + 0.03) / (x * (2.43 * x + 0.59) + 0.14)
}

/// Apply display gamma.
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.powf(1.0 / DISPLAY_GAMMA)
    } else {
        0.0
    }
}

/// Tonemap, gamma-correct and clamp a linear color to `[0, 1]`.
pub fn color_to_display(color: Color) -> Color {
    let map = |x: f32| linear_to_gamma(aces(x.max(0.0))).clamp(0.0, 1.0);
    Color::new(map(color.x), map(color.y), map(color.z))
}

/// Convert a linear color to 8-bit display RGB.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let display = color_to_display(color);
    [
        (255.0 * display.x).round() as u8,
        (255.0 * display.y).round() as u8,
        (255.0 * display.z).round() as u8,
    ]
}

/// Linear radiance estimates, row-major with row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[y as usize * self.width as usize + x as usize] = color;
    }

    /// Mean of all pixels.
    pub fn mean(&self) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }
        self.pixels.iter().copied().sum::<Color>() / self.pixels.len() as f32
    }

    /// Tonemapped display values in `[0, 1]`.
    pub fn to_display(&self) -> Vec<Color> {
        self.pixels.iter().map(|&c| color_to_display(c)).collect()
    }

    /// Convert to an 8-bit image for saving.
    pub fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| Rgb(color_to_rgb8(self.get(x, y))))
    }
}

/// Seed for one row's generator.
fn row_seed(seed: u64, row: usize) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(row as u64)
}

/// Render the scene to a buffer of linear radiance estimates.
///
/// The first sampling failure aborts the remaining rows and is returned.
pub fn render_scene(scene: &SceneIndex, camera: &Camera, setup: &RenderSetup) -> RenderResult<ImageBuffer> {
    if setup.width == 0 || setup.height == 0 {
        return Err(RenderError::EmptyImage);
    }

    let integrator = Integrator::new(scene, setup);
    let mut image = ImageBuffer::new(setup.width, setup.height);
    let rows = setup.height as usize;
    let report_every = (rows / 10).max(1);
    let rows_done = AtomicUsize::new(0);

    log::info!(
        "Rendering {}x{} at {} spp, max depth {}",
        setup.width,
        setup.height,
        setup.samples,
        setup.max_depth
    );
    let start = Instant::now();

    image
        .pixels
        .par_chunks_mut(setup.width as usize)
        .enumerate()
        .try_for_each(|(row, pixels)| -> RenderResult<()> {
            let mut rng = StdRng::seed_from_u64(row_seed(setup.seed, row));
            for (x, pixel) in pixels.iter_mut().enumerate() {
                *pixel = integrator.render_pixel(camera, x as u32, row as u32, setup, &mut rng)?;
            }

            let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
            if done % report_every == 0 || done == rows {
                log::info!("Rendered {}% ({done}/{rows} rows)", done * 100 / rows);
            }
            Ok(())
        })?;

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}
