//! Helio Renderer - CPU Monte Carlo path tracing.
//!
//! Renders a [`helio_core::SceneDescription`] with a depth-bounded path
//! tracer. Diffuse bounces mix cosine-weighted sampling with sampling toward
//! emitters; metals reflect and dielectrics reflect or refract stochastically.
//!
//! # Example
//!
//! ```ignore
//! use helio_renderer::{render_scene, SceneIndex};
//!
//! let scene = helio_core::load_scene("scene.txt")?;
//! let index = SceneIndex::build(scene.objects, scene.setup.leaf_size);
//! let image = render_scene(&index, &scene.camera, &scene.setup)?;
//! image.to_rgb8().save("out.png")?;
//! ```

pub mod bvh;
pub mod distribution;
mod error;
mod index;
mod integrator;
pub mod light;
mod material;
pub mod query;
mod renderer;
pub mod sampling;

pub use bvh::{Bvh, BvhNode, BvhQuery, DEFAULT_LEAF_SIZE, LEAF_BUMP, MAX_SPLIT_ATTEMPTS};
pub use distribution::{MixedDistribution, COSINE_WEIGHT};
pub use error::{RenderError, RenderResult};
pub use index::SceneIndex;
pub use integrator::Integrator;
pub use light::LightDistribution;
pub use material::{Scatter, ScatterContext, Trace};
pub use query::{ClosestHit, Hit, LightPdf};
pub use renderer::{aces, color_to_display, color_to_rgb8, linear_to_gamma, render_scene, ImageBuffer};

/// Re-export common math and color types
pub use helio_core::Color;
pub use helio_math::{Aabb, Ray, Vec3};
