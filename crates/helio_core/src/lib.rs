//! Helio Core - Scene description for the Helio path tracer.
//!
//! This crate provides:
//!
//! - **Geometry**: planes, boxes, ellipsoids and triangles with rigid placements
//! - **Materials**: diffuse, metallic and dielectric surface descriptions
//! - **Scene loading**: the keyword scene format and JSON triangle meshes
//!
//! # Example
//!
//! ```ignore
//! use helio_core::load_scene;
//!
//! let scene = load_scene("scenes/cornell.txt")?;
//! println!("Loaded {} objects, {} emissive",
//!     scene.object_count(),
//!     scene.emitter_count());
//! ```

pub mod camera;
pub mod geometry;
pub mod loader;
pub mod material;
pub mod mesh;
pub mod scene;

// Re-export commonly used types
pub use camera::Camera;
pub use geometry::{Geometry, Intersection, Shape, SurfaceHit};
pub use loader::{load_scene, load_scene_from_str, SceneError, SceneResult};
pub use material::{Color, Material, DEFAULT_IOR, EMISSION_THRESHOLD};
pub use mesh::Mesh;
pub use scene::{RenderSetup, SceneDescription, SceneObject};
