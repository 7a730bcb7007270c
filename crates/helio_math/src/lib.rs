// Re-export glam for convenience
pub use glam::*;

// Helio math types
mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::{Ray, RAY_BUMP_EPSILON};
pub use transform::Placement;
