//! Triangle mesh import from JSON.
//!
//! The format is a flat position array and a flat index array, every three
//! indices forming one triangle:
//!
//! ```json
//! { "positions": [0, 0, 0,  1, 0, 0,  0, 1, 0], "indices": [0, 1, 2] }
//! ```

use std::path::Path;

use helio_math::{Aabb, Vec3};
use serde::Deserialize;

use crate::loader::{SceneError, SceneResult};

/// On-disk layout of a JSON mesh.
#[derive(Deserialize)]
struct MeshFile {
    positions: Vec<f32>,
    indices: Vec<u32>,
}

/// An indexed triangle mesh.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a mesh, validating that indices form whole, in-range triangles.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> SceneResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(SceneError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(SceneError::InvalidMesh(format!(
                "index {bad} out of range for {} vertices",
                positions.len()
            )));
        }

        let bounds = Aabb::enclosing(positions.iter().copied());
        Ok(Self {
            positions,
            indices,
            bounds,
        })
    }

    /// Parse a mesh from a JSON string.
    pub fn from_json_str(source: &str) -> SceneResult<Self> {
        let file: MeshFile = serde_json::from_str(source)?;
        if file.positions.len() % 3 != 0 {
            return Err(SceneError::InvalidMesh(format!(
                "position component count {} is not a multiple of 3",
                file.positions.len()
            )));
        }

        let positions = file
            .positions
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect();
        Self::new(positions, file.indices)
    }

    /// Load a mesh from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> SceneResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let mesh = Self::from_json_str(&source)?;
        log::info!(
            "Loaded mesh {}: {} vertices, {} triangles",
            path.as_ref().display(),
            mesh.positions.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Get the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over triangle vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = r#"{
        "positions": [0, 0, 0,  1, 0, 0,  1, 1, 0,  0, 1, 0],
        "indices": [0, 1, 2,  0, 2, 3]
    }"#;

    #[test]
    fn test_parse_quad() {
        let mesh = Mesh::from_json_str(QUAD).unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);

        let tris: Vec<_> = mesh.triangles().collect();
        assert_eq!(tris[1], [Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec3::Y]);
        assert_eq!(mesh.bounds.x.max, 1.0);
    }

    #[test]
    fn test_out_of_range_index() {
        let err = Mesh::from_json_str(r#"{"positions": [0,0,0], "indices": [0, 0, 1]}"#).unwrap_err();
        assert!(matches!(err, SceneError::InvalidMesh(_)));
    }

    #[test]
    fn test_partial_triangle() {
        let err = Mesh::new(vec![Vec3::ZERO, Vec3::X], vec![0, 1]).unwrap_err();
        assert!(matches!(err, SceneError::InvalidMesh(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = Mesh::from_json_str("{\"positions\": [").unwrap_err();
        assert!(matches!(err, SceneError::Mesh(_)));
    }
}
