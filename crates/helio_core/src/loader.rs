//! Token-stream scene loader.
//!
//! A scene file is a sequence of whitespace-separated keywords, each followed
//! by its numeric arguments. Global keywords set up the render and camera;
//! `NEW_PRIMITIVE` opens a primitive that the following keywords describe.
//!
//! # Supported Keywords
//!
//! - `DIMENSIONS w h`, `BG_COLOR r g b`, `AMBIENT_LIGHT r g b`
//! - `RAY_DEPTH n`, `SAMPLES n`
//! - `CAMERA_POSITION|CAMERA_RIGHT|CAMERA_UP|CAMERA_FORWARD x y z`, `CAMERA_FOV_X radians`
//! - `NEW_PRIMITIVE`
//! - `PLANE nx ny nz`, `ELLIPSOID rx ry rz`, `BOX sx sy sz`
//! - `TRIANGLE ax ay az bx by bz cx cy cz`, `MESH path.json`
//! - `POSITION x y z`, `ROTATION x y z w`, `COLOR r g b`
//! - `METALLIC`, `DIELECTRIC`, `IOR f`, `EMISSION r g b`
//!
//! Unknown keywords and misplaced properties are logged and skipped.

use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::SplitWhitespace;
use std::sync::Arc;

use helio_math::{Placement, Quat, Vec3, Vec4};
use thiserror::Error;

use crate::geometry::{Geometry, Shape};
use crate::material::{Color, Material, DEFAULT_IOR};
use crate::mesh::Mesh;
use crate::scene::{SceneDescription, SceneObject};

/// Errors that can occur while loading a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid number for {token}: {value:?}")]
    InvalidNumber { token: String, value: String },

    #[error("Unexpected end of input while reading {token}")]
    UnexpectedEof { token: String },

    #[error("Mesh parse error: {0}")]
    Mesh(#[from] serde_json::Error),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
}

/// Result type for scene loading.
pub type SceneResult<T> = Result<T, SceneError>;

/// Load a scene file. `MESH` paths resolve against the file's directory.
pub fn load_scene<P: AsRef<Path>>(path: P) -> SceneResult<SceneDescription> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let scene = SceneLoader::new(&source, path.parent().map(Path::to_path_buf)).parse()?;
    log::info!(
        "Loaded scene {}: {} objects, {} emissive",
        path.display(),
        scene.object_count(),
        scene.emitter_count()
    );
    Ok(scene)
}

/// Load a scene from a string. `MESH` paths resolve against the working directory.
pub fn load_scene_from_str(source: &str) -> SceneResult<SceneDescription> {
    SceneLoader::new(source, None).parse()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum MaterialKind {
    #[default]
    Diffuse,
    Metallic,
    Dielectric,
}

/// Properties accumulated for the primitive being described.
#[derive(Default)]
struct PrimitiveBuilder {
    shapes: Vec<Shape>,
    position: Vec3,
    rotation: Quat,
    kind: MaterialKind,
    color: Color,
    emission: Option<Color>,
    ior: Option<f32>,
}

impl PrimitiveBuilder {
    fn material(&self, index: usize) -> Material {
        let emission = self.emission.unwrap_or(Color::ZERO);
        match self.kind {
            MaterialKind::Diffuse => {
                if self.ior.is_some() {
                    log::warn!("Primitive {index}: IOR ignored on a diffuse material");
                }
                Material::Diffuse {
                    color: self.color,
                    emission,
                }
            }
            MaterialKind::Metallic => {
                if self.ior.is_some() {
                    log::warn!("Primitive {index}: IOR ignored on a metallic material");
                }
                Material::Metallic {
                    color: self.color,
                    emission,
                }
            }
            MaterialKind::Dielectric => {
                if self.emission.is_some() {
                    log::warn!("Primitive {index}: EMISSION ignored on a dielectric material");
                }
                Material::Dielectric {
                    color: self.color,
                    ior: self.ior.unwrap_or(DEFAULT_IOR),
                }
            }
        }
    }

    /// Turn the description into scene objects, sharing one material handle.
    fn finish(self, index: usize) -> Vec<SceneObject> {
        if self.shapes.is_empty() {
            log::warn!("Primitive {index} has no shape, skipping");
            return Vec::new();
        }

        let material = Arc::new(self.material(index));
        let placement = Placement::new(self.position, self.rotation);
        self.shapes
            .into_iter()
            .map(|shape| {
                SceneObject::from_shared(Arc::new(Geometry::new(shape, placement)), material.clone())
            })
            .collect()
    }
}

/// Streaming parser state.
struct SceneLoader<'a> {
    tokens: Peekable<SplitWhitespace<'a>>,
    base_dir: Option<PathBuf>,
    scene: SceneDescription,
    current: Option<PrimitiveBuilder>,
    primitive_count: usize,
}

impl<'a> SceneLoader<'a> {
    fn new(source: &'a str, base_dir: Option<PathBuf>) -> Self {
        Self {
            tokens: source.split_whitespace().peekable(),
            base_dir,
            scene: SceneDescription::default(),
            current: None,
            primitive_count: 0,
        }
    }

    fn parse(mut self) -> SceneResult<SceneDescription> {
        while let Some(token) = self.tokens.next() {
            self.parse_token(token)?;
        }
        self.finish_primitive();
        Ok(self.scene)
    }

    fn parse_token(&mut self, token: &str) -> SceneResult<()> {
        match token {
            "DIMENSIONS" => {
                self.scene.setup.width = self.next_u32(token)?;
                self.scene.setup.height = self.next_u32(token)?;
            }
            "BG_COLOR" => self.scene.setup.background = self.next_vec3(token)?,
            "AMBIENT_LIGHT" => self.scene.setup.ambient = self.next_vec3(token)?,
            "RAY_DEPTH" => self.scene.setup.max_depth = self.next_u32(token)?,
            "SAMPLES" => self.scene.setup.samples = self.next_u32(token)?,
            "CAMERA_POSITION" => self.scene.camera.position = self.next_vec3(token)?,
            "CAMERA_RIGHT" => self.scene.camera.right = self.next_vec3(token)?,
            "CAMERA_UP" => self.scene.camera.up = self.next_vec3(token)?,
            "CAMERA_FORWARD" => self.scene.camera.forward = self.next_vec3(token)?,
            "CAMERA_FOV_X" => self.scene.camera.fov_x = self.next_f32(token)?,

            "NEW_PRIMITIVE" => {
                self.finish_primitive();
                self.current = Some(PrimitiveBuilder::default());
            }

            "PLANE" => {
                let normal = self.next_vec3(token)?;
                self.set_shape(token, Shape::plane(normal));
            }
            "ELLIPSOID" => {
                let radii = self.next_vec3(token)?;
                self.set_shape(token, Shape::Ellipsoid { radii });
            }
            "BOX" => {
                let half_size = self.next_vec3(token)?;
                self.set_shape(token, Shape::Box { half_size });
            }
            "TRIANGLE" => {
                let a = self.next_vec3(token)?;
                let b = self.next_vec3(token)?;
                let c = self.next_vec3(token)?;
                self.set_shape(token, Shape::Triangle { a, b, c });
            }
            "MESH" => {
                let path = self.next_raw(token)?;
                let path = match &self.base_dir {
                    Some(dir) => dir.join(path),
                    None => PathBuf::from(path),
                };
                let mesh = Mesh::load_json(&path)?;
                if let Some(primitive) = self.primitive(token) {
                    primitive.shapes = mesh
                        .triangles()
                        .map(|[a, b, c]| Shape::Triangle { a, b, c })
                        .collect();
                }
            }

            "POSITION" => {
                let position = self.next_vec3(token)?;
                if let Some(primitive) = self.primitive(token) {
                    primitive.position = position;
                }
            }
            "ROTATION" => {
                let v = self.next_vec3(token)?;
                let w = self.next_f32(token)?;
                if let Some(primitive) = self.primitive(token) {
                    if Vec4::new(v.x, v.y, v.z, w).try_normalize().is_some() {
                        primitive.rotation = Quat::from_xyzw(v.x, v.y, v.z, w);
                    } else {
                        log::warn!("Ignoring degenerate ROTATION {v} {w}");
                    }
                }
            }
            "COLOR" => {
                let color = self.next_vec3(token)?;
                if let Some(primitive) = self.primitive(token) {
                    primitive.color = color;
                }
            }
            "METALLIC" => {
                if let Some(primitive) = self.primitive(token) {
                    primitive.kind = MaterialKind::Metallic;
                }
            }
            "DIELECTRIC" => {
                if let Some(primitive) = self.primitive(token) {
                    primitive.kind = MaterialKind::Dielectric;
                }
            }
            "IOR" => {
                let ior = self.next_f32(token)?;
                if let Some(primitive) = self.primitive(token) {
                    primitive.ior = Some(ior);
                }
            }
            "EMISSION" => {
                let emission = self.next_vec3(token)?;
                if let Some(primitive) = self.primitive(token) {
                    primitive.emission = Some(emission);
                }
            }

            unknown => {
                log::warn!("Unknown token: {unknown}");
                // Drop the unknown keyword's numeric arguments with it
                while self.tokens.peek().is_some_and(|t| t.parse::<f32>().is_ok()) {
                    self.tokens.next();
                }
            }
        }
        Ok(())
    }

    fn finish_primitive(&mut self) {
        if let Some(primitive) = self.current.take() {
            let objects = primitive.finish(self.primitive_count);
            self.scene.objects.extend(objects);
            self.primitive_count += 1;
        }
    }

    /// The open primitive, or a warning when a property comes before any `NEW_PRIMITIVE`.
    fn primitive(&mut self, token: &str) -> Option<&mut PrimitiveBuilder> {
        if self.current.is_none() {
            log::warn!("{token} outside of a primitive, skipping");
        }
        self.current.as_mut()
    }

    fn set_shape(&mut self, token: &str, shape: Shape) {
        if let Some(primitive) = self.primitive(token) {
            if !primitive.shapes.is_empty() {
                log::warn!("{token} replaces the primitive's previous shape");
            }
            primitive.shapes = vec![shape];
        }
    }

    fn next_raw(&mut self, token: &str) -> SceneResult<&'a str> {
        self.tokens.next().ok_or_else(|| SceneError::UnexpectedEof {
            token: token.to_string(),
        })
    }

    fn next_f32(&mut self, token: &str) -> SceneResult<f32> {
        let value = self.next_raw(token)?;
        value.parse().map_err(|_| SceneError::InvalidNumber {
            token: token.to_string(),
            value: value.to_string(),
        })
    }

    fn next_u32(&mut self, token: &str) -> SceneResult<u32> {
        let value = self.next_raw(token)?;
        value.parse().map_err(|_| SceneError::InvalidNumber {
            token: token.to_string(),
            value: value.to_string(),
        })
    }

    fn next_vec3(&mut self, token: &str) -> SceneResult<Vec3> {
        Ok(Vec3::new(
            self.next_f32(token)?,
            self.next_f32(token)?,
            self.next_f32(token)?,
        ))
    }
}
