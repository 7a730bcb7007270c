//! Geometric primitives and their ray intersection contract.
//!
//! Every shape is defined in its own local frame and placed in the world
//! through a [`Placement`]. Intersection works on a local copy of the ray;
//! because placements are rigid, hit distances need no conversion.

use helio_math::{Aabb, Placement, Ray, Vec3};
use smallvec::{smallvec, SmallVec};

/// Positive hit distances along a ray, ascending.
///
/// None of the supported shapes is crossed more than twice.
pub type Hits = SmallVec<[f32; 2]>;

/// Determinant below which a ray counts as parallel to a plane or triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Shape of a primitive in its local frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Infinite plane through the origin, `normal · p = 0`.
    Plane { normal: Vec3 },
    /// Box centered on the origin with the given half extents.
    Box { half_size: Vec3 },
    /// Ellipsoid centered on the origin with the given radii.
    Ellipsoid { radii: Vec3 },
    /// Triangle with vertices in local coordinates.
    Triangle { a: Vec3, b: Vec3, c: Vec3 },
}

impl Shape {
    /// Build a plane, normalizing its normal.
    pub fn plane(normal: Vec3) -> Self {
        Shape::Plane {
            normal: normal.normalize_or_zero(),
        }
    }

    /// Whether the shape has a finite bounding box.
    pub fn is_bounded(&self) -> bool {
        !matches!(self, Shape::Plane { .. })
    }

    /// Positive distances at which a local-space ray crosses the surface.
    pub fn local_hits(&self, ray: &Ray) -> Hits {
        let (o, d) = (ray.origin, ray.direction);
        if d == Vec3::ZERO {
            return Hits::new();
        }

        match self {
            Shape::Plane { normal } => {
                let denom = d.dot(*normal);
                if denom.abs() < PARALLEL_EPSILON {
                    return Hits::new();
                }
                let t = -o.dot(*normal) / denom;
                if t > 0.0 {
                    smallvec![t]
                } else {
                    Hits::new()
                }
            }

            Shape::Box { half_size } => {
                let inv = d.recip();
                let t1 = (*half_size - o) * inv;
                let t2 = (-*half_size - o) * inv;
                let near = t1.min(t2).max_element();
                let far = t1.max(t2).min_element();
                if !(near <= far) {
                    return Hits::new();
                }
                positive_pair(near, far)
            }

            Shape::Ellipsoid { radii } => {
                let os = o / *radii;
                let ds = d / *radii;
                let a = ds.dot(ds);
                let b = 2.0 * os.dot(ds);
                let c = os.dot(os) - 1.0;
                let discriminant = b * b - 4.0 * a * c;
                if discriminant < 0.0 || a <= 0.0 {
                    return Hits::new();
                }
                let sqrtd = discriminant.sqrt();
                positive_pair((-b - sqrtd) / (2.0 * a), (-b + sqrtd) / (2.0 * a))
            }

            Shape::Triangle { a, b, c } => {
                // Möller-Trumbore
                let edge1 = *b - *a;
                let edge2 = *c - *a;
                let h = d.cross(edge2);
                let det = edge1.dot(h);
                if det.abs() < PARALLEL_EPSILON {
                    return Hits::new();
                }

                let f = 1.0 / det;
                let s = o - *a;
                let u = f * s.dot(h);
                if !(0.0..=1.0).contains(&u) {
                    return Hits::new();
                }

                let q = s.cross(edge1);
                let v = f * d.dot(q);
                if v < 0.0 || u + v > 1.0 {
                    return Hits::new();
                }

                let t = f * edge2.dot(q);
                if t > 0.0 {
                    smallvec![t]
                } else {
                    Hits::new()
                }
            }
        }
    }

    /// Outward surface normal at a local point on the surface (unit length).
    pub fn local_normal(&self, p: Vec3) -> Vec3 {
        match self {
            Shape::Plane { normal } => *normal,
            Shape::Box { half_size } => {
                let v = p / *half_size;
                let av = v.abs();
                // Ties at edges and corners pick one of the touching faces
                if av.x >= av.y && av.x >= av.z {
                    Vec3::new(v.x.signum(), 0.0, 0.0)
                } else if av.y >= av.z {
                    Vec3::new(0.0, v.y.signum(), 0.0)
                } else {
                    Vec3::new(0.0, 0.0, v.z.signum())
                }
            }
            Shape::Ellipsoid { radii } => (p / (*radii * *radii)).normalize_or_zero(),
            Shape::Triangle { a, b, c } => (*b - *a).cross(*c - *a).normalize_or_zero(),
        }
    }

    /// Whether a local point lies strictly inside a closed shape.
    ///
    /// `None` for planes and triangles, which have no interior.
    pub fn contains_local(&self, p: Vec3) -> Option<bool> {
        match self {
            Shape::Box { half_size } => Some(p.abs().cmplt(*half_size).all()),
            Shape::Ellipsoid { radii } => Some((p / *radii).length_squared() < 1.0),
            Shape::Plane { .. } | Shape::Triangle { .. } => None,
        }
    }

    /// Surface area of a bounded shape (`None` for planes).
    ///
    /// The ellipsoid uses the Knud Thomsen approximation.
    pub fn area(&self) -> Option<f32> {
        match self {
            Shape::Plane { .. } => None,
            Shape::Box { half_size: s } => Some(8.0 * (s.x * s.y + s.y * s.z + s.x * s.z)),
            Shape::Ellipsoid { radii: r } => {
                const P: f32 = 1.6075;
                let mean = ((r.x * r.y).powf(P) + (r.x * r.z).powf(P) + (r.y * r.z).powf(P)) / 3.0;
                Some(4.0 * std::f32::consts::PI * mean.powf(1.0 / P))
            }
            Shape::Triangle { a, b, c } => Some(0.5 * (*b - *a).cross(*c - *a).length()),
        }
    }
}

/// Keep the positive members of an ascending pair.
#[inline]
fn positive_pair(near: f32, far: f32) -> Hits {
    let mut hits = Hits::new();
    if near > 0.0 {
        hits.push(near);
    }
    if far > 0.0 && far != near {
        hits.push(far);
    }
    hits
}

/// Result of a ray hitting a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Distance along the ray
    pub t: f32,
    /// World-space unit normal, always facing against the incoming ray
    pub normal: Vec3,
    /// Whether the ray arrived from the back side of the surface
    pub inside: bool,
}

/// An intersection together with the local-space point that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub intersection: Intersection,
    pub local_point: Vec3,
}

/// A shape placed in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub shape: Shape,
    pub placement: Placement,
}

impl Geometry {
    /// Create a placed shape.
    pub fn new(shape: Shape, placement: Placement) -> Self {
        Self { shape, placement }
    }

    /// Shape at the world origin.
    pub fn at_origin(shape: Shape) -> Self {
        Self::new(shape, Placement::default())
    }

    /// Nearest intersection of a world-space ray with this geometry.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let local = self.placement.to_local_ray(ray);
        let t = *self.shape.local_hits(&local).first()?;
        let inside = self.shape.contains_local(local.origin);
        Some(self.surface_hit(&local, t, inside).intersection)
    }

    /// Every intersection of a world-space ray with this geometry, nearest first.
    pub fn intersect_all(&self, ray: &Ray) -> SmallVec<[SurfaceHit; 2]> {
        let local = self.placement.to_local_ray(ray);
        let origin_inside = self.shape.contains_local(local.origin);
        self.shape
            .local_hits(&local)
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                // Each crossing of a closed surface flips the side the ray is on
                let inside = origin_inside.map(|o| o != (i % 2 == 1));
                self.surface_hit(&local, t, inside)
            })
            .collect()
    }

    /// `inside` comes from the ray origin for closed shapes; open surfaces
    /// (`None`) use the side the ray arrives from.
    fn surface_hit(&self, local: &Ray, t: f32, inside: Option<bool>) -> SurfaceHit {
        let local_point = local.at(t);
        let outward = self.shape.local_normal(local_point);
        let inside = inside.unwrap_or_else(|| local.direction.dot(outward) >= 0.0);
        let normal = if inside { -outward } else { outward };
        SurfaceHit {
            intersection: Intersection {
                t,
                normal: self.placement.to_world_vector(normal).normalize_or_zero(),
                inside,
            },
            local_point,
        }
    }

    /// World-space bounding box, or `None` for unbounded shapes.
    pub fn bounding_box(&self) -> Option<Aabb> {
        match &self.shape {
            Shape::Plane { .. } => None,
            Shape::Box { half_size } => {
                let local = Aabb::from_points(-*half_size, *half_size);
                Some(self.placement.transform_aabb(&local))
            }
            Shape::Ellipsoid { radii } => {
                let local = Aabb::from_points(-*radii, *radii);
                Some(self.placement.transform_aabb(&local))
            }
            Shape::Triangle { a, b, c } => Some(Aabb::enclosing(
                [*a, *b, *c].map(|v| self.placement.to_world_point(v)),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helio_math::Quat;
    use std::f32::consts::PI;

    fn unit_sphere() -> Geometry {
        Geometry::at_origin(Shape::Ellipsoid { radii: Vec3::ONE })
    }

    #[test]
    fn test_ellipsoid_hit_from_outside() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let hit = unit_sphere().intersect(&ray).unwrap();

        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
        assert!(!hit.inside);
    }

    #[test]
    fn test_ellipsoid_hit_from_inside() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = unit_sphere().intersect(&ray).unwrap();

        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!(hit.inside);
        // Flipped to face the ray
        assert!((hit.normal + Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_ellipsoid_miss() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 5.0), -Vec3::Z);
        assert!(unit_sphere().intersect(&ray).is_none());
    }

    #[test]
    fn test_ellipsoid_two_hits() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let hits = unit_sphere().intersect_all(&ray);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].intersection.t - 4.0).abs() < 1e-5);
        assert!((hits[1].intersection.t - 6.0).abs() < 1e-5);
        assert!(hits[1].intersection.inside);
    }

    #[test]
    fn test_scaled_ellipsoid_normal() {
        let ellipsoid = Geometry::at_origin(Shape::Ellipsoid {
            radii: Vec3::new(2.0, 1.0, 1.0),
        });
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), -Vec3::X);
        let hit = ellipsoid.intersect(&ray).unwrap();
        assert!((hit.t - 3.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_box_hit_and_normal() {
        let cube = Geometry::new(
            Shape::Box { half_size: Vec3::ONE },
            Placement::from_position(Vec3::new(0.0, 0.0, -5.0)),
        );
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let hit = cube.intersect(&ray).unwrap();

        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_rotated_box() {
        let cube = Geometry::new(
            Shape::Box { half_size: Vec3::ONE },
            Placement::new(Vec3::ZERO, Quat::from_rotation_y(PI / 4.0)),
        );
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let hit = cube.intersect(&ray).unwrap();

        // Corner of the rotated cube faces the ray
        assert!((hit.t - (5.0 - 2.0_f32.sqrt())).abs() < 1e-4);
    }

    #[test]
    fn test_box_edge_hit_from_outside() {
        let cube = Geometry::at_origin(Shape::Box { half_size: Vec3::ONE });
        let ray = Ray::new(Vec3::new(3.0, 3.0, 0.0), Vec3::new(-1.0, -1.0, 0.0));
        let hit = cube.intersect(&ray).unwrap();

        assert!((hit.t - 2.0 * 2.0_f32.sqrt()).abs() < 1e-4);
        assert!(!hit.inside);
        // One of the two touching faces, facing the ray
        assert!(hit.normal == Vec3::X || hit.normal == Vec3::Y, "normal = {}", hit.normal);
        assert!(hit.normal.dot(ray.direction) < 0.0);
    }

    #[test]
    fn test_box_corner_normal() {
        let cube = Shape::Box { half_size: Vec3::ONE };
        let n = cube.local_normal(Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(n.length(), 1.0);
        assert!(n.min_element() == -1.0);
    }

    #[test]
    fn test_box_inside_from_origin() {
        let cube = Geometry::at_origin(Shape::Box { half_size: Vec3::ONE });
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let hit = cube.intersect(&ray).unwrap();
        assert!(hit.inside);
        assert!(hit.normal.dot(ray.direction) < 0.0);

        let hits = cube.intersect_all(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z));
        assert_eq!(hits.len(), 2);
        assert!(!hits[0].intersection.inside);
        assert!(hits[1].intersection.inside);
    }

    #[test]
    fn test_contains_local() {
        let cube = Shape::Box { half_size: Vec3::ONE };
        assert_eq!(cube.contains_local(Vec3::splat(0.5)), Some(true));
        assert_eq!(cube.contains_local(Vec3::new(1.0, 0.0, 0.0)), Some(false));
        assert_eq!(unit_sphere().shape.contains_local(Vec3::splat(0.7)), Some(false));
        assert_eq!(Shape::plane(Vec3::Y).contains_local(Vec3::ZERO), None);
    }

    #[test]
    fn test_box_parallel_ray_outside() {
        let cube = Geometry::at_origin(Shape::Box { half_size: Vec3::ONE });
        let ray = Ray::new(Vec3::new(0.0, 3.0, 5.0), -Vec3::Z);
        assert!(cube.intersect(&ray).is_none());
    }

    #[test]
    fn test_plane_hit_and_parallel() {
        let plane = Geometry::at_origin(Shape::plane(Vec3::Y));

        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 1.0));
        let hit = plane.intersect(&ray).unwrap();
        assert!((hit.t - 2.0 * 2.0_f32.sqrt()).abs() < 1e-4);
        assert!((hit.normal - Vec3::Y).length() < 1e-5);

        let parallel = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::X);
        assert!(plane.intersect(&parallel).is_none());
        assert!(plane.bounding_box().is_none());
    }

    #[test]
    fn test_triangle_hit() {
        // Triangle in XY plane at z=-1
        let tri = Geometry::at_origin(Shape::Triangle {
            a: Vec3::new(-1.0, -1.0, -1.0),
            b: Vec3::new(1.0, -1.0, -1.0),
            c: Vec3::new(0.0, 1.0, -1.0),
        });

        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let hit = tri.intersect(&ray).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);

        let away = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(tri.intersect(&away).is_none());

        let beside = Ray::new(Vec3::new(3.0, 0.0, 0.0), -Vec3::Z);
        assert!(tri.intersect(&beside).is_none());
    }

    #[test]
    fn test_zero_direction_never_hits() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert!(unit_sphere().intersect(&ray).is_none());
        let cube = Geometry::at_origin(Shape::Box { half_size: Vec3::ONE });
        assert!(cube.intersect(&ray).is_none());
    }

    #[test]
    fn test_bounding_boxes() {
        let ellipsoid = Geometry::new(
            Shape::Ellipsoid { radii: Vec3::new(1.0, 2.0, 3.0) },
            Placement::from_position(Vec3::X),
        );
        let bbox = ellipsoid.bounding_box().unwrap();
        assert!((bbox.min() - Vec3::new(0.0, -2.0, -3.0)).length() < 1e-5);
        assert!((bbox.max() - Vec3::new(2.0, 2.0, 3.0)).length() < 1e-5);

        let tri = Geometry::at_origin(Shape::Triangle {
            a: Vec3::ZERO,
            b: Vec3::X,
            c: Vec3::Y,
        });
        let bbox = tri.bounding_box().unwrap();
        assert_eq!(bbox.x.max, 1.0);
        assert!(bbox.z.size() > 0.0);
    }

    #[test]
    fn test_areas() {
        let cube = Shape::Box { half_size: Vec3::ONE };
        assert!((cube.area().unwrap() - 24.0).abs() < 1e-5);

        let tri = Shape::Triangle { a: Vec3::ZERO, b: Vec3::X, c: Vec3::Y };
        assert!((tri.area().unwrap() - 0.5).abs() < 1e-6);

        let sphere = Shape::Ellipsoid { radii: Vec3::ONE };
        assert!((sphere.area().unwrap() - 4.0 * PI).abs() < 1e-3);

        assert!(Shape::plane(Vec3::Y).area().is_none());
    }
}
