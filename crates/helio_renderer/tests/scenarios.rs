//! End-to-end render scenarios.

use helio_core::{load_scene_from_str, Geometry, Material, RenderSetup, SceneObject, Shape};
use helio_math::{Placement, Ray, Vec3};
use helio_renderer::{render_scene, BvhNode, Color, Integrator, SceneIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

const ELLIPSOID_SCENE: &str = "
    DIMENSIONS 32 32
    BG_COLOR 0 0 0
    AMBIENT_LIGHT 0.25 0.25 0.25
    RAY_DEPTH 4
    SAMPLES 8
    CAMERA_POSITION 0 0 5
    CAMERA_RIGHT 1 0 0
    CAMERA_UP 0 1 0
    CAMERA_FORWARD 0 0 -1
    CAMERA_FOV_X 1.5707964

    NEW_PRIMITIVE
    ELLIPSOID 1 1 1
    COLOR 0.8 0.4 0.2
";

#[test]
fn test_ellipsoid_without_lights() {
    let _ = env_logger::builder().is_test(true).try_init();

    let scene = load_scene_from_str(ELLIPSOID_SCENE).unwrap();
    let index = SceneIndex::build(scene.objects, scene.setup.leaf_size);
    let image = render_scene(&index, &scene.camera, &scene.setup).unwrap();

    // Bounces off a lone convex surface escape to the black background,
    // leaving only the ambient term
    let expected = Color::splat(0.25) * Color::new(0.8, 0.4, 0.2);
    let center = image.get(16, 16);
    assert!((center - expected).length() < 1e-5, "center = {center}");

    // Outside the silhouette the background is returned untouched
    assert_eq!(image.get(0, 0), Color::ZERO);
    assert_eq!(image.get(31, 5), Color::ZERO);
}

/// Diffuse room lit by a small emissive triangle below its ceiling.
fn lit_room() -> SceneIndex {
    let walls = SceneObject::new(
        Geometry::at_origin(Shape::Box { half_size: Vec3::ONE }),
        Material::diffuse(Color::splat(0.7)),
    );
    let lamp = SceneObject::new(
        Geometry::new(
            Shape::Triangle {
                a: Vec3::new(-0.3, 0.0, -0.3),
                b: Vec3::new(0.3, 0.0, -0.3),
                c: Vec3::new(0.0, 0.0, 0.3),
            },
            Placement::from_position(Vec3::new(0.0, 0.9, 0.0)),
        ),
        Material::emitter(Color::splat(8.0)),
    );
    SceneIndex::build(vec![walls, lamp], 8)
}

/// Mean and standard error of `n` radiance samples along a fixed ray, depth 5.
fn estimate(index: &SceneIndex, seed: u64, n: usize) -> (f32, f32) {
    let setup = RenderSetup {
        max_depth: 5,
        ..Default::default()
    };
    let integrator = Integrator::new(index, &setup);
    let ray = Ray::new(Vec3::new(0.0, 0.0, 0.5), Vec3::new(0.2, -1.0, -0.3));
    let mut rng = StdRng::seed_from_u64(seed);

    let samples: Vec<f32> = (0..n)
        .map(|_| {
            let c = integrator.radiance(&ray, setup.max_depth, &mut rng).unwrap();
            assert!(c.is_finite() && c.min_element() >= 0.0);
            (c.x + c.y + c.z) / 3.0
        })
        .collect();

    let mean = samples.iter().sum::<f32>() / n as f32;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / (n - 1) as f32;
    (mean, (variance / n as f32).sqrt())
}

#[test]
fn test_closed_room_converges() {
    let index = lit_room();
    assert_eq!(index.lights().light_count(), 1);

    let (mean_small, se_small) = estimate(&index, 1, 2_500);
    let (mean_large, se_large) = estimate(&index, 2, 10_000);
    assert!(mean_small > 0.0 && mean_large > 0.0);

    // Four times the samples halves the standard error
    let ratio = se_large / se_small;
    assert!((0.35..0.65).contains(&ratio), "se ratio = {ratio}");

    // Independent runs agree within their combined error
    let (mean_other, se_other) = estimate(&index, 3, 10_000);
    let tolerance = 4.0 * (se_large.powi(2) + se_other.powi(2)).sqrt();
    assert!(
        (mean_large - mean_other).abs() < tolerance,
        "{mean_large} vs {mean_other} (tolerance {tolerance})"
    );
    assert!((mean_small - mean_large).abs() < 4.0 * (se_small.powi(2) + se_large.powi(2)).sqrt());
}

#[test]
fn test_closed_room_render_seeds_agree() {
    let index = lit_room();
    let camera = helio_core::Camera::new().with_position(Vec3::new(0.0, -0.2, 0.8));
    let setup = RenderSetup {
        width: 6,
        height: 6,
        samples: 10_000,
        max_depth: 5,
        ..Default::default()
    };

    let a = render_scene(&index, &camera, &setup).unwrap().mean();
    let b = render_scene(&index, &camera, &RenderSetup { seed: 17, ..setup }).unwrap().mean();
    assert!(a.min_element() > 0.0);
    let relative = (a - b).length() / a.length();
    assert!(relative < 0.1, "{a} vs {b}");
}

#[test]
fn test_two_boxes_leaf_size_one() {
    let boxes = [-3.0, 3.0]
        .map(|x| {
            SceneObject::new(
                Geometry::new(
                    Shape::Box { half_size: Vec3::ONE },
                    Placement::from_position(Vec3::new(x, 0.0, 0.0)),
                ),
                Material::default(),
            )
        })
        .to_vec();
    let index = SceneIndex::build(boxes, 1);
    let bvh = index.objects();

    let branches = bvh
        .nodes()
        .iter()
        .filter(|n| matches!(n, BvhNode::Branch { .. }))
        .count();
    assert_eq!(branches, 1);
    assert_eq!(bvh.node_count(), 3);
    assert!(bvh.leaf_ranges().iter().all(|r| r.len() == 1));
    assert!(matches!(bvh.nodes()[bvh.node_count() - 1], BvhNode::Branch { .. }));

    // Each box is found through its own leaf
    let left = index.intersect(&Ray::new(Vec3::new(-3.0, 5.0, 0.0), -Vec3::Y)).unwrap();
    let right = index.intersect(&Ray::new(Vec3::new(3.0, 5.0, 0.0), -Vec3::Y)).unwrap();
    assert!(left.object.geometry.placement.position.x < 0.0);
    assert!(right.object.geometry.placement.position.x > 0.0);
}
