//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is generic over its element type. Elements live in a single
//! `Vec` that is partitioned in place during construction; leaves refer to
//! contiguous ranges of it and nodes are stored flat, addressed by index.
//!
//! What a traversal computes is supplied by a [`BvhQuery`]: a per-element
//! evaluation folded with an associative, commutative merge, plus an
//! optional pruning predicate.

use std::ops::Range;

use helio_math::{Aabb, Interval, Ray};

/// Default maximum number of elements per leaf.
pub const DEFAULT_LEAF_SIZE: usize = 8;

/// Padding added on every side of a leaf box.
pub const LEAF_BUMP: f32 = 1e-2;

/// Number of times a degenerate split is retried on a shrunken box.
pub const MAX_SPLIT_ATTEMPTS: usize = 32;

/// BVH node - either a branch with two children or a leaf over an element range.
#[derive(Debug, Clone, PartialEq)]
pub enum BvhNode {
    /// Internal node; children are indices into the node array.
    Branch { left: usize, right: usize, bbox: Aabb },
    /// Leaf covering `elements[start..start + len]`.
    Leaf { start: usize, len: usize, bbox: Aabb },
}

impl BvhNode {
    /// Bounding box of the node's subtree.
    pub fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// A fold over the elements a ray may reach.
///
/// `merge` must be associative and commutative with `identity` as its
/// neutral element; traversal order then only changes the cost of a query.
pub trait BvhQuery<'a, T> {
    type Output;

    /// Neutral result, returned for anything the ray cannot reach.
    fn identity(&self) -> Self::Output;

    /// Evaluate one element.
    fn map(&self, element: &'a T, ray: &Ray) -> Self::Output;

    /// Combine two partial results.
    fn merge(&self, a: Self::Output, b: Self::Output) -> Self::Output;

    /// Whether a subtree first entered at `entry` can be skipped given `acc`.
    fn early_out(&self, _acc: &Self::Output, _entry: f32) -> bool {
        false
    }
}

/// Generic BVH over an owned element array.
#[derive(Debug, Clone)]
pub struct Bvh<T> {
    elements: Vec<T>,
    nodes: Vec<BvhNode>,
    leaf_size: usize,
}

impl<T> Bvh<T> {
    /// Build a BVH over `elements`, using `bounds` to box each one.
    ///
    /// Leaves hold at most `leaf_size` elements unless a range cannot be split.
    pub fn build<F>(mut elements: Vec<T>, leaf_size: usize, bounds: F) -> Self
    where
        F: Fn(&T) -> Aabb,
    {
        let mut boxes: Vec<Aabb> = elements.iter().map(&bounds).collect();
        let len = elements.len();
        let mut bvh = Self {
            elements: Vec::new(),
            nodes: Vec::with_capacity(2 * len / leaf_size.max(1) + 1),
            leaf_size: leaf_size.max(1),
        };

        if len > 0 {
            bvh.build_range(&mut elements, &mut boxes, 0, len);
        }
        bvh.elements = elements;
        bvh
    }

    /// Build the subtree for `start..end`, returning its node index.
    fn build_range(&mut self, elements: &mut [T], boxes: &mut [Aabb], start: usize, end: usize) -> usize {
        let bounds = boxes[start..end]
            .iter()
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, b));

        if end - start <= self.leaf_size {
            return self.push_leaf(bounds, start, end);
        }

        let mut working = bounds;
        let mut attempts = 0;
        let mid = loop {
            let axis = working.longest_axis();
            let extent = working.axis_interval(axis);
            if attempts >= MAX_SPLIT_ATTEMPTS || !(extent.size() > 0.0) {
                log::debug!(
                    "BVH split failed after {} attempts, leaf with {} elements",
                    attempts,
                    end - start
                );
                return self.push_leaf(bounds, start, end);
            }

            let plane = extent.center();
            let mid = start
                + partition(&mut elements[start..end], &mut boxes[start..end], |b| {
                    b.centroid()[axis] > plane
                });
            if mid > start && mid < end {
                break mid;
            }

            // Everything landed on one side: retry on that half
            let half = if mid == end {
                Interval::new(extent.min, plane)
            } else {
                Interval::new(plane, extent.max)
            };
            working = working.with_axis_interval(axis, half);
            attempts += 1;
        };

        let left = self.build_range(elements, boxes, start, mid);
        let right = self.build_range(elements, boxes, mid, end);
        let bbox = Aabb::surrounding(self.nodes[left].bbox(), self.nodes[right].bbox());
        self.nodes.push(BvhNode::Branch { left, right, bbox });
        self.nodes.len() - 1
    }

    fn push_leaf(&mut self, bounds: Aabb, start: usize, end: usize) -> usize {
        self.nodes.push(BvhNode::Leaf {
            start,
            len: end - start,
            bbox: bounds.bump(LEAF_BUMP),
        });
        self.nodes.len() - 1
    }

    /// Run a query along `ray`.
    pub fn query<'a, Q>(&'a self, ray: &Ray, query: &Q) -> Q::Output
    where
        Q: BvhQuery<'a, T>,
    {
        match self.root() {
            Some(root) if self.nodes[root].bbox().entry_distance(ray).is_some() => {
                self.query_node(root, ray, query)
            }
            _ => query.identity(),
        }
    }

    fn query_node<'a, Q>(&'a self, index: usize, ray: &Ray, query: &Q) -> Q::Output
    where
        Q: BvhQuery<'a, T>,
    {
        match &self.nodes[index] {
            BvhNode::Leaf { start, len, .. } => self.elements[*start..*start + *len]
                .iter()
                .fold(query.identity(), |acc, element| {
                    query.merge(acc, query.map(element, ray))
                }),

            BvhNode::Branch { left, right, .. } => {
                let left_entry = self.nodes[*left].bbox().entry_distance(ray);
                let right_entry = self.nodes[*right].bbox().entry_distance(ray);

                let (near, far) = match (left_entry, right_entry) {
                    (Some(l), Some(r)) if r < l => (*right, Some((*left, l))),
                    (Some(_), Some(r)) => (*left, Some((*right, r))),
                    (Some(_), None) => (*left, None),
                    (None, Some(_)) => (*right, None),
                    (None, None) => return query.identity(),
                };

                let acc = self.query_node(near, ray, query);
                match far {
                    Some((far, entry)) if !query.early_out(&acc, entry) => {
                        let rest = self.query_node(far, ray, query);
                        query.merge(acc, rest)
                    }
                    _ => acc,
                }
            }
        }
    }

    /// Index of the root node (`None` when empty).
    pub fn root(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    /// Number of indexed elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Maximum leaf size the tree was built with.
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.root().map_or(0, |root| self.node_depth(root))
    }

    fn node_depth(&self, index: usize) -> usize {
        match &self.nodes[index] {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + self.node_depth(*left).max(self.node_depth(*right)),
        }
    }

    /// Element ranges of all leaves, in node order.
    pub fn leaf_ranges(&self) -> Vec<Range<usize>> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                BvhNode::Leaf { start, len, .. } => Some(*start..*start + *len),
                BvhNode::Branch { .. } => None,
            })
            .collect()
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Elements in their partitioned order.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }
}

/// Move elements for which `goes_right` is false to the front, keeping
/// `boxes` in step. Returns the number of elements on the left.
fn partition<T, F>(elements: &mut [T], boxes: &mut [Aabb], goes_right: F) -> usize
where
    F: Fn(&Aabb) -> bool,
{
    let mut mid = 0;
    for i in 0..elements.len() {
        if !goes_right(&boxes[i]) {
            elements.swap(i, mid);
            boxes.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;
    use helio_math::Vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type Item = (usize, Aabb);

    fn random_items(rng: &mut StdRng, n: usize) -> Vec<Item> {
        (0..n)
            .map(|id| {
                let center = Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                );
                let half = Vec3::splat(rng.gen_range(0.1..1.0));
                (id, Aabb::from_points(center - half, center + half))
            })
            .collect()
    }

    fn random_ray(rng: &mut StdRng) -> Ray {
        let origin = Vec3::new(
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
        );
        let target = Vec3::new(
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
        );
        Ray::new(origin, target - origin)
    }

    /// Counts the element boxes the ray passes through.
    struct BoxCount;

    impl<'a> BvhQuery<'a, Item> for BoxCount {
        type Output = usize;

        fn identity(&self) -> usize {
            0
        }

        fn map(&self, element: &'a Item, ray: &Ray) -> usize {
            element.1.entry_distance(ray).is_some() as usize
        }

        fn merge(&self, a: usize, b: usize) -> usize {
            a + b
        }
    }

    /// Nearest element box along the ray, pruned by entry distance.
    struct NearestBox;

    impl<'a> BvhQuery<'a, Item> for NearestBox {
        type Output = Option<(f32, usize)>;

        fn identity(&self) -> Self::Output {
            None
        }

        fn map(&self, element: &'a Item, ray: &Ray) -> Self::Output {
            element.1.entry_distance(ray).map(|t| (t, element.0))
        }

        fn merge(&self, a: Self::Output, b: Self::Output) -> Self::Output {
            match (a, b) {
                (Some(a), Some(b)) => Some(if b.0 < a.0 || (b.0 == a.0 && b.1 < a.1) { b } else { a }),
                (a, None) => a,
                (None, b) => b,
            }
        }

        fn early_out(&self, acc: &Self::Output, entry: f32) -> bool {
            acc.is_some_and(|(t, _)| t < entry)
        }
    }

    fn brute_force<'a, Q: BvhQuery<'a, Item>>(bvh: &'a Bvh<Item>, ray: &Ray, query: &Q) -> Q::Output {
        bvh.elements()
            .iter()
            .fold(query.identity(), |acc, e| query.merge(acc, query.map(e, ray)))
    }

    #[test]
    fn test_bvh_empty() {
        let bvh: Bvh<Item> = Bvh::build(Vec::new(), 4, |item| item.1);
        assert!(bvh.is_empty());
        assert_eq!(bvh.root(), None);
        assert_eq!(bvh.depth(), 0);

        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(bvh.query(&ray, &BoxCount), 0);
        assert_eq!(bvh.query(&ray, &NearestBox), None);
    }

    #[test]
    fn test_bvh_single_leaf() {
        let mut rng = StdRng::seed_from_u64(42);
        let bvh = Bvh::build(random_items(&mut rng, 3), 8, |item| item.1);
        assert_eq!(bvh.node_count(), 1);
        assert!(matches!(bvh.nodes()[0], BvhNode::Leaf { start: 0, len: 3, .. }));
    }

    #[test]
    fn test_build_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        let bvh = Bvh::build(random_items(&mut rng, 300), 4, |item| item.1);

        // Every node contains what lies below it
        for node in bvh.nodes() {
            match node {
                BvhNode::Branch { left, right, bbox } => {
                    assert!(bbox.contains(bvh.nodes()[*left].bbox()));
                    assert!(bbox.contains(bvh.nodes()[*right].bbox()));
                }
                BvhNode::Leaf { start, len, bbox } => {
                    assert!(*len <= 4);
                    for item in &bvh.elements()[*start..*start + *len] {
                        assert!(bbox.contains(&item.1));
                    }
                }
            }
        }

        // Leaf ranges are disjoint and cover every element once
        let mut ranges = bvh.leaf_ranges();
        ranges.sort_by_key(|r| r.start);
        let mut next = 0;
        for range in &ranges {
            assert_eq!(range.start, next);
            next = range.end;
        }
        assert_eq!(next, 300);

        let mut ids: Vec<usize> = bvh.elements().iter().map(|item| item.0).collect();
        ids.sort_unstable();
        assert!(ids.iter().copied().eq(0..300));

        // Root is the last node
        assert_eq!(bvh.root(), Some(bvh.node_count() - 1));
    }

    #[test]
    fn test_query_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        let bvh = Bvh::build(random_items(&mut rng, 200), 4, |item| item.1);

        for _ in 0..500 {
            let ray = random_ray(&mut rng);
            assert_eq!(bvh.query(&ray, &BoxCount), brute_force(&bvh, &ray, &BoxCount));
            assert_eq!(bvh.query(&ray, &NearestBox), brute_force(&bvh, &ray, &NearestBox));
        }
    }

    #[test]
    fn test_degenerate_split_falls_back_to_leaf() {
        let _ = env_logger::builder().is_test(true).try_init();

        let b = Aabb::from_points(Vec3::splat(-1.0), Vec3::ONE);
        let items: Vec<Item> = (0..20).map(|id| (id, b)).collect();
        let bvh = Bvh::build(items, 4, |item| item.1);

        assert_eq!(bvh.node_count(), 1);
        assert_eq!(bvh.leaf_ranges(), vec![0..20]);
        assert_eq!(bvh.query(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z), &BoxCount), 20);
    }

    #[test]
    fn test_shrinking_split_recovers() {
        // A tall element makes y the longest axis while every center sits at y = 0
        let mut items: Vec<Item> = (0..8)
            .map(|id| {
                let c = Vec3::new(id as f32 * 0.1, 0.0, 0.0);
                (id, Aabb::from_points(c - Vec3::splat(0.01), c + Vec3::splat(0.01)))
            })
            .collect();
        items.push((
            8,
            Aabb::from_points(Vec3::new(0.34, -100.0, -0.01), Vec3::new(0.36, 100.0, 0.01)),
        ));

        let bvh = Bvh::build(items, 1, |item| item.1);
        assert_eq!(bvh.leaf_ranges().len(), 9);
        assert!(bvh.leaf_ranges().iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_leaf_boxes_are_bumped() {
        let b = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let bvh = Bvh::build(vec![(0, b)], 4, |item| item.1);
        let bbox = bvh.nodes()[0].bbox();
        assert!((bbox.x.min - -LEAF_BUMP).abs() < 1e-6);
        assert!((bbox.x.max - (1.0 + LEAF_BUMP)).abs() < 1e-6);
    }

    #[test]
    fn test_sum_monoid_laws() {
        let q = BoxCount;
        for (a, b, c) in [(0, 3, 5), (7, 1, 2)] {
            assert_eq!(q.merge(q.identity(), a), a);
            assert_eq!(q.merge(a, b), q.merge(b, a));
            assert_eq!(q.merge(q.merge(a, b), c), q.merge(a, q.merge(b, c)));
        }
    }
}
