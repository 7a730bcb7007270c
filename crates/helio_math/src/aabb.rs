use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box, one [`Interval`] per axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Box from per-axis extents.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Smallest box containing every point of the iterator.
    ///
    /// Returns [`Aabb::EMPTY`] for an empty iterator.
    pub fn enclosing<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Aabb::EMPTY;
        };
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Aabb::from_points(min, max)
    }

    /// Union of two boxes.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Extent along axis `n` (0=X, 1=Y, anything else Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Copy of this box with one axis replaced. No padding is applied.
    pub fn with_axis_interval(mut self, n: usize, interval: Interval) -> Aabb {
        match n {
            0 => self.x = interval,
            1 => self.y = interval,
            _ => self.z = interval,
        }
        self
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// True when the box contains nothing.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// True when `other` lies entirely inside this box.
    pub fn contains(&self, other: &Aabb) -> bool {
        other.is_empty()
            || (self.x.contains_interval(&other.x)
                && self.y.contains_interval(&other.y)
                && self.z.contains_interval(&other.z))
    }

    /// Distance along the ray at which it enters this box.
    ///
    /// Uses the slab method restricted to `t >= 0`; a ray starting inside
    /// the box enters at `0`. Returns `None` when the ray misses.
    pub fn entry_distance(&self, r: &Ray) -> Option<f32> {
        if self.is_empty() {
            return None;
        }

        let mut ray_t = Interval::FORWARD;
        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let adinv = 1.0 / r.direction[axis];
            let mut t0 = (slab.min - r.origin[axis]) * adinv;
            let mut t1 = (slab.max - r.origin[axis]) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // f32::max/min drop a NaN operand (ray origin on a slab plane with
            // a zero direction component), leaving the interval unchanged.
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max < ray_t.min {
                return None;
            }
        }

        Some(ray_t.min)
    }

    /// Test if a ray intersects this AABB at any non-negative distance.
    pub fn hit(&self, r: &Ray) -> bool {
        self.entry_distance(r).is_some()
    }

    /// Grow the box by `delta` on every side.
    pub fn bump(&self, delta: f32) -> Aabb {
        Aabb {
            x: self.x.expand(2.0 * delta),
            y: self.y.expand(2.0 * delta),
            z: self.z.expand(2.0 * delta),
        }
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min(), self.max());
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Pad intervals to avoid zero-width AABBs (flat triangles, axis-aligned quads).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    /// Axis of greatest extent, as used for BVH splits.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Center point.
    pub fn centroid(&self) -> Vec3 {
        Vec3::new(self.x.center(), self.y.center(), self.z.center())
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}
