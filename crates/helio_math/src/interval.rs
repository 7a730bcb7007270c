/// A closed interval `[min, max]` on the real line.
///
/// Used per axis by [`crate::Aabb`] and as the admissible `t` range of
/// ray/box slab tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Interval from `min` to `max`; no ordering is enforced.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Length `max - min`; negative when empty.
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// Midpoint of the interval.
    pub fn center(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// True when the interval contains no values.
    pub fn is_empty(&self) -> bool {
        !(self.min <= self.max)
    }

    /// Closed membership test.
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// Returns true if `other` lies entirely inside this interval.
    pub fn contains_interval(&self, other: &Interval) -> bool {
        other.is_empty() || (self.min <= other.min && other.max <= self.max)
    }

    /// Pad both ends by `delta / 2`.
    pub fn expand(&self, delta: f32) -> Interval {
        let padding = delta / 2.0;
        Interval::new(self.min - padding, self.max + padding)
    }

    /// Overlap of two intervals (possibly empty).
    pub fn intersect(&self, other: &Interval) -> Interval {
        Interval::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Smallest interval covering both.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }

    /// Identity for [`Interval::surrounding`].
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    /// Non-negative ray parameters, `[0, inf)`.
    pub const FORWARD: Interval = Interval {
        min: 0.0,
        max: f32::INFINITY,
    };
}
