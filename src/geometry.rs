//! Rectangles and size ranges.

use cgmath::{EuclideanSpace, Point2, Vector2, Zero};
use std::{f64, ops};

/// A width and height.
pub type Size = Vector2<f64>;

/// A position relative to the parent’s origin.
pub type Point = Point2<f64>;

/// A rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Rectangle origin.
    pub origin: Point,

    /// Rectangle size.
    pub size: Size,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(origin: Point, size: Size) -> Rect {
        Rect { origin, size }
    }

    /// Returns true if the point is inside the rectangle.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.origin.x + self.size.x
            && point.y < self.origin.y + self.size.y
    }

    /// Returns true if the rectangle lies entirely within this one.
    pub fn contains_rect(&self, rect: Rect) -> bool {
        rect.origin.x >= self.origin.x
            && rect.origin.y >= self.origin.y
            && rect.origin.x + rect.size.x <= self.origin.x + self.size.x
            && rect.origin.y + rect.size.y <= self.origin.y + self.size.y
    }
}

impl ops::Add<Point> for Rect {
    type Output = Rect;
    fn add(self, point: Point) -> Rect {
        Rect {
            origin: self.origin + point.to_vec(),
            size: self.size,
        }
    }
}

/// A range of acceptable sizes; `min` is finite, `max` may be infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRange {
    pub min: Size,
    pub max: Size,
}

impl SizeRange {
    pub fn new(min: Size, max: Size) -> SizeRange {
        SizeRange { min, max }
    }

    /// A range that only admits one size.
    pub fn exact(size: Size) -> SizeRange {
        SizeRange {
            min: size,
            max: size,
        }
    }

    /// Anything from zero to infinity.
    pub fn unconstrained() -> SizeRange {
        SizeRange {
            min: Vector2::zero(),
            max: Vector2::new(f64::INFINITY, f64::INFINITY),
        }
    }

    /// Clamps a size into the range. `min` wins over `max`.
    pub fn clamp(&self, size: Size) -> Size {
        Vector2::new(
            clamp_axis(size.x, self.min.x, self.max.x),
            clamp_axis(size.y, self.min.y, self.max.y),
        )
    }

    /// Narrows this range by another.
    ///
    /// If the ranges don’t overlap on an axis, the result collapses to the bound of `other` that
    /// is closest to this range.
    pub fn intersect(&self, other: SizeRange) -> SizeRange {
        let (min_x, max_x) = intersect_axis(self.min.x, self.max.x, other.min.x, other.max.x);
        let (min_y, max_y) = intersect_axis(self.min.y, self.max.y, other.min.y, other.max.y);
        SizeRange {
            min: Vector2::new(min_x, min_y),
            max: Vector2::new(max_x, max_y),
        }
    }

    /// The size children should resolve percentages against, per axis.
    ///
    /// A bounded axis uses its maximum. An unbounded axis has no reference size (NaN), which
    /// makes percentages fall back to automatic sizing.
    pub fn reference_size(&self) -> Size {
        let axis = |max: f64| if max.is_finite() { max } else { f64::NAN };
        Vector2::new(axis(self.max.x), axis(self.max.y))
    }

    /// Bit patterns of the four bounds, for hashing.
    pub(crate) fn bits(&self) -> [u64; 4] {
        [
            self.min.x.to_bits(),
            self.min.y.to_bits(),
            self.max.x.to_bits(),
            self.max.y.to_bits(),
        ]
    }
}

fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    let value = if value.is_nan() { min } else { value };
    let value = if value > max { max } else { value };
    if value < min {
        min
    } else {
        value
    }
}

fn intersect_axis(min: f64, max: f64, other_min: f64, other_max: f64) -> (f64, f64) {
    let new_min = min.max(other_min);
    let new_max = max.min(other_max);
    if new_min <= new_max {
        (new_min, new_max)
    } else if other_max < min {
        (other_max, other_max)
    } else {
        (other_min, other_min)
    }
}
