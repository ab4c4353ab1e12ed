//! Minimal geometry types used for pointer coordinates and layout bounds.

use std::fmt;

/// A point in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate in pixels.
    pub x: f64,
    /// Vertical coordinate in pixels.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the component-wise offset from `other` to `self`.
    pub fn delta_from(self, other: Self) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }

    /// Returns true if either axis moved strictly more than `threshold` pixels.
    ///
    /// Drag start detection measures each axis independently rather than the
    /// euclidean distance.
    pub fn exceeds_axis_threshold(self, origin: Self, threshold: f64) -> bool {
        let (dx, dy) = self.delta_from(origin);
        dx.abs() > threshold || dy.abs() > threshold
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// An empty rectangle at the origin.
    pub const ZERO: Self = Self {
        origin: Point::ZERO,
        width: 0.0,
        height: 0.0,
    };

    /// Creates a rectangle from its top-left corner and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    /// Returns the same size moved to a new origin.
    pub fn with_origin(self, origin: Point) -> Self {
        Self { origin, ..self }
    }

    /// Returns true if the point lies inside the rectangle.
    ///
    /// The left and top edges are inclusive, the right and bottom edges exclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.origin.x + self.width
            && point.y < self.origin.y + self.height
    }

    /// Returns true if the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_threshold_is_strict() {
        let origin = Point::new(10.0, 10.0);
        assert!(!Point::new(13.0, 10.0).exceeds_axis_threshold(origin, 3.0));
        assert!(Point::new(14.0, 10.0).exceeds_axis_threshold(origin, 3.0));
        assert!(Point::new(10.0, 6.0).exceeds_axis_threshold(origin, 3.0));
        // Diagonal movement is measured per axis
        assert!(!Point::new(12.5, 12.5).exceeds_axis_threshold(origin, 3.0));
    }

    #[test]
    fn test_rect_contains_edges() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Point::new(0.0, 0.0)));
        assert!(rect.contains(Point::new(9.9, 9.9)));
        assert!(!rect.contains(Point::new(10.0, 5.0)));
        assert!(!Rect::ZERO.contains(Point::ZERO));
    }
}
