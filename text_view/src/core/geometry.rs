// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Content-space geometry. The y axis grows downward, units are points.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Tolerance used for frame comparisons.
pub const GEOMETRY_EPSILON: f64 = 1e-4;

#[must_use]
pub fn is_almost_zero(value: f64) -> bool { value.abs() < GEOMETRY_EPSILON }

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }

    #[must_use]
    pub fn offset_by(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self { Self { width, height } }
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    #[must_use]
    pub fn min_x(&self) -> f64 { self.origin.x }

    #[must_use]
    pub fn min_y(&self) -> f64 { self.origin.y }

    #[must_use]
    pub fn max_x(&self) -> f64 { self.origin.x + self.size.width }

    #[must_use]
    pub fn max_y(&self) -> f64 { self.origin.y + self.size.height }

    #[must_use]
    pub fn mid_y(&self) -> f64 { self.origin.y + self.size.height / 2.0 }

    #[must_use]
    pub fn width(&self) -> f64 { self.size.width }

    #[must_use]
    pub fn height(&self) -> f64 { self.size.height }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.size.width <= 0.0 || self.size.height <= 0.0 }

    /// Open-interval overlap test on both axes. Zero height rects (carets) intersect
    /// anything whose vertical span strictly contains their y.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x() <= other.max_x()
            && other.min_x() <= self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.min_x().min(other.min_x());
        let min_y = self.min_y().min(other.min_y());
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Positive `dx`, `dy` shrink the rect, negative values grow it.
    #[must_use]
    pub fn inset_by(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(
            self.min_x() + dx,
            self.min_y() + dy,
            (self.width() - 2.0 * dx).max(0.0),
            (self.height() - 2.0 * dy).max(0.0),
        )
    }

    #[must_use]
    pub fn offset_by(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            origin: self.origin.offset_by(dx, dy),
            size: self.size,
        }
    }

    #[must_use]
    pub fn is_almost_equal(&self, other: &Rect) -> bool {
        is_almost_zero(self.min_x() - other.min_x())
            && is_almost_zero(self.min_y() - other.min_y())
            && is_almost_zero(self.width() - other.width())
            && is_almost_zero(self.height() - other.height())
    }

    /// Snaps the rect outward to device pixel boundaries for the given backing scale.
    #[must_use]
    pub fn pixel_aligned(&self, scale: f64) -> Rect {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let min_x = (self.min_x() * scale).floor() / scale;
        let min_y = (self.min_y() * scale).floor() / scale;
        let max_x = (self.max_x() * scale).ceil() / scale;
        let max_y = (self.max_y() * scale).ceil() / scale;
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

impl Display for Rect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[x: {:.1}, y: {:.1}, w: {:.1}, h: {:.1}]",
            self.min_x(),
            self.min_y(),
            self.width(),
            self.height()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pixel_aligned_rounds_outward() {
        let rect = Rect::new(0.3, 10.6, 10.0, 5.2);
        assert_eq!(rect.pixel_aligned(1.0), Rect::new(0.0, 10.0, 11.0, 6.0));
        assert_eq!(rect.pixel_aligned(2.0), Rect::new(0.0, 10.5, 10.5, 5.5));
    }

    #[test]
    fn test_intersects_and_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 9.0, 10.0, 10.0);
        let c = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&c), Rect::new(0.0, 0.0, 10.0, 20.0));
    }

    #[test]
    fn test_almost_equal() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.is_almost_equal(&Rect::new(0.000_01, 0.0, 10.0, 10.0)));
        assert!(!a.is_almost_equal(&Rect::new(0.1, 0.0, 10.0, 10.0)));
    }
}
