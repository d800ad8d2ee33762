// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The content rect that must stay laid out.
//!
//! ```text
//!  bounds.min_x                         bounds.max_x
//!  ┌──────────────────────────────────────────┐
//!  │ overdraw (above)                         │
//!  ├──────────────────────────────────────────┤ ┐
//!  │ visible rect                             │ │ viewport bounds
//!  ├──────────────────────────────────────────┤ │ (full bounds width)
//!  │ overdraw (below)                         │ ┘
//!  └──────────────────────────────────────────┘
//! ```

use crate::Rect;

/// Overdraw rect: `visible` grown by `multiplier × visible height` above and below,
/// clamped to `bounds`.
#[must_use]
pub fn overdraw_rect(visible: Rect, bounds: Rect, multiplier: f64) -> Rect {
    let margin = visible.height() * multiplier.max(0.0);
    let min_y = (visible.min_y() - margin).max(bounds.min_y());
    let max_y = (visible.max_y() + margin).min(bounds.max_y());
    Rect::new(bounds.min_x(), min_y, bounds.width(), (max_y - min_y).max(0.0))
}

/// Union of the visible and overdraw rects, always as wide as `bounds` so that wrap
/// decisions do not depend on horizontal scrolling. Falls back to the visible rect
/// when the two do not intersect.
#[must_use]
pub fn viewport_bounds(visible: Rect, overdraw: Rect, bounds: Rect) -> Rect {
    let (min_y, max_y) = if overdraw.intersects(&visible) {
        (
            overdraw.min_y().min(visible.min_y().max(bounds.min_y())),
            overdraw.max_y().max(visible.max_y()),
        )
    } else {
        (visible.min_y(), visible.max_y())
    };
    Rect::new(bounds.min_x(), min_y, bounds.width(), max_y - min_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overdraw_is_clamped_to_bounds() {
        let bounds = Rect::new(0.0, 0.0, 300.0, 1000.0);
        let visible = Rect::new(20.0, 10.0, 100.0, 100.0);
        assert_eq!(
            overdraw_rect(visible, bounds, 0.5),
            Rect::new(0.0, 0.0, 300.0, 160.0)
        );
    }

    #[test]
    fn test_viewport_spans_bounds_width() {
        let bounds = Rect::new(0.0, 0.0, 300.0, 1000.0);
        let visible = Rect::new(20.0, 200.0, 100.0, 100.0);
        let overdraw = overdraw_rect(visible, bounds, 0.5);
        assert_eq!(
            viewport_bounds(visible, overdraw, bounds),
            Rect::new(0.0, 150.0, 300.0, 200.0)
        );
    }

    #[test]
    fn test_falls_back_to_visible_without_overdraw() {
        // Before the first layout the bounds have no height.
        let bounds = Rect::new(0.0, 0.0, 300.0, 0.0);
        let visible = Rect::new(0.0, 0.0, 300.0, 100.0);
        let overdraw = overdraw_rect(visible, bounds, 1.0);
        assert_eq!(viewport_bounds(visible, overdraw, bounds), visible);
    }
}
