// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{GEOMETRY_EPSILON, Rect, Size, is_almost_zero};

/// The scrollable container that hosts the text view.
///
/// Only the [`crate::ViewportLayoutController`] calls [`ScrollHost::scroll_by`].
pub trait ScrollHost: std::fmt::Debug {
    /// Visible portion of the document view, in content coordinates.
    fn visible_rect(&self) -> Rect;

    /// Bounds of the document view, in content coordinates.
    fn bounds(&self) -> Rect;

    /// Scrolls the minimum amount so that `rect` is visible. Returns `true` if the
    /// scroll position changed.
    fn scroll_to_visible(&mut self, rect: Rect) -> bool;

    /// Moves the scroll position by `dy` without moving the content under it.
    fn scroll_by(&mut self, dy: f64);

    /// Hosts keep the scroll position inside the new bounds.
    fn set_document_height(&mut self, height: f64);
}

/// In-memory [`ScrollHost`]. The document view is never shorter than the clip view.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipView {
    size: Size,
    offset_y: f64,
    document_height: f64,
}

impl ClipView {
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            offset_y: 0.0,
            document_height: 0.0,
        }
    }

    #[must_use]
    pub fn offset_y(&self) -> f64 { self.offset_y }

    #[must_use]
    pub fn size(&self) -> Size { self.size }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
        self.scroll_to(self.offset_y);
    }

    /// Clamped to the scrollable range.
    pub fn scroll_to(&mut self, offset_y: f64) {
        let max_offset = (self.bounds().height() - self.size.height).max(0.0);
        self.offset_y = offset_y.clamp(0.0, max_offset);
    }

    /// `true` if the bottom of the visible rect is at the bottom of a document that is
    /// taller than the clip view.
    #[must_use]
    pub fn is_scrolled_to_end(&self) -> bool { is_scrolled_to_end(self.visible_rect(), self.bounds()) }
}

/// See [`ClipView::is_scrolled_to_end`].
#[must_use]
pub fn is_scrolled_to_end(visible: Rect, bounds: Rect) -> bool {
    bounds.height() > visible.height() + GEOMETRY_EPSILON
        && visible.max_y() >= bounds.max_y() - GEOMETRY_EPSILON
}

impl ScrollHost for ClipView {
    fn visible_rect(&self) -> Rect {
        Rect::new(0.0, self.offset_y, self.size.width, self.size.height)
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.size.width, self.document_height.max(self.size.height))
    }

    fn scroll_to_visible(&mut self, rect: Rect) -> bool {
        let visible = self.visible_rect();
        let target = if rect.min_y() < visible.min_y() || rect.height() > visible.height() {
            rect.min_y()
        } else if rect.max_y() > visible.max_y() {
            rect.max_y() - visible.height()
        } else {
            return false;
        };
        let before = self.offset_y;
        self.scroll_to(target);
        !is_almost_zero(before - self.offset_y)
    }

    fn scroll_by(&mut self, dy: f64) { self.offset_y = (self.offset_y + dy).max(0.0); }

    /// A shorter document pulls the scroll position back into range.
    fn set_document_height(&mut self, height: f64) {
        self.document_height = height.max(0.0);
        self.scroll_to(self.offset_y);
    }
}
