// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{cell::Cell,
          fmt::{Display, Formatter}};

use smallvec::SmallVec;

use crate::{AttributeRun, AttributedString, DocRange, LineFragment, Location, Rect};

/// Identity of a [`LayoutFragment`] for its lifetime. A fragment that is laid out again
/// after an edit or a width change gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(pub u64);

impl Display for FragmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "#{}", self.0) }
}

/// Laid out geometry for one paragraph.
///
/// Owned by the [`crate::LayoutFragmentStore`]. The frame and range are interior
/// mutable so the store can move a fragment (after an edit above it, or after an
/// anchor change) without invalidating its identity.
#[derive(Debug)]
pub struct LayoutFragment {
    id: FragmentId,
    range_in_element: Cell<DocRange>,
    frame: Cell<Rect>,
    content: AttributedString,
    line_fragments: SmallVec<[LineFragment; 2]>,
    is_extra_fragment: bool,
}

impl LayoutFragment {
    pub(crate) fn new(
        id: FragmentId,
        range_in_element: DocRange,
        frame: Rect,
        content: AttributedString,
        line_fragments: SmallVec<[LineFragment; 2]>,
        is_extra_fragment: bool,
    ) -> Self {
        Self {
            id,
            range_in_element: Cell::new(range_in_element),
            frame: Cell::new(frame),
            content,
            line_fragments,
            is_extra_fragment,
        }
    }

    #[must_use]
    pub fn id(&self) -> FragmentId { self.id }

    #[must_use]
    pub fn range_in_element(&self) -> DocRange { self.range_in_element.get() }

    #[must_use]
    pub fn frame(&self) -> Rect { self.frame.get() }

    #[must_use]
    pub fn text(&self) -> &str { self.content.text() }

    #[must_use]
    pub fn runs(&self) -> &[AttributeRun] { self.content.runs() }

    #[must_use]
    pub fn line_fragments(&self) -> &[LineFragment] { &self.line_fragments }

    /// The synthesized fragment of an empty document.
    #[must_use]
    pub fn is_extra_fragment(&self) -> bool { self.is_extra_fragment }

    #[must_use]
    pub fn has_extra_line_fragment(&self) -> bool {
        self.line_fragments
            .last()
            .is_some_and(LineFragment::is_extra_line_fragment)
    }

    pub(crate) fn set_origin_y(&self, y: f64) {
        let mut frame = self.frame.get();
        frame.origin.y = y;
        self.frame.set(frame);
    }

    pub(crate) fn shift_range(&self, delta: isize) {
        let range = self.range_in_element.get().byte_range();
        let shift = |it: usize| it.saturating_add_signed(delta);
        self.range_in_element
            .set(DocRange::from_byte_range(shift(range.start)..shift(range.end)));
    }

    /// Document location for a byte index relative to this fragment.
    #[must_use]
    pub fn location_at(&self, relative_byte_index: usize) -> Location {
        let start = self.range_in_element().location().byte_index();
        Location::from_byte_index(start + relative_byte_index.min(self.content.len()))
    }

    /// Byte index relative to this fragment, if `location` falls inside (or at the end
    /// of) it.
    #[must_use]
    pub fn relative_index(&self, location: Location) -> Option<usize> {
        let range = self.range_in_element();
        (range.location() <= location && location <= range.end_location())
            .then(|| location.byte_index() - range.location().byte_index())
    }

    /// Line fragment whose vertical span contains `y` (content coordinates).
    #[must_use]
    pub fn line_index_at_y(&self, y: f64) -> Option<usize> {
        let local_y = y - self.frame().min_y();
        self.line_fragments.iter().position(|line| {
            local_y >= line.typographic_bounds.min_y() && local_y < line.typographic_bounds.max_y()
        })
    }

    /// Line fragment holding the caret for `relative_byte_index`, ignoring affinity.
    #[must_use]
    pub fn line_index_for(&self, relative_byte_index: usize) -> Option<usize> {
        if self.line_fragments.is_empty() {
            return None;
        }
        if let Some(index) = self.line_fragments.iter().position(|line| {
            !line.is_extra_line_fragment() && line.character_range.contains(&relative_byte_index)
        }) {
            return Some(index);
        }
        // Past the last character: the extra line if there is one, else the last line.
        Some(self.line_fragments.len() - 1)
    }

    /// Line bounds in content coordinates.
    #[must_use]
    pub fn line_rect(&self, line_index: usize) -> Option<Rect> {
        let frame = self.frame();
        self.line_fragments
            .get(line_index)
            .map(|line| line.typographic_bounds.offset_by(frame.min_x(), frame.min_y()))
    }
}
