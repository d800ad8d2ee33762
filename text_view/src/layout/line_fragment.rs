// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::ops::Range;

use smallvec::SmallVec;

use crate::{CaretOffset, LineMetrics, Rect};

/// One visually wrapped line inside a [`crate::LayoutFragment`].
///
/// - `character_range` is in bytes, relative to the start of the fragment.
/// - `typographic_bounds` has its origin relative to the fragment frame.
/// - An extra line fragment (the caret position after a trailing line break, or in an
///   empty document) has an empty `character_range`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFragment {
    pub character_range: Range<usize>,
    pub typographic_bounds: Rect,
    pub metrics: LineMetrics,
    pub caret_offsets: SmallVec<[CaretOffset; 32]>,
    /// This line continues the previous one after a soft wrap.
    pub starts_after_soft_wrap: bool,
}

impl LineFragment {
    #[must_use]
    pub fn is_extra_line_fragment(&self) -> bool { self.character_range.is_empty() }

    pub fn leading_offsets(&self) -> impl Iterator<Item = &CaretOffset> {
        self.caret_offsets.iter().filter(|it| it.is_leading())
    }

    /// X of the leading edge of the first grapheme.
    #[must_use]
    pub fn first_caret_x(&self) -> f64 { self.leading_offsets().next().map_or(0.0, |it| it.x) }

    /// X past the last grapheme (its trailing edge).
    #[must_use]
    pub fn end_caret_x(&self) -> f64 {
        self.caret_offsets.iter().map(|it| it.x).fold(0.0, f64::max)
    }

    /// Byte index (relative to the fragment) just past the last grapheme, which excludes
    /// a trailing line break.
    #[must_use]
    pub fn content_end(&self, fragment_text: &str) -> usize {
        let end = self.character_range.end.min(fragment_text.len());
        let start = self.character_range.start.min(end);
        let line = &fragment_text[start..end];
        start + crate::strip_line_break(line).len()
    }

    /// Caret x for a byte index relative to the fragment. Indexes past the last
    /// grapheme map to the trailing edge of the line.
    #[must_use]
    pub fn caret_x(&self, byte_index: usize) -> f64 {
        self.leading_offsets()
            .find(|it| it.byte_index >= byte_index)
            .map_or_else(|| self.end_caret_x(), |it| it.x)
    }
}
