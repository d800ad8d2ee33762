// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Point ↔ location mapping with affinity.
//!
//! Two carets can be drawn at the same document location when a line soft wraps:
//!
//! ```text
//!             x=0                  x=30
//!  line 0     H e l l o ␣          ▏  ← (6, Upstream): end of line 0
//!  line 1     ▏w o r l d
//!             ↑ (6, Downstream): start of line 1
//! ```
//!
//! A click past the end of a line resolves to that line's end with
//! [`Affinity::Upstream`], so the caret stays on the line that was clicked.

use std::rc::Rc;

use crate::{Affinity, DocRange, DocumentModel, LayoutFragment, LayoutFragmentStore,
            LineFragment, Location, Point, Rect, SelectionSet};

pub const DEFAULT_CLICK_AFFINITY_THRESHOLD: f64 = 50.0;
pub const INSERTION_POINT_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverOptions {
    /// Resolve points above or below the laid out lines to the nearest line instead of
    /// failing.
    pub allow_outside: bool,
    /// How far right of a continuation line's first caret offset a click that still
    /// lands on the line start has to be to count as a click past the end of the
    /// previous line. A heuristic, not an exact geometric rule.
    pub affinity_threshold: f64,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            allow_outside: false,
            affinity_threshold: DEFAULT_CLICK_AFFINITY_THRESHOLD,
        }
    }
}

/// Line holding a caret.
#[derive(Debug, Clone)]
pub struct CaretLine {
    pub fragment: Rc<LayoutFragment>,
    pub line_index: usize,
    /// Caret position, relative to the fragment.
    pub relative_index: usize,
}

impl CaretLine {
    #[must_use]
    pub fn line(&self) -> &LineFragment { &self.fragment.line_fragments()[self.line_index] }

    /// Caret x in content coordinates.
    #[must_use]
    pub fn caret_x(&self) -> f64 {
        let line = self.line();
        self.fragment.frame().min_x()
            + line.typographic_bounds.min_x()
            + line.caret_x(self.relative_index)
    }

    #[must_use]
    pub fn line_rect(&self) -> Rect {
        self.fragment
            .line_rect(self.line_index)
            .unwrap_or_else(|| self.fragment.frame())
    }
}

/// Geometry queries over a [`LayoutFragmentStore`]. Lays out fragments as needed, one
/// at a time.
#[derive(Debug)]
pub struct CaretResolver<'a, D: DocumentModel + ?Sized> {
    store: &'a mut LayoutFragmentStore,
    doc: &'a D,
    options: ResolverOptions,
}

impl<'a, D: DocumentModel + ?Sized> CaretResolver<'a, D> {
    pub fn new(store: &'a mut LayoutFragmentStore, doc: &'a D, options: ResolverOptions) -> Self {
        Self {
            store,
            doc,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> ResolverOptions { self.options }

    #[must_use]
    pub fn doc(&self) -> &'a D { self.doc }

    pub fn store(&mut self) -> &mut LayoutFragmentStore { &mut *self.store }

    /// Caret location and affinity for a click at `point`.
    ///
    /// `container_location` names the fragment to resolve in when `point` lies outside
    /// every fragment.
    pub fn caret_location_with_affinity(
        &mut self,
        point: Point,
        container_location: Option<Location>,
    ) -> Option<(Location, Affinity)> {
        let (fragment, line_index) = self.line_at_point(point, container_location)?;
        let line = &fragment.line_fragments()[line_index];
        let local_x = point.x - fragment.frame().min_x() - line.typographic_bounds.min_x();
        let line_start = fragment.location_at(line.character_range.start);

        // Extra line fragment.
        if line.leading_offsets().next().is_none() {
            return Some((line_start, Affinity::Downstream));
        }

        // Offsets are monotonic, stop once the distance grows.
        let mut closest: Option<(usize, f64)> = None;
        for offset in line.leading_offsets() {
            let distance = (offset.x - local_x).abs();
            match closest {
                Some((_, best)) if distance >= best => break,
                _ => closest = Some((offset.byte_index, distance)),
            }
        }
        let (byte_index, _) = closest?;

        if line.starts_after_soft_wrap
            && byte_index == line.character_range.start
            && local_x - line.first_caret_x() > self.options.affinity_threshold
            && let Some(previous) = line_index
                .checked_sub(1)
                .and_then(|it| fragment.line_fragments().get(it))
            && let Some(last) = previous.leading_offsets().last()
        {
            // Past the end of the previous line.
            return Some((fragment.location_at(last.byte_index), Affinity::Upstream));
        }

        if local_x > line.end_caret_x() {
            let end = fragment.location_at(line.content_end(fragment.text()));
            return Some((end, Affinity::Upstream));
        }

        Some((fragment.location_at(byte_index), Affinity::Downstream))
    }

    /// Location for a click at `point`, ignoring affinity.
    pub fn location_interacting_at(&mut self, point: Point) -> Option<Location> {
        self.caret_location_with_affinity(point, None)
            .map(|(location, _)| location)
    }

    /// Document range of the line under `point`.
    pub fn line_fragment_range(&mut self, point: Point) -> Option<DocRange> {
        let (fragment, line_index) = self.line_at_point(point, None)?;
        let range = &fragment.line_fragments()[line_index].character_range;
        Some(DocRange::from_unordered(
            fragment.location_at(range.start),
            fragment.location_at(range.end),
        ))
    }

    /// Line holding the caret at `location`. With [`Affinity::Upstream`] a location at
    /// the start of a continuation line belongs to the end of the previous line.
    pub fn caret_line(&mut self, location: Location, affinity: Affinity) -> Option<CaretLine> {
        let fragment = self.store.fragment_for(self.doc, location)?;
        let relative_index = fragment.relative_index(location)?;
        let mut line_index = fragment.line_index_for(relative_index)?;
        let line = &fragment.line_fragments()[line_index];
        if affinity == Affinity::Upstream
            && line_index > 0
            && line.starts_after_soft_wrap
            && relative_index == line.character_range.start
        {
            line_index -= 1;
        }
        Some(CaretLine {
            fragment,
            line_index,
            relative_index,
        })
    }

    pub fn caret_rect(&mut self, location: Location, affinity: Affinity) -> Option<Rect> {
        let caret_line = self.caret_line(location, affinity)?;
        let line_rect = caret_line.line_rect();
        Some(Rect::new(
            caret_line.caret_x(),
            line_rect.min_y(),
            INSERTION_POINT_WIDTH,
            line_rect.height(),
        ))
    }

    /// Full width rect of the line holding the caret.
    pub fn line_highlight_rect(&mut self, location: Location, affinity: Affinity) -> Option<Rect> {
        let caret_line = self.caret_line(location, affinity)?;
        let frame = caret_line.fragment.frame();
        let line_rect = caret_line.line_rect();
        Some(Rect::new(
            frame.min_x(),
            line_rect.min_y(),
            frame.width(),
            line_rect.height(),
        ))
    }

    /// Highlight rects for `range`, one per line it touches. A line whose line break
    /// (or wrap point) is selected highlights to the end of its fragment.
    pub fn segment_frames(&mut self, range: DocRange) -> Vec<Rect> {
        let range = range.clamped(&self.doc.document_range());
        if range.is_empty() {
            return vec![];
        }
        let fragments: Vec<Rc<LayoutFragment>> =
            self.store.fragments_intersecting(self.doc, range).collect();

        let selected = range.byte_range();
        let mut rects = vec![];
        for fragment in fragments {
            let frame = fragment.frame();
            let text = fragment.text();
            let start = fragment.range_in_element().location().byte_index();
            let relative_start = selected.start.saturating_sub(start);
            let relative_end = selected.end.saturating_sub(start).min(text.len());

            for line in fragment.line_fragments() {
                if line.is_extra_line_fragment() {
                    continue;
                }
                let lo = relative_start.max(line.character_range.start);
                let hi = relative_end.min(line.character_range.end);
                if lo >= hi {
                    continue;
                }
                let bounds = line.typographic_bounds;
                let min_x = bounds.min_x() + line.caret_x(lo);
                let selects_line_end = hi > line.content_end(text)
                    || selected.end.saturating_sub(start) > line.character_range.end;
                let max_x = if selects_line_end {
                    frame.width()
                } else {
                    bounds.min_x() + line.caret_x(hi)
                };
                rects.push(Rect::new(
                    frame.min_x() + min_x,
                    frame.min_y() + bounds.min_y(),
                    (max_x - min_x).max(0.0),
                    bounds.height(),
                ));
            }
        }
        rects
    }

    /// Caret rects of the insertion points in `selections`.
    pub fn insertion_point_rects(&mut self, selections: &SelectionSet) -> Vec<Rect> {
        selections
            .iter()
            .filter(|it| it.is_insertion_point())
            .filter_map(|it| self.caret_rect(it.range().location(), it.affinity))
            .collect()
    }
}

mod impl_hit_testing {
    use super::*;

    impl<D: DocumentModel + ?Sized> CaretResolver<'_, D> {
        pub(super) fn line_at_point(
            &mut self,
            point: Point,
            container_location: Option<Location>,
        ) -> Option<(Rc<LayoutFragment>, usize)> {
            let fragment = match self.store.fragment_at_point(self.doc, point) {
                Some(fragment) => fragment,
                None => match container_location {
                    Some(location) => self.store.fragment_for(self.doc, location)?,
                    None if self.options.allow_outside => self.nearest_fragment(point)?,
                    None => return None,
                },
            };

            let line_index = match fragment.line_index_at_y(point.y) {
                Some(index) => index,
                None if self.options.allow_outside || container_location.is_some() => {
                    if point.y < fragment.frame().min_y() {
                        0
                    } else {
                        fragment.line_fragments().len().checked_sub(1)?
                    }
                }
                None => return None,
            };
            Some((fragment, line_index))
        }

        fn nearest_fragment(&mut self, point: Point) -> Option<Rc<LayoutFragment>> {
            let range = self.doc.document_range();
            let location = if point.y < self.store.top_of_document() {
                range.location()
            } else {
                range.end_location()
            };
            self.store.fragment_for(self.doc, location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LayoutConfig, MonospaceShaper, TextContentStorage};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn store_for(doc: &TextContentStorage, width: f64) -> LayoutFragmentStore {
        let mut store = LayoutFragmentStore::new(
            Box::new(MonospaceShaper),
            LayoutConfig {
                container_width: width,
                ..Default::default()
            },
        );
        store.rebuild(doc);
        store
    }

    fn resolve(
        text: &str,
        width: f64,
        point: Point,
        options: ResolverOptions,
    ) -> Option<(usize, Affinity)> {
        let doc = TextContentStorage::from_plain(text);
        let mut store = store_for(&doc, width);
        let mut resolver = CaretResolver::new(&mut store, &doc, options);
        resolver
            .caret_location_with_affinity(point, None)
            .map(|(location, affinity)| (doc.offset_from_start(location), affinity))
    }

    #[test_case(Point::new(1000.0, 5.0), (6, Affinity::Upstream) ; "past the end of a wrapped line")]
    #[test_case(Point::new(0.0, 15.0), (6, Affinity::Downstream) ; "start of the continuation line")]
    #[test_case(Point::new(11.0, 5.0), (2, Affinity::Downstream) ; "closest leading edge")]
    #[test_case(Point::new(1000.0, 15.0), (11, Affinity::Upstream) ; "past the end of the document")]
    fn test_caret_affinity_at_wrap(point: Point, expected: (usize, Affinity)) {
        let resolved = resolve("Hello world", 40.0, point, ResolverOptions::default());
        assert_eq!(resolved, Some(expected));
    }

    #[test]
    fn test_click_past_continuation_start_resolves_to_previous_line_end() {
        // "aaaa " wraps before the double width "漢", which has one leading edge at 0.
        let narrow = ResolverOptions {
            affinity_threshold: 5.0,
            ..Default::default()
        };
        // Resolves to the last leading edge of "aaaa ", the hanging space.
        assert_eq!(
            resolve("aaaa 漢", 25.0, Point::new(8.0, 15.0), narrow),
            Some((4, Affinity::Upstream))
        );
        // Right of all text on the continuation line, still the previous line.
        assert_eq!(
            resolve("aaaa 漢", 25.0, Point::new(1000.0, 15.0), narrow),
            Some((4, Affinity::Upstream))
        );
        assert_eq!(
            resolve("aaaa 漢", 25.0, Point::new(8.0, 15.0), ResolverOptions::default()),
            Some((5, Affinity::Downstream))
        );
    }

    #[test]
    fn test_empty_document_caret() {
        let resolved = resolve("", 500.0, Point::new(30.0, 5.0), ResolverOptions::default());
        assert_eq!(resolved, Some((0, Affinity::Downstream)));
    }

    #[test]
    fn test_outside_points() {
        let below = Point::new(3.0, 500.0);
        assert_eq!(resolve("ab\ncd", 500.0, below, ResolverOptions::default()), None);
        let clamped = ResolverOptions {
            allow_outside: true,
            ..Default::default()
        };
        assert_eq!(
            resolve("ab\ncd", 500.0, below, clamped),
            Some((4, Affinity::Downstream))
        );
    }

    #[test]
    fn test_trailing_empty_line_is_clickable() {
        let resolved = resolve("ab\n", 500.0, Point::new(40.0, 15.0), ResolverOptions::default());
        assert_eq!(resolved, Some((3, Affinity::Downstream)));
    }

    #[test]
    fn test_caret_rect_follows_affinity() {
        let doc = TextContentStorage::from_plain("Hello world");
        let mut store = store_for(&doc, 40.0);
        let mut resolver = CaretResolver::new(&mut store, &doc, ResolverOptions::default());
        let wrap = doc.location_from_start(6).unwrap();
        assert_eq!(
            resolver.caret_rect(wrap, Affinity::Upstream),
            Some(Rect::new(30.0, 0.0, 1.0, 10.0))
        );
        assert_eq!(
            resolver.caret_rect(wrap, Affinity::Downstream),
            Some(Rect::new(0.0, 10.0, 1.0, 10.0))
        );
        assert_eq!(
            resolver.line_highlight_rect(wrap, Affinity::Upstream),
            Some(Rect::new(0.0, 0.0, 40.0, 10.0))
        );
    }

    #[test]
    fn test_segment_frames_span_lines() {
        let doc = TextContentStorage::from_plain("012\n456\n89");
        let mut store = store_for(&doc, 500.0);
        let mut resolver = CaretResolver::new(&mut store, &doc, ResolverOptions::default());
        let frames = resolver.segment_frames(doc.range_from_chars(1, 5));
        assert_eq!(
            frames,
            vec![Rect::new(5.0, 0.0, 495.0, 10.0), Rect::new(0.0, 10.0, 10.0, 10.0)]
        );
        assert!(resolver.segment_frames(doc.range_from_chars(2, 0)).is_empty());
    }

    #[test]
    fn test_line_fragment_range() {
        let doc = TextContentStorage::from_plain("Hello world");
        let mut store = store_for(&doc, 40.0);
        let mut resolver = CaretResolver::new(&mut store, &doc, ResolverOptions::default());
        let range = resolver.line_fragment_range(Point::new(0.0, 12.0)).unwrap();
        assert_eq!(doc.char_range(range), (6, 5));
    }
}
