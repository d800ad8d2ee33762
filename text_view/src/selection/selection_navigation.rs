// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Selection movement and selection by interaction.
//!
//! Every operation takes selections by reference and returns new ones. Extending
//! keeps the anchor end fixed and moves the other (the head):
//!
//! ```text
//!   anchor          head                         anchor  head
//!     ▼               ▼      extend left ×3        ▼       ▼
//!  0 1 2 3 4 5 6 7 8 9     ───────────────▶   0 1 2 3 4 5 6 7 8 9
//!        [=======)                                  [=)
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::{Affinity, CaretLine, CaretResolver, DocRange, DocumentModel, Direction,
            EnumerationOptions, Granularity, LayoutFragmentStore, Location, Point, Rect,
            ResolverOptions, SelectionModifiers, SelectionSet, TextElement, TextSelection};

/// Moves and builds selections using the geometry from a [`CaretResolver`].
#[derive(Debug)]
pub struct SelectionNavigation<'a, D: DocumentModel + ?Sized> {
    resolver: CaretResolver<'a, D>,
}

impl<'a, D: DocumentModel + ?Sized> SelectionNavigation<'a, D> {
    pub fn new(store: &'a mut LayoutFragmentStore, doc: &'a D, options: ResolverOptions) -> Self {
        Self {
            resolver: CaretResolver::new(store, doc, options),
        }
    }

    pub fn resolver(&mut self) -> &mut CaretResolver<'a, D> { &mut self.resolver }

    /// Selection after moving `selection` in `direction` by `granularity`.
    ///
    /// - Without `extending`, a non empty selection moved by character collapses to
    ///   its start or end.
    /// - With `extending`, the anchor stays and the head moves.
    /// - `confined` keeps line and paragraph moves on the current line or paragraph.
    ///
    /// Moves past the document bounds clamp. [`None`] means no geometry was available
    /// and the selection should stay as it is.
    pub fn destination_selection(
        &mut self,
        selection: &TextSelection,
        direction: Direction,
        granularity: Granularity,
        extending: bool,
        confined: bool,
    ) -> Option<TextSelection> {
        let range = selection.range();

        if !extending
            && !range.is_empty()
            && granularity == Granularity::Character
            && !direction.is_vertical()
        {
            let location = if direction.is_backward() {
                range.location()
            } else {
                range.end_location()
            };
            return Some(TextSelection::insertion_point(location, Affinity::Downstream));
        }

        let (anchor, head) = if extending {
            anchor_and_head(selection, direction)
        } else if direction.is_backward() {
            (range.location(), range.location())
        } else {
            (range.end_location(), range.end_location())
        };

        let sticky_x = selection.anchor_position_offset;
        let (location, affinity, sticky_x) = self.move_location(
            head,
            selection.affinity,
            direction,
            granularity,
            confined,
            sticky_x,
        )?;

        let destination = if extending {
            TextSelection::new(
                DocRange::from_unordered(anchor, location),
                affinity,
                selection.granularity,
            )
            .with_anchor(Some(anchor))
        } else {
            TextSelection::insertion_point(location, affinity)
        };
        Some(destination.with_anchor_position_offset(sticky_x))
    }

    /// Selection of the `granularity` unit enclosing `location`.
    ///
    /// For [`Granularity::Word`], a location past the last word of its line (or at the
    /// end of the document) selects the last word before it, walking back over empty
    /// lines.
    pub fn text_selection_for(
        &mut self,
        granularity: Granularity,
        enclosing: Location,
    ) -> Option<TextSelection> {
        let doc = self.resolver.doc();
        let range = match granularity {
            Granularity::Character => DocRange::empty_at(enclosing),
            Granularity::Word => word_range(doc, enclosing),
            Granularity::Line => {
                let caret = self.resolver.caret_line(enclosing, Affinity::Downstream)?;
                let line_range = caret.line().character_range.clone();
                DocRange::from_unordered(
                    caret.fragment.location_at(line_range.start),
                    caret.fragment.location_at(line_range.end),
                )
            }
            Granularity::Paragraph => element_at(doc, enclosing)
                .map_or(DocRange::empty_at(enclosing), |it| it.range),
            Granularity::Document => doc.document_range(),
        };
        Some(TextSelection::new(range, Affinity::Downstream, granularity))
    }

    /// Selections produced by a click or drag at `point`.
    ///
    /// When extending (shift, or `selecting` during a drag), the last of `anchors`
    /// is extended to `point` in units of `granularity`. With the `multiple` modifier
    /// the other anchors are kept.
    pub fn text_selections_interacting_at(
        &mut self,
        point: Point,
        container_location: Option<Location>,
        anchors: &[TextSelection],
        modifiers: SelectionModifiers,
        selecting: bool,
        granularity: Granularity,
    ) -> Vec<TextSelection> {
        let Some((location, affinity)) = self
            .resolver
            .caret_location_with_affinity(point, container_location)
        else {
            return vec![];
        };

        let mut result = if modifiers.multiple {
            anchors.to_vec()
        } else {
            vec![]
        };

        if (modifiers.extend || selecting)
            && let Some(anchor_selection) = anchors.last()
        {
            let extended = if granularity == Granularity::Character {
                let anchor = anchor_selection.anchor().unwrap_or_else(|| {
                    let range = anchor_selection.range();
                    if location < range.location() {
                        range.end_location()
                    } else {
                        range.location()
                    }
                });
                TextSelection::new(
                    DocRange::from_unordered(anchor, location),
                    affinity,
                    Granularity::Character,
                )
                .with_anchor(Some(anchor))
            } else {
                let Some(unit) = self.text_selection_for(granularity, location) else {
                    return result;
                };
                TextSelection::new(
                    anchor_selection.range().union(&unit.range()),
                    Affinity::Downstream,
                    granularity,
                )
                .with_anchor(anchor_selection.anchor())
            };
            if modifiers.multiple {
                result.pop();
            }
            result.push(extended);
            return result;
        }

        let selection = if granularity == Granularity::Character {
            TextSelection::insertion_point(location, affinity)
        } else {
            match self.text_selection_for(granularity, location) {
                Some(it) => it,
                None => return result,
            }
        };
        result.push(selection);
        result
    }

    /// Adds an insertion point at `point` to `selections`.
    pub fn append_insertion_point_at(
        &mut self,
        point: Point,
        selections: &SelectionSet,
    ) -> Option<SelectionSet> {
        let (location, affinity) = self.resolver.caret_location_with_affinity(point, None)?;
        let mut all = selections.selections().to_vec();
        all.push(TextSelection::insertion_point(location, affinity));
        Some(SelectionSet::new(all))
    }
}

mod impl_moves {
    use super::*;

    impl<D: DocumentModel + ?Sized> SelectionNavigation<'_, D> {
        pub(super) fn move_location(
            &mut self,
            from: Location,
            affinity: Affinity,
            direction: Direction,
            granularity: Granularity,
            confined: bool,
            sticky_x: Option<f64>,
        ) -> Option<(Location, Affinity, Option<f64>)> {
            let doc = self.resolver.doc();
            let backward = direction.is_backward();
            let downstream = |it: Location| Some((it, Affinity::Downstream, None));

            match granularity {
                Granularity::Character | Granularity::Word | Granularity::Line
                    if direction.is_vertical() =>
                {
                    self.vertical_move(from, affinity, direction, sticky_x)
                }
                Granularity::Character => {
                    let next = if backward {
                        doc.prev_grapheme_location(from)
                    } else {
                        doc.next_grapheme_location(from)
                    };
                    downstream(next.unwrap_or(from))
                }
                Granularity::Word => downstream(word_boundary(doc, from, backward)),
                Granularity::Line => {
                    let (location, affinity) =
                        self.line_boundary(from, affinity, backward, confined)?;
                    Some((location, affinity, None))
                }
                Granularity::Paragraph => {
                    let mut location = paragraph_boundary(doc, from, backward);
                    if !confined && location == from {
                        let step = if backward {
                            doc.prev_grapheme_location(from)
                        } else {
                            doc.next_grapheme_location(from)
                        };
                        if let Some(step) = step {
                            location = paragraph_boundary(doc, step, backward);
                        }
                    }
                    downstream(location)
                }
                Granularity::Document => {
                    let range = doc.document_range();
                    downstream(if backward {
                        range.location()
                    } else {
                        range.end_location()
                    })
                }
            }
        }

        fn line_boundary(
            &mut self,
            from: Location,
            affinity: Affinity,
            backward: bool,
            confined: bool,
        ) -> Option<(Location, Affinity)> {
            let boundary = self.visual_line_boundary(from, affinity, backward)?;
            if confined || boundary.0 != from {
                return Some(boundary);
            }
            // Already at the boundary, continue on the adjacent line.
            let doc = self.resolver.doc();
            let step = if backward {
                doc.prev_grapheme_location(from)
            } else {
                doc.next_grapheme_location(from)
            };
            match step {
                Some(step) => self.visual_line_boundary(step, Affinity::Downstream, backward),
                None => Some(boundary),
            }
        }

        fn visual_line_boundary(
            &mut self,
            from: Location,
            affinity: Affinity,
            backward: bool,
        ) -> Option<(Location, Affinity)> {
            let caret = self.resolver.caret_line(from, affinity)?;
            let line = caret.line();
            if backward {
                let start = caret.fragment.location_at(line.character_range.start);
                return Some((start, Affinity::Downstream));
            }
            let end = caret.fragment.location_at(line.content_end(caret.fragment.text()));
            let wraps = caret
                .fragment
                .line_fragments()
                .get(caret.line_index + 1)
                .is_some_and(|it| it.starts_after_soft_wrap);
            let affinity = if wraps {
                Affinity::Upstream
            } else {
                Affinity::Downstream
            };
            Some((end, affinity))
        }

        /// Moves to the adjacent line at the sticky x, clamping to the document start
        /// or end on the first or last line.
        fn vertical_move(
            &mut self,
            from: Location,
            affinity: Affinity,
            direction: Direction,
            sticky_x: Option<f64>,
        ) -> Option<(Location, Affinity, Option<f64>)> {
            let up = direction == Direction::Up;
            let caret = self.resolver.caret_line(from, affinity)?;
            let x = sticky_x.unwrap_or_else(|| caret.caret_x());

            match self.adjacent_line_rect(&caret, up) {
                Some(line_rect) => {
                    let point = Point::new(x, line_rect.mid_y());
                    let (location, affinity) =
                        self.resolver.caret_location_with_affinity(point, None)?;
                    Some((location, affinity, Some(x)))
                }
                None => {
                    let range = self.resolver.doc().document_range();
                    let location = if up {
                        range.location()
                    } else {
                        range.end_location()
                    };
                    Some((location, Affinity::Downstream, Some(x)))
                }
            }
        }

        fn adjacent_line_rect(&mut self, caret: &CaretLine, up: bool) -> Option<Rect> {
            let doc = self.resolver.doc();
            let fragment = &caret.fragment;
            let range = fragment.range_in_element();

            if up {
                if caret.line_index > 0 {
                    return fragment.line_rect(caret.line_index - 1);
                }
                let previous = doc.location(range.location(), -1)?;
                let above = self.resolver.store().fragment_for(doc, previous)?;
                above.line_rect(above.line_fragments().len().checked_sub(1)?)
            } else {
                if caret.line_index + 1 < fragment.line_fragments().len() {
                    return fragment.line_rect(caret.line_index + 1);
                }
                if range.end_location() >= doc.document_range().end_location() {
                    return None;
                }
                let below = self.resolver.store().fragment_for(doc, range.end_location())?;
                below.line_rect(0)
            }
        }
    }
}

fn anchor_and_head(selection: &TextSelection, direction: Direction) -> (Location, Location) {
    let range = selection.range();
    match selection.anchor() {
        Some(anchor) if anchor == range.location() => (anchor, range.end_location()),
        Some(anchor) if anchor == range.end_location() => (anchor, range.location()),
        _ if direction.is_backward() => (range.end_location(), range.location()),
        _ => (range.location(), range.end_location()),
    }
}

fn is_word(segment: &str) -> bool { segment.chars().any(char::is_alphanumeric) }

/// Paragraph containing `location`. [`None`] for the empty paragraph after a trailing
/// line break.
fn element_at<D: DocumentModel + ?Sized>(doc: &D, location: Location) -> Option<TextElement> {
    let mut found = None;
    doc.enumerate_elements(Some(location), EnumerationOptions::FORWARD, &mut |element| {
        found = Some(element.clone());
        false
    });
    found
}

fn paragraph_boundary<D: DocumentModel + ?Sized>(
    doc: &D,
    from: Location,
    backward: bool,
) -> Location {
    let Some(element) = element_at(doc, from) else {
        return from;
    };
    let start = element.range.location();
    if backward {
        start
    } else {
        Location::from_byte_index(start.byte_index() + element.content().len())
    }
}

/// End of the next word (forward) or start of the previous word (backward).
fn word_boundary<D: DocumentModel + ?Sized>(doc: &D, from: Location, backward: bool) -> Location {
    let range = doc.document_range();
    let from_index = from.byte_index();
    let mut result = if backward {
        range.location()
    } else {
        range.end_location()
    };

    let options = if backward {
        EnumerationOptions::REVERSE
    } else {
        EnumerationOptions::FORWARD
    };
    doc.enumerate_elements(Some(from), options, &mut |element| {
        let base = element.range.location().byte_index();
        let mut words = element
            .text
            .split_word_bound_indices()
            .filter(|(_, segment)| is_word(segment))
            .map(|(index, segment)| (base + index, base + index + segment.len()));
        let found = if backward {
            words.filter(|(start, _)| *start < from_index).last().map(|it| it.0)
        } else {
            words.find(|(_, end)| *end > from_index).map(|it| it.1)
        };
        match found {
            Some(index) => {
                result = Location::from_byte_index(index);
                false
            }
            None => true,
        }
    });
    result
}

/// Word (or run of spaces or punctuation) enclosing `location`, with the last word
/// rule for locations past the end of a line.
fn word_range<D: DocumentModel + ?Sized>(doc: &D, location: Location) -> DocRange {
    if let Some(element) = element_at(doc, location) {
        let base = element.range.location().byte_index();
        let content_end = base + element.content().len();
        if location.byte_index() < content_end {
            let segment = element.content().split_word_bound_indices().find(|(index, segment)| {
                let start = base + index;
                start <= location.byte_index() && location.byte_index() < start + segment.len()
            });
            if let Some((index, segment)) = segment {
                return DocRange::from_byte_range(base + index..base + index + segment.len());
            }
        }
    }

    let mut last_word = None;
    doc.enumerate_elements(Some(location), EnumerationOptions::REVERSE, &mut |element| {
        let base = element.range.location().byte_index();
        last_word = element
            .content()
            .split_word_bound_indices()
            .filter(|(index, segment)| is_word(segment) && base + index < location.byte_index())
            .last()
            .map(|(index, segment)| base + index..base + index + segment.len());
        last_word.is_none()
    });
    last_word.map_or(DocRange::empty_at(location), DocRange::from_byte_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LayoutConfig, MonospaceShaper, TextContentStorage};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
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

    fn caret(doc: &TextContentStorage, offset: usize) -> TextSelection {
        TextSelection::insertion_point(doc.location_from_start(offset).unwrap(), Affinity::Downstream)
    }

    /// Moves an insertion point at `from` and returns the resulting char range.
    fn moved(
        text: &str,
        from: usize,
        direction: Direction,
        granularity: Granularity,
    ) -> (usize, usize) {
        let doc = TextContentStorage::from_plain(text);
        let mut store = store_for(&doc, 500.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let selection = navigation
            .destination_selection(&caret(&doc, from), direction, granularity, false, true)
            .unwrap();
        doc.char_range(selection.range())
    }

    #[test_case(5, Direction::Left, 4 ; "left inside a line")]
    #[test_case(4, Direction::Left, 3 ; "left across a line break")]
    #[test_case(3, Direction::Right, 4 ; "right across a line break")]
    #[test_case(0, Direction::Left, 0 ; "left clamps at start")]
    #[test_case(10, Direction::Right, 10 ; "right clamps at end")]
    #[test_case(1, Direction::Down, 5 ; "down keeps the column")]
    #[test_case(9, Direction::Up, 5 ; "up keeps the column")]
    #[test_case(5, Direction::Up, 1 ; "up to the first line")]
    #[test_case(1, Direction::Up, 0 ; "up from the first line clamps")]
    #[test_case(9, Direction::Down, 10 ; "down from the last line clamps")]
    fn test_character_moves(from: usize, direction: Direction, expected: usize) {
        assert_eq!(
            moved("012\n456\n89", from, direction, Granularity::Character),
            (expected, 0)
        );
    }

    #[test_case(0, Direction::Right, 5 ; "end of first word")]
    #[test_case(5, Direction::Right, 11 ; "end of next word")]
    #[test_case(11, Direction::Right, 18 ; "across the line break")]
    #[test_case(18, Direction::Left, 12 ; "start of word")]
    #[test_case(12, Direction::Left, 6 ; "back across the line break")]
    #[test_case(8, Direction::Left, 6 ; "start of enclosing word")]
    #[test_case(23, Direction::Right, 23 ; "clamps at end")]
    fn test_word_moves(from: usize, direction: Direction, expected: usize) {
        assert_eq!(
            moved("Hello world\nSecond Line", from, direction, Granularity::Word),
            (expected, 0)
        );
    }

    #[test_case(5, Direction::Left, Granularity::Line, 4 ; "line start")]
    #[test_case(5, Direction::Right, Granularity::Line, 7 ; "line end")]
    #[test_case(5, Direction::Backward, Granularity::Paragraph, 4 ; "paragraph start")]
    #[test_case(5, Direction::Forward, Granularity::Paragraph, 7 ; "paragraph end")]
    #[test_case(5, Direction::Backward, Granularity::Document, 0 ; "document start")]
    #[test_case(5, Direction::Forward, Granularity::Document, 10 ; "document end")]
    #[test_case(10, Direction::Forward, Granularity::Document, 10 ; "document end is idempotent")]
    fn test_boundary_moves(from: usize, direction: Direction, granularity: Granularity, expected: usize) {
        assert_eq!(moved("012\n456\n89", from, direction, granularity), (expected, 0));
    }

    #[test]
    fn test_move_left_three_times() {
        let doc = TextContentStorage::from_plain("012\n456\n89");
        let mut store = store_for(&doc, 500.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let mut selection = caret(&doc, 5);
        let mut visited = vec![];
        for _ in 0..3 {
            selection = navigation
                .destination_selection(&selection, Direction::Left, Granularity::Character, false, false)
                .unwrap();
            visited.push(doc.char_range(selection.range()).0);
        }
        assert_eq!(visited, vec![4, 3, 2]);
    }

    #[test]
    fn test_line_end_at_soft_wrap_is_upstream() {
        let doc = TextContentStorage::from_plain("Hello world");
        let mut store = store_for(&doc, 40.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let end = navigation
            .destination_selection(&caret(&doc, 1), Direction::Right, Granularity::Line, false, true)
            .unwrap();
        assert_eq!(doc.char_range(end.range()), (6, 0));
        assert_eq!(end.affinity, Affinity::Upstream);

        // Unconfined, the next move continues to the end of the next line.
        let next = navigation
            .destination_selection(&end, Direction::Right, Granularity::Line, false, false)
            .unwrap();
        assert_eq!(doc.char_range(next.range()), (11, 0));
    }

    #[test]
    fn test_extending_keeps_the_anchor() {
        let doc = TextContentStorage::from_plain("0123456789");
        let mut store = store_for(&doc, 500.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let mut selection = caret(&doc, 5);
        for _ in 0..2 {
            selection = navigation
                .destination_selection(&selection, Direction::Right, Granularity::Character, true, false)
                .unwrap();
        }
        assert_eq!(doc.char_range(selection.range()), (5, 2));
        for _ in 0..3 {
            selection = navigation
                .destination_selection(&selection, Direction::Left, Granularity::Character, true, false)
                .unwrap();
        }
        assert_eq!(doc.char_range(selection.range()), (4, 1));
        assert_eq!(selection.anchor(), doc.location_from_start(5));
    }

    #[test]
    fn test_character_move_collapses_selection() {
        let doc = TextContentStorage::from_plain("0123456789");
        let mut store = store_for(&doc, 500.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let selected = TextSelection::new(doc.range_from_chars(2, 4), Affinity::Downstream, Granularity::Character);
        let left = navigation
            .destination_selection(&selected, Direction::Left, Granularity::Character, false, false)
            .unwrap();
        let right = navigation
            .destination_selection(&selected, Direction::Right, Granularity::Character, false, false)
            .unwrap();
        assert_eq!(doc.char_range(left.range()), (2, 0));
        assert_eq!(doc.char_range(right.range()), (6, 0));
    }

    #[test]
    fn test_vertical_moves_keep_sticky_x() {
        let doc = TextContentStorage::from_plain("0123456\n01\n0123456");
        let mut store = store_for(&doc, 500.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let down = navigation
            .destination_selection(&caret(&doc, 5), Direction::Down, Granularity::Character, false, false)
            .unwrap();
        assert_eq!(doc.char_range(down.range()), (10, 0));
        assert_eq!(down.anchor_position_offset, Some(25.0));
        let down_again = navigation
            .destination_selection(&down, Direction::Down, Granularity::Character, false, false)
            .unwrap();
        assert_eq!(doc.char_range(down_again.range()), (16, 0));
    }

    #[test_case("Hello world", 1, (0, 5) ; "word under the location")]
    #[test_case("Hello world", 5, (5, 1) ; "space between words")]
    #[test_case("Hello world", 11, (6, 5) ; "last word at document end")]
    #[test_case("ab\n\n", 3, (0, 2) ; "last word before empty lines")]
    #[test_case("ab\n\n", 4, (0, 2) ; "last word from the trailing empty line")]
    #[test_case("ab cd\nx", 5, (3, 2) ; "past the last word of a line")]
    fn test_select_word(text: &str, at: usize, expected: (usize, usize)) {
        let doc = TextContentStorage::from_plain(text);
        let mut store = store_for(&doc, 500.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let word = navigation
            .text_selection_for(Granularity::Word, doc.location_from_start(at).unwrap())
            .unwrap();
        assert_eq!(doc.char_range(word.range()), expected);
    }

    #[test]
    fn test_select_paragraph_and_line() {
        let doc = TextContentStorage::from_plain("Hello world\nab");
        let mut store = store_for(&doc, 40.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let at = doc.location_from_start(7).unwrap();
        let paragraph = navigation.text_selection_for(Granularity::Paragraph, at).unwrap();
        assert_eq!(doc.char_range(paragraph.range()), (0, 12));
        let line = navigation.text_selection_for(Granularity::Line, at).unwrap();
        assert_eq!(doc.char_range(line.range()), (6, 6));
    }

    #[test]
    fn test_interacting_at_extends_from_anchor() {
        let doc = TextContentStorage::from_plain("0123456789");
        let mut store = store_for(&doc, 500.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let anchors = vec![caret(&doc, 2)];

        let click = navigation.text_selections_interacting_at(
            Point::new(36.0, 5.0),
            None,
            &anchors,
            SelectionModifiers::default(),
            false,
            Granularity::Character,
        );
        assert_eq!(click.len(), 1);
        assert_eq!(doc.char_range(click[0].range()), (7, 0));

        let shift_click = navigation.text_selections_interacting_at(
            Point::new(36.0, 5.0),
            None,
            &anchors,
            SelectionModifiers {
                extend: true,
                ..Default::default()
            },
            false,
            Granularity::Character,
        );
        assert_eq!(doc.char_range(shift_click[0].range()), (2, 5));

        let command_click = navigation.text_selections_interacting_at(
            Point::new(36.0, 5.0),
            None,
            &anchors,
            SelectionModifiers {
                multiple: true,
                ..Default::default()
            },
            false,
            Granularity::Character,
        );
        assert_eq!(command_click.len(), 2);
    }

    #[test]
    fn test_append_insertion_point() {
        let doc = TextContentStorage::from_plain("012\n456");
        let mut store = store_for(&doc, 500.0);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let set = SelectionSet::single(caret(&doc, 1));
        let appended = navigation
            .append_insertion_point_at(Point::new(5.0, 15.0), &set)
            .unwrap();
        let offsets: Vec<(usize, usize)> =
            appended.ranges().into_iter().map(|it| doc.char_range(it)).collect();
        assert_eq!(offsets, vec![(1, 0), (5, 0)]);
    }

    proptest! {
        #[test]
        fn prop_move_right_is_monotonic(
            text in "[a-c \n\t]{0,12}(e\u{301}|漢|é)?[a-c \n]{0,12}"
        ) {
            let doc = TextContentStorage::from_plain(&text);
            let mut store = store_for(&doc, 30.0);
            let mut navigation =
                SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
            let end = doc.document_range().end_location();
            let mut selection = caret(&doc, 0);
            let mut steps = 0;
            while selection.range().location() < end {
                let next = navigation
                    .destination_selection(&selection, Direction::Right, Granularity::Character, false, false)
                    .unwrap();
                prop_assert!(next.range().location() > selection.range().location());
                selection = next;
                steps += 1;
                prop_assert!(steps <= text.len());
            }
            let stable = navigation
                .destination_selection(&selection, Direction::Right, Granularity::Character, false, false)
                .unwrap();
            prop_assert_eq!(stable.range().location(), end);
        }
    }
}
