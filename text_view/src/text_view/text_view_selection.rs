// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{Affinity, Direction, DocRange, DocumentModel, DragSelection, Granularity,
            Point, ScrollHost, SelectionModifiers, SelectionSet, TextSelection, TextView,
            text_view::text_view_struct::selection_head};

/// Generates a move command and its `_and_modify_selection` twin for each entry.
macro_rules! navigation_commands {
    (
        $(
            $(#[$meta:meta])*
            $name:ident, $extending_name:ident => ($direction:ident, $granularity:ident, $confined:expr);
        )*
    ) => {
        impl<D: DocumentModel + 'static, H: ScrollHost> TextView<D, H> {
            $(
                $(#[$meta])*
                pub fn $name(&mut self) {
                    self.move_selection(Direction::$direction, Granularity::$granularity, false, $confined);
                }

                $(#[$meta])*
                pub fn $extending_name(&mut self) {
                    self.move_selection(Direction::$direction, Granularity::$granularity, true, $confined);
                }
            )*
        }
    };
}

navigation_commands! {
    move_left, move_left_and_modify_selection => (Left, Character, false);
    move_right, move_right_and_modify_selection => (Right, Character, false);
    move_up, move_up_and_modify_selection => (Up, Character, false);
    move_down, move_down_and_modify_selection => (Down, Character, false);
    move_forward, move_forward_and_modify_selection => (Forward, Character, false);
    move_backward, move_backward_and_modify_selection => (Backward, Character, false);
    move_word_left, move_word_left_and_modify_selection => (Left, Word, false);
    move_word_right, move_word_right_and_modify_selection => (Right, Word, false);
    move_word_forward, move_word_forward_and_modify_selection => (Forward, Word, false);
    move_word_backward, move_word_backward_and_modify_selection => (Backward, Word, false);
    /// Start of the visual line. Repeating it stays put.
    move_to_beginning_of_line, move_to_beginning_of_line_and_modify_selection => (Backward, Line, true);
    /// End of the visual line. Repeating it stays put.
    move_to_end_of_line, move_to_end_of_line_and_modify_selection => (Forward, Line, true);
    move_to_left_end_of_line, move_to_left_end_of_line_and_modify_selection => (Left, Line, true);
    move_to_right_end_of_line, move_to_right_end_of_line_and_modify_selection => (Right, Line, true);
    move_to_beginning_of_paragraph, move_to_beginning_of_paragraph_and_modify_selection => (Backward, Paragraph, true);
    move_to_end_of_paragraph, move_to_end_of_paragraph_and_modify_selection => (Forward, Paragraph, true);
    /// Start of the paragraph, or of the previous one when already there.
    move_paragraph_backward, move_paragraph_backward_and_modify_selection => (Backward, Paragraph, false);
    /// End of the paragraph, or of the next one when already there.
    move_paragraph_forward, move_paragraph_forward_and_modify_selection => (Forward, Paragraph, false);
    move_to_beginning_of_document, move_to_beginning_of_document_and_modify_selection => (Backward, Document, false);
    move_to_end_of_document, move_to_end_of_document_and_modify_selection => (Forward, Document, false);
}

impl<D: DocumentModel + 'static, H: ScrollHost> TextView<D, H> {
    /// Moves every selection. Selections without geometry stay where they are.
    pub fn move_selection(
        &mut self,
        direction: Direction,
        granularity: Granularity,
        extending: bool,
        confined: bool,
    ) {
        let selections = self.core.selections().clone();
        let moved: Vec<TextSelection> = self.with_navigation(|navigation| {
            selections
                .iter()
                .map(|selection| {
                    navigation
                        .destination_selection(selection, direction, granularity, extending, confined)
                        .unwrap_or_else(|| selection.clone())
                })
                .collect()
        });
        self.set_text_selections(SelectionSet::new(moved));
        self.scroll_to_selection();
    }

    pub fn select_all(&mut self) {
        let range = self.core.doc.document_range();
        self.set_text_selections(SelectionSet::single(TextSelection::new(
            range,
            Affinity::Downstream,
            Granularity::Document,
        )));
    }

    pub fn select_word(&mut self) { self.select_enclosing(Granularity::Word); }

    pub fn select_line(&mut self) { self.select_enclosing(Granularity::Line); }

    pub fn select_paragraph(&mut self) { self.select_enclosing(Granularity::Paragraph); }

    pub fn page_up(&mut self) { self.page(Direction::Up, false); }

    pub fn page_down(&mut self) { self.page(Direction::Down, false); }

    pub fn page_up_and_modify_selection(&mut self) { self.page(Direction::Up, true); }

    pub fn page_down_and_modify_selection(&mut self) { self.page(Direction::Down, true); }

    /// Adds an insertion point at `point` to the current selections.
    pub fn add_insertion_point_at(&mut self, point: Point) {
        let selections = self.core.selections().clone();
        if let Some(it) =
            self.with_navigation(|navigation| navigation.append_insertion_point_at(point, &selections))
        {
            self.set_text_selections(it);
        }
    }

    /// Handles a click. One click places the caret, two select a word, three or more
    /// select a paragraph. A single click on a link goes to the delegate first.
    pub fn mouse_down(&mut self, point: Point, click_count: usize, modifiers: SelectionModifiers) {
        if !self.config.is_selectable {
            return;
        }
        let granularity = match click_count {
            0 | 1 => Granularity::Character,
            2 => Granularity::Word,
            _ => Granularity::Paragraph,
        };
        if granularity == Granularity::Character && !modifiers.extend && self.click_on_link(point) {
            return;
        }

        let anchors = self.core.selections().selections().to_vec();
        let selections = self.with_navigation(|navigation| {
            navigation.text_selections_interacting_at(point, None, &anchors, modifiers, false, granularity)
        });
        if selections.is_empty() {
            return;
        }
        tracing::trace!(message = "🖱️ mouse down", click_count, granularity = %granularity);
        self.drag = Some(DragSelection::begin(selections.clone(), granularity, modifiers));
        self.set_text_selections(SelectionSet::new(selections));
    }

    /// Extends the drag that started at the last mouse down.
    pub fn mouse_dragged(&mut self, point: Point) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let selections = self.with_navigation(|navigation| drag.selections_at(navigation, point));
        self.drag = Some(drag);
        if selections.is_empty() {
            return;
        }
        self.set_text_selections(SelectionSet::new(selections));
        self.scroll_to_selection();
    }

    pub fn mouse_up(&mut self) { self.drag = None; }
}

mod impl_helpers {
    use super::*;

    impl<D: DocumentModel + 'static, H: ScrollHost> TextView<D, H> {
        pub(super) fn select_enclosing(&mut self, granularity: Granularity) {
            let selections = self.core.selections().clone();
            let enclosing: Vec<TextSelection> = self.with_navigation(|navigation| {
                selections
                    .iter()
                    .filter_map(|it| navigation.text_selection_for(granularity, it.range().location()))
                    .collect()
            });
            if !enclosing.is_empty() {
                self.set_text_selections(SelectionSet::new(enclosing));
            }
        }

        /// Moves the primary selection by the height of the visible rect, keeping its
        /// x. Other selections are dropped.
        pub(crate) fn page(&mut self, direction: Direction, extending: bool) {
            let Some(primary) = self.core.selections().primary().cloned() else {
                return;
            };
            let height = self.host.visible_rect().height();
            let head = selection_head(&primary);
            let target = self.with_navigation(|navigation| {
                let rect = navigation.resolver().caret_rect(head, primary.affinity)?;
                let x = primary.anchor_position_offset.unwrap_or(rect.min_x());
                let y = if direction.is_backward() {
                    rect.mid_y() - height
                } else {
                    rect.mid_y() + height
                };
                navigation
                    .resolver()
                    .caret_location_with_affinity(Point::new(x, y), None)
                    .map(|(location, affinity)| (location, affinity, x))
            });
            let Some((location, affinity, x)) = target else {
                return;
            };

            let selection = if extending {
                let range = primary.range();
                let anchor = primary.anchor().unwrap_or(if direction.is_backward() {
                    range.end_location()
                } else {
                    range.location()
                });
                TextSelection::new(DocRange::from_unordered(anchor, location), affinity, Granularity::Character)
                    .with_anchor(Some(anchor))
            } else {
                TextSelection::insertion_point(location, affinity)
            };
            self.set_text_selections(SelectionSet::single(selection.with_anchor_position_offset(Some(x))));
            self.scroll_to_selection();
        }

        /// Offers the link under `point` to the delegate. Returns `true` if it handled
        /// the click.
        pub(super) fn click_on_link(&mut self, point: Point) -> bool {
            let Some(location) =
                self.with_navigation(|navigation| navigation.resolver().location_interacting_at(point))
            else {
                return false;
            };
            let doc = &self.core.doc;
            let link = [Some(location), doc.location(location, -1)]
                .into_iter()
                .flatten()
                .find_map(|it| doc.attributes_at(it).and_then(|attributes| attributes.link));
            match link {
                Some(link) => self.delegate.clicked_on_link(&link, location),
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributedString, ClipView, Size, TextAttributes, TextContentStorage,
                TextViewConfig, TextViewDelegate};
    use pretty_assertions::assert_eq;
    use std::{cell::RefCell, rc::Rc};

    fn view(text: &str) -> TextView {
        TextView::from_plain(text, ClipView::new(Size::new(500.0, 30.0)), TextViewConfig::default())
    }

    fn selected(view: &TextView) -> (usize, usize) { view.doc().char_range(view.selected_range()) }

    fn caret_at(view: &mut TextView, offset: usize) {
        let range = view.doc().range_from_chars(offset, 0);
        view.set_selected_range(range);
    }

    #[test]
    fn test_move_commands() {
        let mut view = view("012\n456\n89");
        caret_at(&mut view, 5);
        view.move_right();
        assert_eq!(selected(&view), (6, 0));
        view.move_down();
        assert_eq!(selected(&view), (10, 0));
        view.move_to_beginning_of_line();
        assert_eq!(selected(&view), (8, 0));
        view.move_to_beginning_of_line();
        assert_eq!(selected(&view), (8, 0));
        view.move_to_beginning_of_document();
        assert_eq!(selected(&view), (0, 0));
        view.move_to_end_of_document_and_modify_selection();
        assert_eq!(selected(&view), (0, 10));
    }

    #[test]
    fn test_word_moves_extend_from_anchor() {
        let mut view = view("Hello world");
        caret_at(&mut view, 11);
        view.move_word_left_and_modify_selection();
        assert_eq!(selected(&view), (6, 5));
        view.move_word_left_and_modify_selection();
        assert_eq!(selected(&view), (0, 11));
        view.move_right();
        assert_eq!(selected(&view), (11, 0));
    }

    #[test]
    fn test_select_commands() {
        let mut view = view("one two\nthree");
        caret_at(&mut view, 5);
        view.select_word();
        assert_eq!(selected(&view), (4, 3));
        view.select_paragraph();
        assert_eq!(selected(&view), (0, 8));
        view.select_all();
        assert_eq!(selected(&view), (0, 13));
        assert_eq!(view.text_selections_string(), "one two\nthree");
    }

    #[test]
    fn test_page_down_moves_by_visible_height() {
        let text = (0..10).map(|it| it.to_string()).collect::<Vec<_>>().join("\n");
        let mut view = view(&text);
        view.page_down();
        assert_eq!(selected(&view), (6, 0));
        view.page_up();
        assert_eq!(selected(&view), (0, 0));
    }

    #[test]
    fn test_mouse_click_and_drag() {
        let mut view = view("Hello world again");
        view.mouse_down(Point::new(21.0, 5.0), 1, SelectionModifiers::default());
        assert_eq!(selected(&view), (4, 0));
        view.mouse_dragged(Point::new(51.0, 5.0));
        assert_eq!(selected(&view), (4, 6));
        view.mouse_dragged(Point::new(11.0, 5.0));
        assert_eq!(selected(&view), (2, 2));
        view.mouse_up();
        view.mouse_dragged(Point::new(51.0, 5.0));
        assert_eq!(selected(&view), (2, 2));
    }

    #[test]
    fn test_double_click_selects_word() {
        let mut view = view("Hello world again");
        view.mouse_down(Point::new(36.0, 5.0), 2, SelectionModifiers::default());
        assert_eq!(selected(&view), (6, 5));
        view.mouse_dragged(Point::new(2.0, 5.0));
        assert_eq!(selected(&view), (0, 11));
    }

    #[test]
    fn test_shift_click_extends() {
        let mut view = view("Hello world");
        caret_at(&mut view, 2);
        view.mouse_down(
            Point::new(26.0, 5.0),
            1,
            SelectionModifiers {
                extend: true,
                ..Default::default()
            },
        );
        assert_eq!(selected(&view), (2, 3));
    }

    #[test]
    fn test_add_insertion_point() {
        let mut view = view("Hello world");
        caret_at(&mut view, 0);
        view.add_insertion_point_at(Point::new(31.0, 5.0));
        let ranges: Vec<(usize, usize)> = view
            .text_selections()
            .ranges()
            .into_iter()
            .map(|it| view.doc().char_range(it))
            .collect();
        assert_eq!(ranges, vec![(0, 0), (6, 0)]);
    }

    #[derive(Debug, Default)]
    struct LinkDelegate {
        clicked: Rc<RefCell<Vec<String>>>,
    }

    impl TextViewDelegate for LinkDelegate {
        fn clicked_on_link(&mut self, link: &str, _location: crate::Location) -> bool {
            self.clicked.borrow_mut().push(link.to_string());
            true
        }
    }

    #[test]
    fn test_click_on_link_goes_to_delegate() {
        let clicked = Rc::new(RefCell::new(vec![]));
        let linked = TextAttributes::default().with_link("https://r3bl.com");
        let doc = TextContentStorage::new(AttributedString::new("link", linked));
        let mut view = TextView::new(doc, ClipView::new(Size::new(500.0, 30.0)), TextViewConfig::default())
            .with_delegate(Box::new(LinkDelegate {
                clicked: clicked.clone(),
            }));
        caret_at(&mut view, 0);
        view.mouse_down(Point::new(6.0, 5.0), 1, SelectionModifiers::default());
        assert_eq!(clicked.borrow().as_slice(), &["https://r3bl.com".to_string()]);
        assert_eq!(selected(&view), (0, 0));
    }
}
