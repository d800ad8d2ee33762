// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Edits and undo.
//!
//! Every edit goes through [`TextView::replace_ranges`]. An edit counts as typing, and
//! may coalesce with the one before it, when:
//!
//! 1. it came from a key event whose characters equal the inserted text,
//! 2. there is exactly one range to replace,
//! 3. typing coalescing and undo are enabled.
//!
//! A typing edit extends the pending one if it inserts exactly where the pending one
//! ends. Anything else commits the pending edit first.

use crate::{Affinity, AttributedString, CoalescedTyping, Direction, DocRange,
            DocumentModel, EditorCore, Granularity, KeyEvent, ScrollHost, SelectionSet,
            TextSelection, TextView, TextViewEvent, UndoManager, call_if_true,
            replacement_undo_action, text_view::editor_core::shifted_location};

const DEBUG_EDITING: bool = false;

impl<D: DocumentModel + 'static, H: ScrollHost> TextView<D, H> {
    /// Handles a key press. Returns `false` if the key is not bound to anything.
    pub fn key_down(&mut self, event: KeyEvent) -> bool {
        let view_event = match TextViewEvent::try_from(&event) {
            Ok(it) => it,
            Err(reason) => {
                tracing::trace!(message = "⌨️ ignoring key event", reason = %reason);
                return false;
            }
        };
        self.current_key_event = Some(event);
        self.apply_event(view_event);
        self.current_key_event = None;
        true
    }

    pub fn apply_event(&mut self, event: TextViewEvent) {
        call_if_true!(DEBUG_EDITING, {
            tracing::debug!(message = "⌨️ apply event", event = %event);
        });
        match event {
            TextViewEvent::InsertText(text) => self.insert_text(&text),
            TextViewEvent::InsertNewline => self.insert_newline(),
            TextViewEvent::InsertTab => self.insert_text("\t"),
            TextViewEvent::DeleteBackward => self.delete_backward(),
            TextViewEvent::DeleteForward => self.delete_forward(),
            TextViewEvent::DeleteWordBackward => self.delete_word_backward(),
            TextViewEvent::DeleteWordForward => self.delete_word_forward(),
            TextViewEvent::Move {
                direction,
                granularity,
                extending,
            } => {
                let confined = granularity == Granularity::Line;
                self.move_selection(direction, granularity, extending, confined);
            }
            TextViewEvent::PageUp { extending } => self.page(Direction::Up, extending),
            TextViewEvent::PageDown { extending } => self.page(Direction::Down, extending),
            TextViewEvent::SelectAll => self.select_all(),
            TextViewEvent::Undo => {
                self.undo();
            }
            TextViewEvent::Redo => {
                self.redo();
            }
            TextViewEvent::Complete => {
                self.complete();
            }
            TextViewEvent::CancelOperation => self.cancel_completion(),
        }
    }

    /// Replaces every selection with `text` in the typing attributes.
    pub fn insert_text(&mut self, text: &str) {
        let content = AttributedString::new(text, self.core.typing_attributes().clone());
        let ranges = self.core.selections().ranges();
        self.replace_ranges(ranges, &content, true);
    }

    pub fn insert_newline(&mut self) { self.insert_text("\n"); }

    /// Deletes the selections, or the grapheme before each insertion point.
    pub fn delete_backward(&mut self) {
        self.delete_by(|doc, range| {
            doc.prev_grapheme_location(range.location())
                .map(|it| DocRange::from_unordered(it, range.location()))
        });
    }

    /// Deletes the selections, or the grapheme after each insertion point.
    pub fn delete_forward(&mut self) {
        self.delete_by(|doc, range| {
            doc.next_grapheme_location(range.location())
                .map(|it| DocRange::from_unordered(range.location(), it))
        });
    }

    pub fn delete_word_backward(&mut self) { self.delete_to(Direction::Backward, Granularity::Word); }

    pub fn delete_word_forward(&mut self) { self.delete_to(Direction::Forward, Granularity::Word); }

    /// Replaces `range` with `text` in the typing attributes.
    pub fn replace_characters(&mut self, range: DocRange, text: &str, allows_typing_coalescing: bool) {
        let content = AttributedString::new(text, self.core.typing_attributes().clone());
        self.replace_ranges(vec![range], &content, allows_typing_coalescing);
    }

    /// Replaces each of `ranges` with `content`, leaving an insertion point after each
    /// replacement. Returns `false` if the edit was refused.
    pub fn replace_ranges(
        &mut self,
        ranges: Vec<DocRange>,
        content: &AttributedString,
        allows_typing_coalescing: bool,
    ) -> bool {
        if !self.config.is_editable {
            return false;
        }
        let bounds = self.core.doc.document_range();
        let mut ranges: Vec<DocRange> = ranges.iter().map(|it| it.clamped(&bounds)).collect();
        ranges.sort_by_key(DocRange::location);
        ranges.dedup();
        if ranges.is_empty() {
            return false;
        }
        if !ranges
            .iter()
            .all(|it| self.delegate.should_change_text(*it, content.text()))
        {
            return false;
        }

        let is_typing = allows_typing_coalescing
            && self.config.typing_coalescing
            && self.config.allows_undo
            && ranges.len() == 1
            && !content.is_empty()
            && self
                .current_key_event
                .as_ref()
                .is_some_and(|it| it.characters == content.text());
        if !is_typing {
            self.undo_manager.break_undo_coalescing();
        }

        self.delegate.will_change_text();
        let selections_before = self.core.selections().clone();
        let registers_undo = self.config.allows_undo && !is_typing;
        if registers_undo && ranges.len() > 1 {
            self.undo_manager.manager_mut().begin_undo_grouping();
        }

        // Ascending order, each range shifted by the edits before it. Undo runs the
        // actions in reverse, so every action sees the coordinates it was recorded in.
        let mut delta: isize = 0;
        let mut carets = Vec::with_capacity(ranges.len());
        for range in ranges {
            let shifted = DocRange::from_unordered(
                shifted_location(range.location(), delta),
                shifted_location(range.end_location(), delta),
            );
            let replacement = self.core.replace_range(shifted, content);
            delta += content.len() as isize - shifted.byte_len() as isize;
            carets.push(TextSelection::insertion_point(
                replacement.inserted_range.end_location(),
                Affinity::Downstream,
            ));

            if registers_undo {
                self.undo_manager.register_undo(replacement_undo_action(
                    replacement.inserted_range,
                    replacement.original,
                    selections_before.clone(),
                ));
            } else if is_typing {
                self.coalesce_typing(shifted, replacement.inserted_range, replacement.original, &selections_before);
            }
        }

        if registers_undo && self.undo_manager.manager().is_grouping() {
            self.undo_manager.manager_mut().end_undo_grouping();
        }

        self.core.set_selections(SelectionSet::new(carets));
        self.notify_changes();
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool { self.config.allows_undo && self.undo_manager.can_undo() }

    #[must_use]
    pub fn can_redo(&self) -> bool { self.config.allows_undo && self.undo_manager.can_redo() }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.delegate.will_change_text();
        let did_undo = self.undo_manager.undo(&mut self.core);
        self.notify_changes();
        did_undo
    }

    /// Replays the undo stack only. A typing run undone before it was committed can't
    /// be redone.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.delegate.will_change_text();
        let did_redo = self.undo_manager.redo(&mut self.core);
        self.notify_changes();
        did_redo
    }

    pub fn break_undo_coalescing(&mut self) { self.undo_manager.break_undo_coalescing(); }

    #[must_use]
    pub fn undo_menu_title(&self) -> String { self.undo_manager.undo_menu_title() }

    #[must_use]
    pub fn redo_menu_title(&self) -> String { self.undo_manager.redo_menu_title() }
}

mod impl_helpers {
    use super::*;

    impl<D: DocumentModel + 'static, H: ScrollHost> TextView<D, H> {
        /// Deletes every non empty selection as is, and the range `extend` returns for
        /// each insertion point.
        pub(super) fn delete_by(&mut self, extend: impl Fn(&D, DocRange) -> Option<DocRange>) {
            let ranges: Vec<DocRange> = self
                .core
                .selections()
                .ranges()
                .into_iter()
                .filter_map(|it| {
                    if it.is_empty() {
                        extend(&self.core.doc, it)
                    } else {
                        Some(it)
                    }
                })
                .collect();
            if ranges.is_empty() {
                return;
            }
            self.replace_ranges(ranges, &AttributedString::default(), true);
        }

        pub(super) fn delete_to(&mut self, direction: Direction, granularity: Granularity) {
            let selections = self.core.selections().clone();
            let ranges: Vec<DocRange> = self.with_navigation(|navigation| {
                selections
                    .iter()
                    .filter_map(|selection| {
                        if !selection.range().is_empty() {
                            return Some(selection.range());
                        }
                        navigation
                            .destination_selection(selection, direction, granularity, true, false)
                            .map(|it| it.range())
                    })
                    .filter(|it| !it.is_empty())
                    .collect()
            });
            if ranges.is_empty() {
                return;
            }
            self.replace_ranges(ranges, &AttributedString::default(), true);
        }

        pub(super) fn coalesce_typing(
            &mut self,
            replaced: DocRange,
            inserted: DocRange,
            original: AttributedString,
            selections_before: &SelectionSet,
        ) {
            let extends_pending = replaced.is_empty()
                && self
                    .undo_manager
                    .pending_value()
                    .is_some_and(|it| it.range.end_location() == replaced.location());

            if extends_pending && let Some(pending) = self.undo_manager.pending_value() {
                let mut value = pending.clone();
                value.range = value.range.union(&inserted);
                self.undo_manager.coalesce(value);
                return;
            }

            self.undo_manager.register_coalescing_undo(
                CoalescedTyping {
                    range: inserted,
                    original,
                    selections_before: selections_before.clone(),
                },
                Box::new(
                    |core: &mut EditorCore<D>,
                     manager: &mut UndoManager<EditorCore<D>>,
                     value: CoalescedTyping| {
                        replacement_undo_action(value.range, value.original, value.selections_before)(
                            core, manager,
                        );
                    },
                ),
            );
        }
    }
}
