// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{Affinity, AttributedString, DocRange, DocumentModel, LayoutConfig,
            LayoutFragmentStore, Location, SelectionSet, TextAttributes, TextSelection,
            TextShaper, UndoAction, UndoManager};

/// State that undo actions operate on: the document, its layout and the selections.
/// The undo manager lives outside of it so actions can borrow both.
#[derive(Debug)]
pub struct EditorCore<D> {
    pub(crate) doc: D,
    pub(crate) store: LayoutFragmentStore,
    selections: SelectionSet,
    typing_attributes: TextAttributes,
    default_attributes: TextAttributes,
    text_changed: bool,
    selection_changed: bool,
}

/// Result of one replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct TextReplacement {
    /// Where the new text ended up.
    pub inserted_range: DocRange,
    /// What was there before.
    pub original: AttributedString,
}

/// Pending value of a typing run that is being coalesced.
#[derive(Debug, Clone, PartialEq)]
pub struct CoalescedTyping {
    /// Everything typed so far.
    pub range: DocRange,
    /// Text the first keystroke replaced.
    pub original: AttributedString,
    pub selections_before: SelectionSet,
}

impl<D: DocumentModel> EditorCore<D> {
    pub fn new(
        doc: D,
        shaper: Box<dyn TextShaper>,
        layout_config: LayoutConfig,
        default_attributes: TextAttributes,
    ) -> Self {
        let mut store = LayoutFragmentStore::new(shaper, layout_config);
        store.set_extra_line_attributes(default_attributes.clone());
        store.rebuild(&doc);
        let start = doc.document_range().location();
        let mut it = Self {
            doc,
            store,
            selections: SelectionSet::single(TextSelection::insertion_point(
                start,
                Affinity::Downstream,
            )),
            typing_attributes: default_attributes.clone(),
            default_attributes,
            text_changed: false,
            selection_changed: false,
        };
        it.update_typing_attributes();
        it
    }

    #[must_use]
    pub fn doc(&self) -> &D { &self.doc }

    #[must_use]
    pub fn store(&self) -> &LayoutFragmentStore { &self.store }

    #[must_use]
    pub fn selections(&self) -> &SelectionSet { &self.selections }

    #[must_use]
    pub fn typing_attributes(&self) -> &TextAttributes { &self.typing_attributes }

    #[must_use]
    pub fn default_attributes(&self) -> &TextAttributes { &self.default_attributes }

    pub fn set_default_attributes(&mut self, attributes: TextAttributes) {
        self.store.set_extra_line_attributes(attributes.clone());
        self.default_attributes = attributes;
        self.update_typing_attributes();
    }

    /// Replaces the whole selection set. Ranges are clamped to the document.
    pub fn set_selections(&mut self, selections: SelectionSet) {
        let bounds = self.doc.document_range();
        let clamped: Vec<TextSelection> = selections
            .iter()
            .map(|selection| {
                let ranges: Vec<DocRange> =
                    selection.ranges().iter().map(|it| it.clamped(&bounds)).collect();
                let anchor = selection.anchor().map(|it| it.clamp(bounds.location(), bounds.end_location()));
                let mut it = TextSelection::from_ranges(ranges, bounds.location())
                    .with_anchor(anchor)
                    .with_anchor_position_offset(selection.anchor_position_offset)
                    .with_transient(selection.is_transient);
                it.granularity = selection.granularity;
                it.affinity = selection.affinity;
                it.is_logical = selection.is_logical;
                it
            })
            .collect();
        let selections = SelectionSet::new(clamped);
        if selections != self.selections {
            self.selections = selections;
            self.selection_changed = true;
        }
        self.update_typing_attributes();
    }

    /// Typing attributes follow the character before the insertion point, or the
    /// first selected character. An empty document uses the defaults.
    pub fn update_typing_attributes(&mut self) {
        let Some(primary) = self.selections.primary() else {
            return;
        };
        let range = primary.range();
        let location = if range.is_empty() {
            self.doc
                .location(range.location(), -1)
                .unwrap_or(range.location())
        } else {
            range.location()
        };
        self.typing_attributes = self
            .doc
            .attributes_at(location)
            .unwrap_or_else(|| self.default_attributes.clone());
    }

    /// Replaces `range` (clamped to the document) and keeps the layout in sync.
    pub fn replace_range(&mut self, range: DocRange, with: &AttributedString) -> TextReplacement {
        let range = range.clamped(&self.doc.document_range());
        let original = self.doc.attributed_substring(range);
        self.doc
            .perform_editing_transaction(|doc| doc.replace_contents(range, with));
        let edits = self.doc.take_edits();
        self.store.invalidate(&self.doc, &edits);
        self.text_changed = true;
        TextReplacement {
            inserted_range: DocRange::from_byte_range(
                range.location().byte_index()..range.location().byte_index() + with.len(),
            ),
            original,
        }
    }

    /// Drains the change flags as `(text_changed, selection_changed)`.
    pub(crate) fn take_changes(&mut self) -> (bool, bool) {
        let it = (self.text_changed, self.selection_changed);
        self.text_changed = false;
        self.selection_changed = false;
        it
    }
}

/// Undo action that puts `original` back in place of `inserted_range` and restores
/// `selections_before`. It registers its own inverse, so the same function serves for
/// redo.
pub fn replacement_undo_action<D: DocumentModel + 'static>(
    inserted_range: DocRange,
    original: AttributedString,
    selections_before: SelectionSet,
) -> UndoAction<EditorCore<D>> {
    Box::new(
        move |core: &mut EditorCore<D>, manager: &mut UndoManager<EditorCore<D>>| {
            let selections_now = core.selections().clone();
            let replacement = core.replace_range(inserted_range, &original);
            manager.register_undo(replacement_undo_action(
                replacement.inserted_range,
                replacement.original,
                selections_now,
            ));
            core.set_selections(selections_before);
        },
    )
}

/// Moves `location` by `delta` bytes, the shift an earlier replacement causes.
pub(crate) fn shifted_location(location: Location, delta: isize) -> Location {
    Location::from_byte_index(location.byte_index().saturating_add_signed(delta))
}
