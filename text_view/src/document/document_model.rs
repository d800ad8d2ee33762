// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{AttributeRun, AttributedString, DocRange, Location, TextAttributes};

/// One paragraph of the document. Its range includes the trailing line break, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub range: DocRange,
    pub text: String,
    pub runs: Vec<AttributeRun>,
}

impl TextElement {
    /// Paragraph text without its trailing line break.
    #[must_use]
    pub fn content(&self) -> &str { strip_line_break(&self.text) }

    #[must_use]
    pub fn ends_with_line_break(&self) -> bool { self.text.ends_with('\n') }
}

#[must_use]
pub fn strip_line_break(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerationOptions {
    pub reverse: bool,
    pub ensures_layout: bool,
}

impl EnumerationOptions {
    pub const FORWARD: Self = Self {
        reverse: false,
        ensures_layout: false,
    };
    pub const REVERSE: Self = Self {
        reverse: true,
        ensures_layout: false,
    };
}

/// One replacement, recorded in the coordinates of the document before it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub replaced_range: DocRange,
    pub new_len: usize,
}

impl TextEdit {
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn delta(&self) -> isize { self.new_len as isize - self.replaced_range.byte_len() as isize }
}

/// The attributed document as seen by the view core.
///
/// Implementations are not internally synchronized. Every call happens on the thread
/// that owns the view.
pub trait DocumentModel {
    fn document_range(&self) -> DocRange;

    /// Moves `base` by `offset_by` characters. Returns [`None`] if the result would fall
    /// outside of [`Self::document_range`].
    fn location(&self, base: Location, offset_by: isize) -> Option<Location>;

    /// Signed number of characters from `from` to `to`.
    fn offset(&self, from: Location, to: Location) -> isize;

    /// Calls `f` for each paragraph, starting with the one that contains `from` (or the
    /// first or last paragraph when `from` is [`None`]). Returns the start of the
    /// paragraph where `f` returned `false`.
    fn enumerate_elements(
        &self,
        from: Option<Location>,
        options: EnumerationOptions,
        f: &mut dyn FnMut(&TextElement) -> bool,
    ) -> Option<Location>;

    /// Transactions nest. Edits are published once the outermost one ends.
    fn begin_editing(&mut self);

    fn end_editing(&mut self);

    fn replace_contents(&mut self, range: DocRange, with: &AttributedString);

    fn text_in(&self, range: DocRange) -> String;

    fn attributed_substring(&self, range: DocRange) -> AttributedString;

    /// Attributes of the character at `location`.
    fn attributes_at(&self, location: Location) -> Option<TextAttributes>;

    /// Next grapheme cluster boundary after `location`.
    fn next_grapheme_location(&self, location: Location) -> Option<Location>;

    /// Previous grapheme cluster boundary before `location`.
    fn prev_grapheme_location(&self, location: Location) -> Option<Location>;

    /// Bumped after every published transaction.
    fn edit_generation(&self) -> u64;

    /// Drains the edits published since the last call.
    fn take_edits(&mut self) -> Vec<TextEdit>;

    fn perform_editing_transaction<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R
    where
        Self: Sized,
    {
        self.begin_editing();
        let return_it = f(self);
        self.end_editing();
        return_it
    }

    #[allow(clippy::cast_possible_wrap)]
    fn location_from_start(&self, offset: usize) -> Option<Location> {
        self.location(self.document_range().location(), offset as isize)
    }

    #[allow(clippy::cast_sign_loss)]
    fn offset_from_start(&self, location: Location) -> usize {
        self.offset(self.document_range().location(), location).max(0) as usize
    }

    fn is_empty(&self) -> bool { self.document_range().is_empty() }

    fn string(&self) -> String { self.text_in(self.document_range()) }

    /// Character range, used by tests and diagnostics.
    fn char_range(&self, range: DocRange) -> (usize, usize) {
        let start = self.offset_from_start(range.location());
        let len = self.offset_from_start(range.end_location()) - start;
        (start, len)
    }

    /// Builds a range from character offsets, clamped to the document.
    fn range_from_chars(&self, start: usize, len: usize) -> DocRange {
        let end_of_document = self.document_range().end_location();
        let start = self.location_from_start(start).unwrap_or(end_of_document);
        #[allow(clippy::cast_possible_wrap)]
        let end = self.location(start, len as isize).unwrap_or(end_of_document);
        DocRange::from_unordered(start, end)
    }
}
