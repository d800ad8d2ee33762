// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use unicode_segmentation::UnicodeSegmentation;

use crate::{AttributeRun, AttributedString, DocRange, DocumentModel, EnumerationOptions,
            Location, TextAttributes, TextEdit, TextElement,
            attributes::{slice_runs, splice_runs}};

/// [`DocumentModel`] backed by a [`String`] and a list of attribute runs.
#[derive(Debug, Clone, Default)]
pub struct TextContentStorage {
    text: String,
    runs: Vec<AttributeRun>,
    transaction_depth: usize,
    pending_edits: Vec<TextEdit>,
    published_edits: Vec<TextEdit>,
    generation: u64,
}

impl TextContentStorage {
    #[must_use]
    pub fn new(content: AttributedString) -> Self {
        Self {
            text: content.text().to_string(),
            runs: content.runs().to_vec(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn from_plain(text: &str) -> Self { Self::new(AttributedString::plain(text)) }

    #[must_use]
    pub fn as_str(&self) -> &str { &self.text }

    #[must_use]
    pub fn runs(&self) -> &[AttributeRun] { &self.runs }

    #[must_use]
    pub fn is_in_transaction(&self) -> bool { self.transaction_depth > 0 }
}

mod impl_helpers {
    use super::*;

    impl TextContentStorage {
        /// Snaps a possibly stale location back onto a char boundary inside the text.
        pub(crate) fn snap(&self, location: Location) -> usize {
            let mut byte_index = location.byte_index().min(self.text.len());
            while !self.text.is_char_boundary(byte_index) {
                byte_index -= 1;
            }
            byte_index
        }

        pub(crate) fn paragraph_start(&self, byte_index: usize) -> usize {
            self.text[..byte_index].rfind('\n').map_or(0, |it| it + 1)
        }

        pub(crate) fn paragraph_end(&self, start: usize) -> usize {
            self.text[start..]
                .find('\n')
                .map_or(self.text.len(), |it| start + it + 1)
        }

        pub(crate) fn element_at(&self, start: usize) -> TextElement {
            let end = self.paragraph_end(start);
            TextElement {
                range: DocRange::from_byte_range(start..end),
                text: self.text[start..end].to_string(),
                runs: slice_runs(&self.runs, start..end),
            }
        }
    }
}

impl DocumentModel for TextContentStorage {
    fn document_range(&self) -> DocRange { DocRange::from_byte_range(0..self.text.len()) }

    fn location(&self, base: Location, offset_by: isize) -> Option<Location> {
        let base = self.snap(base);
        let steps = offset_by.unsigned_abs();
        if offset_by >= 0 {
            let mut chars = self.text[base..].char_indices().map(|(it, _)| base + it);
            match chars.nth(steps) {
                Some(it) => Some(Location::from_byte_index(it)),
                // Exactly at the end of the text.
                None => (self.text[base..].chars().count() == steps)
                    .then_some(Location::from_byte_index(self.text.len())),
            }
        } else {
            self.text[..base]
                .char_indices()
                .rev()
                .nth(steps - 1)
                .map(|(it, _)| Location::from_byte_index(it))
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn offset(&self, from: Location, to: Location) -> isize {
        let from = self.snap(from);
        let to = self.snap(to);
        if from <= to {
            self.text[from..to].chars().count() as isize
        } else {
            -(self.text[to..from].chars().count() as isize)
        }
    }

    fn enumerate_elements(
        &self,
        from: Option<Location>,
        options: EnumerationOptions,
        f: &mut dyn FnMut(&TextElement) -> bool,
    ) -> Option<Location> {
        if self.text.is_empty() {
            return None;
        }

        if options.reverse {
            let from = from.map_or(self.text.len(), |it| self.snap(it));
            // A location at the very end belongs to the last paragraph.
            let inside = if from == self.text.len() { from.saturating_sub(1) } else { from };
            let mut start = self.paragraph_start(inside);
            loop {
                let element = self.element_at(start);
                if !f(&element) {
                    return Some(element.range.location());
                }
                if start == 0 {
                    return None;
                }
                start = self.paragraph_start(start - 1);
            }
        } else {
            let from = from.map_or(0, |it| self.snap(it));
            let mut start = self.paragraph_start(from);
            if from == self.text.len() && self.text.ends_with('\n') {
                return None;
            }
            while start < self.text.len() {
                let element = self.element_at(start);
                if !f(&element) {
                    return Some(element.range.location());
                }
                start = element.range.end_location().byte_index();
            }
            None
        }
    }

    fn begin_editing(&mut self) { self.transaction_depth += 1; }

    fn end_editing(&mut self) {
        if self.transaction_depth == 0 {
            tracing::warn!(message = "📝 end_editing called without begin_editing");
            return;
        }
        self.transaction_depth -= 1;
        if self.transaction_depth == 0 && !self.pending_edits.is_empty() {
            self.generation += 1;
            self.published_edits.append(&mut self.pending_edits);
        }
    }

    fn replace_contents(&mut self, range: DocRange, with: &AttributedString) {
        let outer = self.transaction_depth == 0;
        if outer {
            self.begin_editing();
        }

        let start = self.snap(range.location());
        let end = self.snap(range.end_location()).max(start);
        self.text.replace_range(start..end, with.text());
        self.runs = splice_runs(&self.runs, start..end, with.runs());
        self.pending_edits.push(TextEdit {
            replaced_range: DocRange::from_byte_range(start..end),
            new_len: with.len(),
        });

        tracing::trace!(
            message = "📝 replace_contents",
            replaced = ?(start..end),
            inserted_len = with.len()
        );

        if outer {
            self.end_editing();
        }
    }

    fn text_in(&self, range: DocRange) -> String {
        let start = self.snap(range.location());
        let end = self.snap(range.end_location()).max(start);
        self.text[start..end].to_string()
    }

    fn attributed_substring(&self, range: DocRange) -> AttributedString {
        let start = self.snap(range.location());
        let end = self.snap(range.end_location()).max(start);
        AttributedString::from_runs(&self.text[start..end], slice_runs(&self.runs, start..end))
    }

    fn attributes_at(&self, location: Location) -> Option<TextAttributes> {
        let byte_index = self.snap(location);
        let mut start = 0;
        for run in &self.runs {
            if byte_index < start + run.len {
                return Some(run.attributes.clone());
            }
            start += run.len;
        }
        None
    }

    fn next_grapheme_location(&self, location: Location) -> Option<Location> {
        let byte_index = self.snap(location);
        let next = self.text[byte_index..].graphemes(true).next()?;
        Some(Location::from_byte_index(byte_index + next.len()))
    }

    fn prev_grapheme_location(&self, location: Location) -> Option<Location> {
        let byte_index = self.snap(location);
        let prev = self.text[..byte_index].graphemes(true).next_back()?;
        Some(Location::from_byte_index(byte_index - prev.len()))
    }

    fn edit_generation(&self) -> u64 { self.generation }

    fn take_edits(&mut self) -> Vec<TextEdit> { std::mem::take(&mut self.published_edits) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraphs(doc: &TextContentStorage, from: Option<usize>, reverse: bool) -> Vec<String> {
        let mut acc = vec![];
        let from = from.and_then(|it| doc.location_from_start(it));
        doc.enumerate_elements(
            from,
            EnumerationOptions {
                reverse,
                ensures_layout: false,
            },
            &mut |element| {
                acc.push(element.text.clone());
                true
            },
        );
        acc
    }

    #[test]
    fn test_location_and_offset_count_chars() {
        let doc = TextContentStorage::from_plain("aé😀b");
        let start = doc.document_range().location();
        let third = doc.location(start, 3).unwrap();
        assert_eq!(doc.offset(start, third), 3);
        assert_eq!(doc.text_in(DocRange::from_unordered(start, third)), "aé😀");
        assert_eq!(doc.location(third, -2), doc.location(start, 1));
        assert_eq!(doc.location(start, 4), Some(doc.document_range().end_location()));
        assert_eq!(doc.location(start, 5), None);
        assert_eq!(doc.location(start, -1), None);
    }

    #[test]
    fn test_enumerate_elements_forward_and_reverse() {
        let doc = TextContentStorage::from_plain("012\n456\n89");
        assert_eq!(paragraphs(&doc, None, false), vec!["012\n", "456\n", "89"]);
        assert_eq!(paragraphs(&doc, Some(5), false), vec!["456\n", "89"]);
        assert_eq!(paragraphs(&doc, Some(5), true), vec!["456\n", "012\n"]);
        assert_eq!(paragraphs(&doc, Some(10), true), vec!["89", "456\n", "012\n"]);
    }

    #[test]
    fn test_enumerate_stops_and_reports_location() {
        let doc = TextContentStorage::from_plain("a\nb\nc");
        let stopped = doc.enumerate_elements(None, EnumerationOptions::FORWARD, &mut |it| {
            it.text != "b\n"
        });
        assert_eq!(stopped, doc.location_from_start(2));
    }

    #[test]
    fn test_trailing_line_break_has_no_element() {
        let doc = TextContentStorage::from_plain("ab\n");
        assert_eq!(paragraphs(&doc, Some(3), false), Vec::<String>::new());
        assert_eq!(paragraphs(&doc, Some(3), true), vec!["ab\n"]);
        assert!(paragraphs(&TextContentStorage::default(), None, false).is_empty());
    }

    #[test]
    fn test_transaction_publishes_once() {
        let mut doc = TextContentStorage::from_plain("hello");
        let generation = doc.edit_generation();
        doc.perform_editing_transaction(|doc| {
            let end = doc.document_range().end_location();
            doc.replace_contents(DocRange::empty_at(end), &AttributedString::plain("!"));
            assert!(doc.take_edits().is_empty());
            let start = doc.document_range().location();
            doc.replace_contents(DocRange::empty_at(start), &AttributedString::plain(">"));
        });
        assert_eq!(doc.string(), ">hello!");
        assert_eq!(doc.edit_generation(), generation + 1);
        assert_eq!(doc.take_edits().len(), 2);
    }

    #[test]
    fn test_graphemes() {
        let doc = TextContentStorage::from_plain("e\u{301}x");
        let start = doc.document_range().location();
        let next = doc.next_grapheme_location(start).unwrap();
        assert_eq!(doc.offset(start, next), 2);
        assert_eq!(doc.prev_grapheme_location(next), Some(start));
        assert_eq!(doc.prev_grapheme_location(start), None);
    }

    #[test]
    fn test_attributes_follow_edits() {
        let big = TextAttributes::default().with_font_size(20.0);
        let mut doc = TextContentStorage::from_plain("abc");
        let at_one = doc.range_from_chars(1, 0);
        doc.replace_contents(at_one, &AttributedString::new("X", big.clone()));
        assert_eq!(doc.string(), "aXbc");
        assert_eq!(doc.attributes_at(doc.location_from_start(1).unwrap()), Some(big));
        assert_eq!(
            doc.attributes_at(doc.location_from_start(2).unwrap()),
            Some(TextAttributes::default())
        );
        assert_eq!(doc.char_range(doc.range_from_chars(1, 2)), (1, 2));
    }
}
