// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tokio::{runtime::Handle, task::JoinHandle};

use crate::{CompletionItem, CompletionProvider, CompletionRequest, CompletionSession,
            DocRange, DocumentModel, Location, ScrollHost, TextView, spawn_completion_fetch};

fn is_completion_char(ch: char) -> bool { ch.is_alphanumeric() || ch == '_' }

impl<D: DocumentModel + 'static, H: ScrollHost> TextView<D, H> {
    /// Fetches run on `handle`. Results come back through [`Self::poll_completions`].
    pub fn set_completion_provider(&mut self, handle: Handle, provider: Arc<dyn CompletionProvider>) {
        self.completion.cancel();
        self.completion_provider = Some((handle, provider));
    }

    #[must_use]
    pub fn completion_session(&self) -> &CompletionSession { &self.completion }

    /// Starts a request for the word ending at the insertion point, superseding any
    /// earlier one. [`None`] unless the selection is a single insertion point.
    pub fn request_completion(&mut self) -> Option<CompletionRequest> {
        let insertion_point = self.completion_insertion_point()?;
        let prefix_range = self.completion_prefix_range(insertion_point);
        let prefix = self.core.doc.text_in(prefix_range);
        Some(self.completion.begin(insertion_point, prefix))
    }

    /// Requests completions and spawns the fetch on the provider's runtime.
    pub fn complete(&mut self) -> Option<JoinHandle<()>> {
        let (handle, provider) = self.completion_provider.clone()?;
        let request = self.request_completion()?;
        Some(spawn_completion_fetch(&handle, provider, request, self.completion.sender()))
    }

    /// Items of the newest delivered result that is still relevant. Results for an
    /// insertion point that has moved are dropped.
    pub fn poll_completions(&mut self) -> Option<Vec<CompletionItem>> {
        let insertion_point = self.completion_insertion_point()?;
        self.completion.poll_results(insertion_point)
    }

    /// Waits for the next delivered result and returns its items if still relevant.
    pub async fn next_completions(&mut self) -> Option<Vec<CompletionItem>> {
        let result = self.completion.next_result().await?;
        let insertion_point = self.completion_insertion_point()?;
        self.completion.accept(result, insertion_point).ok()
    }

    /// Replaces the word before the insertion point with the item's text.
    pub fn insert_completion(&mut self, item: &CompletionItem) -> bool {
        let Some(insertion_point) = self.completion_insertion_point() else {
            return false;
        };
        self.completion.cancel();
        let range = self.completion_prefix_range(insertion_point);
        let content = crate::AttributedString::new(
            item.insert_text.as_str(),
            self.core.typing_attributes().clone(),
        );
        self.replace_ranges(vec![range], &content, false)
    }

    pub fn cancel_completion(&mut self) { self.completion.cancel(); }
}

mod impl_helpers {
    use super::*;

    impl<D: DocumentModel + 'static, H: ScrollHost> TextView<D, H> {
        pub(super) fn completion_insertion_point(&self) -> Option<Location> {
            let selections = self.core.selections();
            if selections.len() != 1 {
                return None;
            }
            let primary = selections.primary()?;
            primary
                .is_insertion_point()
                .then(|| primary.range().location())
        }

        /// Run of word characters that ends at `insertion_point`.
        pub(super) fn completion_prefix_range(&self, insertion_point: Location) -> DocRange {
            let doc = &self.core.doc;
            let mut start = insertion_point;
            while let Some(previous) = doc.prev_grapheme_location(start) {
                let grapheme = doc.text_in(DocRange::from_unordered(previous, start));
                if !grapheme.chars().all(is_completion_char) {
                    break;
                }
                start = previous;
            }
            DocRange::from_unordered(start, insertion_point)
        }
    }
}
