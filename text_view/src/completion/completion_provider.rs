// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::Debug,
          sync::{Arc,
                 atomic::{AtomicBool, Ordering}}};

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::Location;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    pub insert_text: String,
    pub detail: Option<String>,
}

impl CompletionItem {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            label,
            detail: None,
        }
    }
}

/// One fetch of completion items. Cloning shares the cancellation flag.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub generation: u64,
    pub insertion_point: Location,
    /// Text of the word being completed, up to the insertion point.
    pub prefix: String,
    cancelled: Arc<AtomicBool>,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(generation: u64, insertion_point: Location, prefix: impl Into<String>) -> Self {
        Self {
            generation,
            insertion_point,
            prefix: prefix.into(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Providers check this at their suspension points and stop early when set.
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::Acquire) }

    pub fn cancel(&self) { self.cancelled.store(true, Ordering::Release); }
}

/// Source of completion items. Runs off the view thread, so it never sees the
/// document or the layout, only the request.
pub trait CompletionProvider: Debug + Send + Sync {
    fn completion_items(&self, request: CompletionRequest) -> BoxFuture<'static, Vec<CompletionItem>>;
}

/// Offers the words of a fixed list that start with the request prefix.
#[derive(Debug, Clone, Default)]
pub struct WordListProvider {
    pub words: Vec<String>,
}

impl WordListProvider {
    #[must_use]
    pub fn new(words: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }
}

impl CompletionProvider for WordListProvider {
    fn completion_items(&self, request: CompletionRequest) -> BoxFuture<'static, Vec<CompletionItem>> {
        let items: Vec<CompletionItem> = self
            .words
            .iter()
            .filter(|it| it.starts_with(&request.prefix) && **it != request.prefix)
            .map(CompletionItem::new)
            .collect();
        Box::pin(async move { items })
    }
}
