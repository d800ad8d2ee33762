// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Cancellable completion fetches.
//!
//! The view thread starts a request with [`CompletionSession::begin`], a tokio task runs
//! the provider ([`spawn_completion_fetch`]) and sends the items back over a channel.
//! Before anything is shown, [`CompletionSession::accept`] checks that the result is
//! still relevant:
//!
//! - its generation is the newest one (not superseded),
//! - the request was not dismissed,
//! - the insertion point has not moved since the request started.
//!
//! Anything else is dropped quietly.

use std::sync::Arc;

use tokio::{runtime::Handle,
            sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError,
                         unbounded_channel},
            task::JoinHandle};

use crate::{CompletionItem, CompletionProvider, CompletionRequest, Location, TextViewError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub generation: u64,
    pub items: Vec<CompletionItem>,
}

pub type CompletionSender = UnboundedSender<CompletionResult>;
pub type CompletionReceiver = UnboundedReceiver<CompletionResult>;

#[derive(Debug)]
pub struct CompletionSession {
    generation: u64,
    active: Option<CompletionRequest>,
    sender: CompletionSender,
    receiver: CompletionReceiver,
}

impl Default for CompletionSession {
    fn default() -> Self { Self::new() }
}

impl CompletionSession {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            generation: 0,
            active: None,
            sender,
            receiver,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 { self.generation }

    #[must_use]
    pub fn active_request(&self) -> Option<&CompletionRequest> { self.active.as_ref() }

    /// Sender for fetch tasks to deliver on.
    #[must_use]
    pub fn sender(&self) -> CompletionSender { self.sender.clone() }

    /// Starts a new request, superseding (and cancelling) the active one.
    pub fn begin(&mut self, insertion_point: Location, prefix: impl Into<String>) -> CompletionRequest {
        self.cancel();
        self.generation += 1;
        let request = CompletionRequest::new(self.generation, insertion_point, prefix);
        tracing::debug!(
            message = "💬 completion request",
            generation = self.generation,
            insertion_point = %insertion_point
        );
        self.active = Some(request.clone());
        request
    }

    /// Dismisses the active request.
    pub fn cancel(&mut self) {
        if let Some(request) = self.active.take() {
            request.cancel();
        }
    }

    /// Items of `result` if they are still relevant at `current_insertion_point`.
    /// Accepting ends the active request.
    pub fn accept(
        &mut self,
        result: CompletionResult,
        current_insertion_point: Location,
    ) -> Result<Vec<CompletionItem>, TextViewError> {
        let cancelled = TextViewError::Cancelled {
            generation: result.generation,
        };
        let Some(request) = self.active.as_ref() else {
            return Err(cancelled);
        };
        if request.generation != result.generation || request.is_cancelled() {
            return Err(cancelled);
        }
        if request.insertion_point != current_insertion_point {
            self.cancel();
            return Err(cancelled);
        }
        self.active = None;
        Ok(result.items)
    }

    /// Drains delivered results without blocking and returns the items of the newest
    /// relevant one.
    pub fn poll_results(&mut self, current_insertion_point: Location) -> Option<Vec<CompletionItem>> {
        let mut return_it = None;
        loop {
            match self.receiver.try_recv() {
                Ok(result) => match self.accept(result, current_insertion_point) {
                    Ok(items) => return_it = Some(items),
                    Err(error) => {
                        tracing::trace!(message = "💬 dropping completion result", error = %error);
                    }
                },
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        return_it
    }

    /// Waits for the next delivered result, relevant or not.
    pub async fn next_result(&mut self) -> Option<CompletionResult> { self.receiver.recv().await }
}

/// Runs `provider` for `request` on `handle` and sends the items to `sender`, unless
/// the request is cancelled before or while the provider runs.
pub fn spawn_completion_fetch(
    handle: &Handle,
    provider: Arc<dyn CompletionProvider>,
    request: CompletionRequest,
    sender: CompletionSender,
) -> JoinHandle<()> {
    handle.spawn(async move {
        if request.is_cancelled() {
            return;
        }
        let items = provider.completion_items(request.clone()).await;
        if request.is_cancelled() {
            tracing::trace!(
                message = "💬 completion fetch cancelled",
                generation = request.generation
            );
            return;
        }
        let result = CompletionResult {
            generation: request.generation,
            items,
        };
        if sender.send(result).is_err() {
            tracing::trace!(
                message = "💬 completion session is gone",
                generation = request.generation
            );
        }
    })
}
