// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{Affinity, AttributedString, CaretResolver, ClipView, CoalescedTyping,
            CoalescingUndoManager, CompletionProvider, CompletionSession, DocRange,
            DocumentModel, DragSelection, DrawOp, EditorCore, KeyEvent, LayoutFragmentStore,
            MonospaceShaper, NoopDelegate, Rect, ScrollHost, SelectionNavigation,
            SelectionSet, TextAttributes, TextContentStorage, TextSelection, TextShaper,
            TextViewConfig, TextViewDelegate, ViewportLayoutController, ViewportLayoutReport};

/// The undo manager of a [`TextView`] over documents of type `D`.
pub type TextViewUndoManager<D> = CoalescingUndoManager<EditorCore<D>, CoalescedTyping>;

/// A rich text view: owns the document, its layout, the viewport, the selections and
/// the undo history, and turns input into edits and selection changes.
///
/// ```text
///            key / mouse input
///                   │
///                   ▼
///  ┌──────────────────────────────────┐     ┌──────────────────┐
///  │ TextView                         │────▶│ TextViewDelegate │
///  │  ├─ EditorCore (doc, layout,     │     └──────────────────┘
///  │  │   selections)                 │
///  │  ├─ undo manager                 │     ┌──────────────────┐
///  │  ├─ viewport controller ─────────│────▶│ ScrollHost       │
///  │  └─ completion session           │     └──────────────────┘
///  └──────────────────────────────────┘
/// ```
///
/// Everything runs on the thread that owns the view. Only completion fetches run
/// elsewhere, see [`crate::spawn_completion_fetch`].
#[derive(Debug)]
pub struct TextView<D: DocumentModel + 'static = TextContentStorage, H: ScrollHost = ClipView> {
    pub(crate) core: EditorCore<D>,
    pub(crate) undo_manager: TextViewUndoManager<D>,
    pub(crate) controller: ViewportLayoutController,
    pub(crate) host: H,
    pub(crate) delegate: Box<dyn TextViewDelegate>,
    pub(crate) config: TextViewConfig,
    pub(crate) drag: Option<DragSelection>,
    pub(crate) completion: CompletionSession,
    pub(crate) completion_provider: Option<(Handle, Arc<dyn CompletionProvider>)>,
    /// The key event being handled, if any. Edits only coalesce as typing while this
    /// is set.
    pub(crate) current_key_event: Option<KeyEvent>,
}

impl<H: ScrollHost> TextView<TextContentStorage, H> {
    pub fn from_plain(text: &str, host: H, config: TextViewConfig) -> Self {
        let doc = TextContentStorage::new(AttributedString::new(text, config.default_attributes()));
        Self::new(doc, host, config)
    }
}

impl<D: DocumentModel + 'static, H: ScrollHost> TextView<D, H> {
    pub fn new(doc: D, host: H, config: TextViewConfig) -> Self {
        Self::with_shaper(doc, host, config, Box::new(MonospaceShaper))
    }

    pub fn with_shaper(doc: D, host: H, config: TextViewConfig, shaper: Box<dyn TextShaper>) -> Self {
        let core = EditorCore::new(doc, shaper, config.layout_config(), config.default_attributes());
        Self {
            core,
            undo_manager: CoalescingUndoManager::new(config.levels_of_undo),
            controller: ViewportLayoutController::new(config.viewport_config()),
            host,
            delegate: Box::new(NoopDelegate),
            config,
            drag: None,
            completion: CompletionSession::new(),
            completion_provider: None,
            current_key_event: None,
        }
    }

    #[must_use]
    pub fn with_delegate(mut self, delegate: Box<dyn TextViewDelegate>) -> Self {
        self.delegate = delegate;
        self
    }

    #[must_use]
    pub fn doc(&self) -> &D { self.core.doc() }

    #[must_use]
    pub fn config(&self) -> &TextViewConfig { &self.config }

    #[must_use]
    pub fn store(&self) -> &LayoutFragmentStore { self.core.store() }

    #[must_use]
    pub fn controller(&self) -> &ViewportLayoutController { &self.controller }

    #[must_use]
    pub fn host(&self) -> &H { &self.host }

    /// For moving the scroll position the way a user would. Drift corrections go
    /// through [`Self::layout_viewport`].
    pub fn host_mut(&mut self) -> &mut H { &mut self.host }

    #[must_use]
    pub fn undo_manager(&self) -> &TextViewUndoManager<D> { &self.undo_manager }

    pub fn set_config(&mut self, config: TextViewConfig) {
        self.core.store.set_config(&self.core.doc, config.layout_config());
        self.core.set_default_attributes(config.default_attributes());
        self.controller.set_config(config.viewport_config());
        self.undo_manager
            .manager_mut()
            .set_levels_of_undo(config.levels_of_undo);
        if !config.allows_undo {
            self.undo_manager.remove_all_actions();
        }
        self.config = config;
    }

    pub fn set_container_width(&mut self, width: f64) {
        let config = TextViewConfig {
            container_width: width,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    #[must_use]
    pub fn string(&self) -> String { self.core.doc.string() }

    #[must_use]
    pub fn attributed_string(&self) -> AttributedString {
        self.core
            .doc
            .attributed_substring(self.core.doc.document_range())
    }

    /// Replaces the whole content with plain text in the default attributes. Clears
    /// the undo history and puts the caret at the start.
    pub fn set_string(&mut self, text: &str) {
        let content = AttributedString::new(text, self.config.default_attributes());
        self.set_attributed_string(&content);
    }

    pub fn set_attributed_string(&mut self, content: &AttributedString) {
        self.delegate.will_change_text();
        let all = self.core.doc.document_range();
        self.core.replace_range(all, content);
        self.undo_manager.remove_all_actions();
        let start = self.core.doc.document_range().location();
        self.core.set_selections(SelectionSet::single(TextSelection::insertion_point(
            start,
            Affinity::Downstream,
        )));
        self.notify_changes();
    }

    #[must_use]
    pub fn typing_attributes(&self) -> &TextAttributes { self.core.typing_attributes() }

    #[must_use]
    pub fn text_selections(&self) -> &SelectionSet { self.core.selections() }

    /// The single setter for the selections. Breaks typing coalescing and notifies the
    /// delegate if anything changed.
    pub fn set_text_selections(&mut self, selections: SelectionSet) {
        if !self.config.is_selectable {
            return;
        }
        self.undo_manager.break_undo_coalescing();
        self.core.set_selections(selections);
        self.notify_changes();
    }

    /// Range of the primary selection.
    #[must_use]
    pub fn selected_range(&self) -> DocRange {
        self.core
            .selections()
            .primary()
            .map_or(DocRange::empty_at(self.core.doc.document_range().location()), |it| {
                it.range()
            })
    }

    pub fn set_selected_range(&mut self, range: DocRange) {
        self.set_text_selections(SelectionSet::single(TextSelection::new(
            range,
            Affinity::Downstream,
            crate::Granularity::Character,
        )));
    }

    /// Selected text of every selection, joined by line breaks.
    #[must_use]
    pub fn text_selections_string(&self) -> String {
        self.core
            .selections()
            .ranges()
            .into_iter()
            .filter(|it| !it.is_empty())
            .map(|it| self.core.doc.text_in(it))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lays out the visible part of the document and mounts its surfaces.
    pub fn layout_viewport(&mut self) -> ViewportLayoutReport {
        let report =
            self.controller
                .layout_viewport(&mut self.core.store, &self.core.doc, &mut self.host);
        self.delegate.did_layout_viewport(&report);
        report
    }

    /// Draw operations of the surfaces that need display, with their frames.
    pub fn display(&mut self) -> Vec<(Rect, Vec<DrawOp>)> { self.controller.display() }

    /// Scrolls so the head of the primary selection is visible.
    pub fn scroll_to_selection(&mut self) -> bool {
        let Some(primary) = self.core.selections().primary().cloned() else {
            return false;
        };
        let head = selection_head(&primary);
        let options = self.config.resolver_options();
        let EditorCore { doc, store, .. } = &mut self.core;
        let rect = CaretResolver::new(store, doc, options).caret_rect(head, primary.affinity);
        rect.is_some_and(|it| self.host.scroll_to_visible(it))
    }

    /// Highlight rects of every non empty selection.
    pub fn selection_highlight_rects(&mut self) -> Vec<Rect> {
        let ranges = self.core.selections().ranges();
        let options = self.config.resolver_options();
        let EditorCore { doc, store, .. } = &mut self.core;
        let mut resolver = CaretResolver::new(store, doc, options);
        ranges
            .into_iter()
            .filter(|it| !it.is_empty())
            .flat_map(|it| resolver.segment_frames(it))
            .collect()
    }

    pub fn insertion_point_rects(&mut self) -> Vec<Rect> {
        let selections = self.core.selections().clone();
        let options = self.config.resolver_options();
        let EditorCore { doc, store, .. } = &mut self.core;
        CaretResolver::new(store, doc, options).insertion_point_rects(&selections)
    }

    /// Line highlight for the primary selection, only when it is an insertion point.
    pub fn selected_line_highlight_rect(&mut self) -> Option<Rect> {
        let primary = self.core.selections().primary().cloned()?;
        if !primary.is_insertion_point() {
            return None;
        }
        let options = self.config.resolver_options();
        let EditorCore { doc, store, .. } = &mut self.core;
        CaretResolver::new(store, doc, options)
            .line_highlight_rect(primary.range().location(), primary.affinity)
    }

    /// Runs `f` with a navigation engine over the current layout.
    pub(crate) fn with_navigation<R>(
        &mut self,
        f: impl FnOnce(&mut SelectionNavigation<'_, D>) -> R,
    ) -> R {
        let options = self.config.resolver_options();
        let EditorCore { doc, store, .. } = &mut self.core;
        let mut navigation = SelectionNavigation::new(store, doc, options);
        f(&mut navigation)
    }

    /// Fans out the changes recorded since the last call to the delegate.
    pub(crate) fn notify_changes(&mut self) {
        let (text_changed, selection_changed) = self.core.take_changes();
        if text_changed {
            self.delegate.did_change_text();
            self.controller.set_needs_display();
        }
        if selection_changed {
            self.delegate.did_change_selection(self.core.selections());
        }
    }
}

/// The end of `selection` that moves when it is extended.
pub(crate) fn selection_head(selection: &TextSelection) -> crate::Location {
    let range = selection.range();
    match selection.anchor() {
        Some(anchor) if anchor == range.end_location() => range.location(),
        _ => range.end_location(),
    }
}
