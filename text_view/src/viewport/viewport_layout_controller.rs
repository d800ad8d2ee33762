// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Keeps layout and [`RenderingSurface`]s materialized for the viewport only.
//!
//! One [`ViewportLayoutController::layout_viewport`] pass:
//!
//! 1. Will layout: remember whether the view is scrolled to the end, then compute the
//!    viewport bounds from the visible and overdraw rects.
//! 2. Settle the layout anchor inside the viewport and lay out the slots around it.
//!    Repeat with fresh viewport bounds while laying out grows the document.
//! 3. Mount a surface for every fragment in the viewport, reusing cached surfaces by
//!    fragment identity and releasing the rest.
//! 4. Did layout: update the document height, keep the last line flush with the
//!    bottom when scrolled to the end, and correct anchor drift near the top.
//!
//! Corrections scroll the host, so steps 1 to 3 run again after any of them, and
//! again if the viewport bounds no longer match the document height. A pass
//! with nothing to correct changes nothing, which makes the whole call idempotent.

use std::{cell::RefCell, rc::Rc};

use crate::{DocRange, DocumentModel, DrawOp, EnumerationOptions, FragmentId,
            LayoutFragment, LayoutFragmentStore, Rect, RenderingSurface, ScrollHost,
            SurfaceCache, call_if_true, is_almost_zero, is_scrolled_to_end, overdraw_rect,
            viewport_bounds};

const DEBUG_VIEWPORT: bool = false;

/// Passes of corrections before giving up on reaching a fixed point.
const MAX_CORRECTION_PASSES: usize = 4;

pub const DEFAULT_OVERDRAW_MULTIPLIER: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    /// Height of the overdraw margin above and below the visible rect, as a multiple
    /// of the visible height.
    pub overdraw_multiplier: f64,
    /// Backing scale used to pixel align surface frames.
    pub scale_factor: f64,
    pub shows_invisible_characters: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            overdraw_multiplier: DEFAULT_OVERDRAW_MULTIPLIER,
            scale_factor: 1.0,
            shows_invisible_characters: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportLayoutReport {
    pub viewport_bounds: Rect,
    pub viewport_range: Option<DocRange>,
    /// Fragments with a mounted surface, top to bottom.
    pub mounted: Vec<FragmentId>,
    pub created: Vec<FragmentId>,
    pub released: Vec<FragmentId>,
    /// Total drift correction applied to the scroll position.
    pub scroll_adjustment: f64,
    pub relocated_to_end: bool,
}

#[derive(Debug, Default)]
pub struct ViewportLayoutController {
    config: ViewportConfig,
    cache: SurfaceCache,
    mounted: Vec<Rc<RefCell<RenderingSurface>>>,
    viewport_bounds: Rect,
    viewport_range: Option<DocRange>,
}

impl ViewportLayoutController {
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> ViewportConfig { self.config }

    /// Takes effect on the next pass. Changing the invisible characters setting
    /// redraws every mounted surface.
    pub fn set_config(&mut self, config: ViewportConfig) {
        self.config = config;
        for surface in &self.mounted {
            surface
                .borrow_mut()
                .set_shows_invisible_characters(config.shows_invisible_characters);
        }
    }

    /// Range of the fragments mounted by the last pass.
    #[must_use]
    pub fn viewport_range(&self) -> Option<DocRange> { self.viewport_range }

    #[must_use]
    pub fn viewport_bounds(&self) -> Rect { self.viewport_bounds }

    #[must_use]
    pub fn mounted_surfaces(&self) -> &[Rc<RefCell<RenderingSurface>>] { &self.mounted }

    #[must_use]
    pub fn surface_for(&self, id: FragmentId) -> Option<Rc<RefCell<RenderingSurface>>> {
        self.cache.get(id)
    }

    /// Marks every mounted surface as needing display.
    pub fn set_needs_display(&mut self) {
        for surface in &self.mounted {
            surface.borrow_mut().set_needs_display();
        }
    }

    /// Draws the mounted surfaces that need it. Each entry is the surface frame and
    /// its ops.
    pub fn display(&mut self) -> Vec<(Rect, Vec<DrawOp>)> {
        self.mounted
            .iter()
            .filter(|it| it.borrow().needs_display())
            .map(|it| {
                let mut surface = it.borrow_mut();
                surface.layout_if_needed();
                (surface.frame(), surface.draw())
            })
            .collect()
    }

    pub fn layout_viewport<D: DocumentModel + ?Sized>(
        &mut self,
        store: &mut LayoutFragmentStore,
        doc: &D,
        host: &mut dyn ScrollHost,
    ) -> ViewportLayoutReport {
        store.ensure_synced(doc);
        let was_scrolled_to_end = is_scrolled_to_end(host.visible_rect(), host.bounds());
        let previously_mounted = self.mounted_ids();
        let mut report = ViewportLayoutReport::default();
        host.set_document_height(store.usage_bounds().max_y().max(0.0));

        self.mount_viewport(store, doc, host, &mut report);

        for _ in 0..MAX_CORRECTION_PASSES {
            let relocated =
                was_scrolled_to_end && self.relocate_viewport_to_end(store, doc, host);
            let dy = self.adjust_viewport_offset_if_needed(store, doc, host);
            let is_stale = !self.current_viewport(host).is_almost_equal(&self.viewport_bounds);
            if !relocated && is_almost_zero(dy) && !is_stale {
                break;
            }
            report.relocated_to_end |= relocated;
            report.scroll_adjustment += dy;
            self.mount_viewport(store, doc, host, &mut report);
        }

        report.mounted = self.mounted_ids();
        report.released = previously_mounted
            .into_iter()
            .filter(|it| !report.mounted.contains(it))
            .collect();
        report.viewport_bounds = self.viewport_bounds;
        report.viewport_range = self.viewport_range;

        tracing::debug!(
            message = "🪟 layout viewport",
            viewport = %report.viewport_bounds,
            mounted = report.mounted.len(),
            created = report.created.len(),
            released = report.released.len(),
            scroll_adjustment = report.scroll_adjustment,
            relocated_to_end = report.relocated_to_end
        );

        report
    }

    /// Moves the content and the scroll position by the same amount, so nothing moves
    /// on screen.
    pub fn adjust_viewport(
        &mut self,
        store: &mut LayoutFragmentStore,
        host: &mut dyn ScrollHost,
        by_vertical_offset: f64,
    ) {
        store.adjust_anchor_by(by_vertical_offset);
        host.scroll_by(by_vertical_offset);
        call_if_true!(DEBUG_VIEWPORT, {
            tracing::trace!(message = "🪟 adjust viewport", dy = by_vertical_offset);
        });
    }

    /// Scrolls so the bottom of the last fragment sits at the bottom of the visible
    /// rect. Returns `true` if the scroll position changed.
    pub fn relocate_viewport_to_end<D: DocumentModel + ?Sized>(
        &mut self,
        store: &mut LayoutFragmentStore,
        doc: &D,
        host: &mut dyn ScrollHost,
    ) -> bool {
        let end = doc.document_range().end_location();
        let Some(fragment) = store.fragment_for(doc, end) else {
            return false;
        };
        host.set_document_height(store.usage_bounds().max_y().max(0.0));

        let visible = host.visible_rect();
        let bottom = fragment.frame().max_y();
        if bottom <= visible.height() {
            return false;
        }
        let dy = bottom - visible.max_y();
        if is_almost_zero(dy) {
            return false;
        }
        host.scroll_by(dy);
        call_if_true!(DEBUG_VIEWPORT, {
            tracing::trace!(message = "🪟 relocated viewport to end", dy);
        });
        true
    }
}

mod impl_passes {
    use super::*;

    impl ViewportLayoutController {
        /// Viewport bounds for the current scroll position and document height.
        pub(super) fn current_viewport(&self, host: &dyn ScrollHost) -> Rect {
            let visible = host.visible_rect();
            let bounds = host.bounds();
            let overdraw = overdraw_rect(visible, bounds, self.config.overdraw_multiplier);
            viewport_bounds(visible, overdraw, bounds)
        }

        pub(super) fn mounted_ids(&self) -> Vec<FragmentId> {
            self.mounted.iter().map(|it| it.borrow().fragment_id()).collect()
        }

        /// Lays out the viewport and binds a surface to every fragment in it.
        pub(super) fn mount_viewport<D: DocumentModel + ?Sized>(
            &mut self,
            store: &mut LayoutFragmentStore,
            doc: &D,
            host: &mut dyn ScrollHost,
            report: &mut ViewportLayoutReport,
        ) {
            // Laying out replaces estimated heights, which can grow the bounds and with
            // them the overdraw below the visible rect.
            let mut viewport = self.current_viewport(host);
            for pass in 1..=MAX_CORRECTION_PASSES {
                store.settle_anchor_in(viewport);
                store.ensure_layout_for_rect(doc, viewport);
                host.set_document_height(store.usage_bounds().max_y().max(0.0));
                let next = self.current_viewport(host);
                if next.is_almost_equal(&viewport) || pass == MAX_CORRECTION_PASSES {
                    break;
                }
                viewport = next;
            }

            let mut fragments: Vec<Rc<LayoutFragment>> = vec![];
            let start = store.location_for_y(viewport.min_y());
            store.enumerate_fragments(
                doc,
                start,
                EnumerationOptions {
                    reverse: false,
                    ensures_layout: false,
                },
                |fragment| {
                    let frame = fragment.frame();
                    if frame.min_y() >= viewport.max_y() && !fragment.is_extra_fragment() {
                        return false;
                    }
                    if frame.max_y() > viewport.min_y() || fragment.is_extra_fragment() {
                        fragments.push(fragment.clone());
                    }
                    true
                },
            );

            let mut mounted = Vec::with_capacity(fragments.len());
            let mut viewport_range: Option<DocRange> = None;
            for fragment in &fragments {
                mounted.push(self.configure_surface(fragment, report));
                let range = fragment.range_in_element();
                viewport_range = Some(viewport_range.map_or(range, |it| it.union(&range)));
            }

            // Dropping the old list releases every surface that was not mounted again.
            self.mounted = mounted;
            let pruned = self.cache.prune();
            self.viewport_bounds = viewport;
            self.viewport_range = viewport_range;

            call_if_true!(DEBUG_VIEWPORT, {
                tracing::trace!(
                    message = "🪟 mounted viewport",
                    viewport = %viewport,
                    mounted = self.mounted.len(),
                    pruned
                );
            });
        }

        fn configure_surface(
            &mut self,
            fragment: &Rc<LayoutFragment>,
            report: &mut ViewportLayoutReport,
        ) -> Rc<RefCell<RenderingSurface>> {
            let id = fragment.id();
            let frame = fragment.frame().pixel_aligned(self.config.scale_factor);
            let shows_invisible_characters = self.config.shows_invisible_characters;

            if let Some(surface) = self.cache.get(id) {
                {
                    let mut it = surface.borrow_mut();
                    if !it.frame().is_almost_equal(&frame) {
                        it.set_frame(frame);
                    }
                    it.set_shows_invisible_characters(shows_invisible_characters);
                }
                return surface;
            }

            let mut new_surface = RenderingSurface::new(fragment, frame);
            new_surface.set_shows_invisible_characters(shows_invisible_characters);
            let surface = Rc::new(RefCell::new(new_surface));
            self.cache.insert(id, &surface);
            report.created.push(id);
            surface
        }

        /// Near the top of the document, lays out everything above the viewport and
        /// shifts content and scroll position so the first fragment starts at the top
        /// of the bounds. Returns the applied offset.
        pub(super) fn adjust_viewport_offset_if_needed<D: DocumentModel + ?Sized>(
            &mut self,
            store: &mut LayoutFragmentStore,
            doc: &D,
            host: &mut dyn ScrollHost,
        ) -> f64 {
            let Some(range) = self.viewport_range else {
                return 0.0;
            };
            let visible = host.visible_rect();
            let document_start = doc.document_range().location();
            let is_near_top =
                visible.min_y() < visible.height() && range.location() > document_start;
            if !is_near_top && range.location() != document_start {
                return 0.0;
            }

            let mut top = None;
            store.enumerate_fragments(
                doc,
                Some(range.location()),
                EnumerationOptions {
                    reverse: true,
                    ensures_layout: true,
                },
                |fragment| {
                    top = Some(fragment.frame().min_y());
                    true
                },
            );
            let Some(top) = top else {
                return 0.0;
            };

            let dy = host.bounds().min_y() - top;
            if is_almost_zero(dy) {
                return 0.0;
            }
            self.adjust_viewport(store, host, dy);
            dy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributeRun, AttributedString, ClipView, LayoutConfig, MonospaceShaper,
                Size, TextAttributes, TextContentStorage};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Paragraphs "ab\n" where "b" is twice the default font size. Estimated at 10
    /// points, laid out at 20.
    fn tall_paragraphs(count: usize) -> TextContentStorage {
        let big = TextAttributes::default().with_font_size(20.0);
        let mut text = String::new();
        let mut runs = vec![];
        for _ in 0..count {
            text.push_str("ab\n");
            runs.push(AttributeRun {
                len: 1,
                attributes: TextAttributes::default(),
            });
            runs.push(AttributeRun {
                len: 1,
                attributes: big.clone(),
            });
            runs.push(AttributeRun {
                len: 1,
                attributes: TextAttributes::default(),
            });
        }
        TextContentStorage::new(AttributedString::from_runs(text, runs))
    }

    fn setup(doc: &TextContentStorage) -> (LayoutFragmentStore, ViewportLayoutController, ClipView) {
        let mut store = LayoutFragmentStore::new(Box::new(MonospaceShaper), LayoutConfig::default());
        store.rebuild(doc);
        (
            store,
            ViewportLayoutController::new(ViewportConfig::default()),
            ClipView::new(Size::new(500.0, 50.0)),
        )
    }

    /// Every laid out fragment intersecting the viewport for the current scroll
    /// position has a surface with its frame, top to bottom.
    fn assert_viewport_covered(
        store: &mut LayoutFragmentStore,
        doc: &TextContentStorage,
        controller: &ViewportLayoutController,
        clip: &ClipView,
    ) {
        let visible = clip.visible_rect();
        let bounds = clip.bounds();
        let viewport = viewport_bounds(
            visible,
            overdraw_rect(visible, bounds, DEFAULT_OVERDRAW_MULTIPLIER),
            bounds,
        );
        let mut expected = vec![];
        store.enumerate_fragments(doc, None, EnumerationOptions::FORWARD, |fragment| {
            if fragment.frame().intersects(&viewport) {
                expected.push((fragment.id(), fragment.frame()));
            }
            true
        });
        let actual: Vec<(FragmentId, Rect)> = controller
            .mounted_surfaces()
            .iter()
            .map(|it| (it.borrow().fragment_id(), it.borrow().frame()))
            .collect();
        assert_eq!(actual, expected);
    }

    /// Paragraphs of short words that wrap more than their estimate at width 40.
    fn wrapping_paragraphs(count: usize) -> TextContentStorage {
        let words = ["a bb", "ccc dddd e", "ff ggg hhhh iiiii j", "kkkkkk l mm"];
        let text: String = (0..count)
            .map(|it| format!("{} {}\n", it, words[it % words.len()]))
            .collect();
        TextContentStorage::from_plain(&text)
    }

    fn narrow_setup(
        doc: &TextContentStorage,
    ) -> (LayoutFragmentStore, ViewportLayoutController, ClipView) {
        let mut store = LayoutFragmentStore::new(
            Box::new(MonospaceShaper),
            LayoutConfig {
                container_width: 40.0,
                ..Default::default()
            },
        );
        store.rebuild(doc);
        (
            store,
            ViewportLayoutController::new(ViewportConfig::default()),
            ClipView::new(Size::new(40.0, 50.0)),
        )
    }

    fn replace(
        doc: &mut TextContentStorage,
        store: &mut LayoutFragmentStore,
        start: usize,
        len: usize,
        text: &str,
    ) {
        let doc_len = doc.document_range().end_location().byte_index();
        let start = start.min(doc_len);
        let end = (start + len).min(doc_len);
        doc.replace_contents(DocRange::from_byte_range(start..end), &AttributedString::plain(text));
        let edits = doc.take_edits();
        store.invalidate(doc, &edits);
    }

    #[test]
    fn test_empty_document_mounts_extra_fragment() {
        let doc = TextContentStorage::default();
        let (mut store, mut controller, mut clip) = setup(&doc);
        let report = controller.layout_viewport(&mut store, &doc, &mut clip);
        assert_eq!(report.mounted.len(), 1);
        let surface = controller.mounted_surfaces()[0].borrow();
        assert!(surface.fragment().unwrap().is_extra_fragment());
        assert_eq!(surface.frame(), Rect::new(0.0, 0.0, 500.0, 10.0));
    }

    #[test]
    fn test_layout_viewport_is_idempotent() {
        let doc = tall_paragraphs(40);
        let (mut store, mut controller, mut clip) = setup(&doc);
        let first = controller.layout_viewport(&mut store, &doc, &mut clip);
        assert_eq!(first.mounted.len(), 4);
        assert_eq!(first.created.len(), 4);

        let second = controller.layout_viewport(&mut store, &doc, &mut clip);
        assert_eq!(second.mounted, first.mounted);
        assert!(second.created.is_empty());
        assert!(second.released.is_empty());
        assert_eq!(second.scroll_adjustment, 0.0);
        assert_eq!(clip.offset_y(), 0.0);
        assert_viewport_covered(&mut store, &doc, &controller, &clip);
    }

    #[test]
    fn test_small_scroll_reuses_surfaces() {
        let doc = tall_paragraphs(40);
        let (mut store, mut controller, mut clip) = setup(&doc);
        clip.set_document_height(1000.0);
        clip.scroll_to(100.0);
        controller.layout_viewport(&mut store, &doc, &mut clip);
        let before: Vec<_> = controller.mounted_surfaces().to_vec();

        clip.scroll_to(105.0);
        let report = controller.layout_viewport(&mut store, &doc, &mut clip);
        for surface in &before {
            let id = surface.borrow().fragment_id();
            if let Some(after) = controller.surface_for(id) {
                assert!(Rc::ptr_eq(surface, &after));
            }
        }
        assert!(report.mounted.len() >= before.len() - 1);
        assert_viewport_covered(&mut store, &doc, &controller, &clip);
    }

    #[test]
    fn test_surfaces_leaving_the_viewport_are_released() {
        let doc = tall_paragraphs(40);
        let (mut store, mut controller, mut clip) = setup(&doc);
        let first = controller.layout_viewport(&mut store, &doc, &mut clip);
        clip.scroll_to(300.0);
        let report = controller.layout_viewport(&mut store, &doc, &mut clip);
        assert_eq!(report.released, first.mounted);
        for id in first.mounted {
            assert!(controller.surface_for(id).is_none());
        }
    }

    #[test]
    fn test_anchor_drift_is_corrected_near_the_top() {
        let doc = tall_paragraphs(40);
        let (mut store, mut controller, mut clip) = setup(&doc);
        controller.layout_viewport(&mut store, &doc, &mut clip);

        // Jump into estimated territory, then scroll back up through it.
        clip.scroll_to(300.0);
        controller.layout_viewport(&mut store, &doc, &mut clip);
        clip.scroll_to(200.0);
        controller.layout_viewport(&mut store, &doc, &mut clip);
        assert_eq!(store.top_of_document(), -50.0);

        clip.scroll_to(40.0);
        let report = controller.layout_viewport(&mut store, &doc, &mut clip);
        assert_eq!(report.scroll_adjustment, 50.0);
        assert_eq!(store.top_of_document(), 0.0);
        assert_eq!(clip.offset_y(), 90.0);

        let again = controller.layout_viewport(&mut store, &doc, &mut clip);
        assert_eq!(again.scroll_adjustment, 0.0);
        assert_eq!(clip.offset_y(), 90.0);
        assert_viewport_covered(&mut store, &doc, &controller, &clip);
    }

    #[test]
    fn test_stays_at_end_while_typing() {
        let mut doc = TextContentStorage::from_plain(&"line\n".repeat(20));
        let (mut store, mut controller, mut clip) = setup(&doc);
        controller.layout_viewport(&mut store, &doc, &mut clip);
        clip.scroll_to(1000.0);
        controller.layout_viewport(&mut store, &doc, &mut clip);
        assert!(clip.is_scrolled_to_end());

        let end = doc.document_range().end_location();
        doc.replace_contents(DocRange::empty_at(end), &AttributedString::plain("more\n"));
        let edits = doc.take_edits();
        store.invalidate(&doc, &edits);

        let report = controller.layout_viewport(&mut store, &doc, &mut clip);
        assert!(report.relocated_to_end);
        assert!(clip.is_scrolled_to_end());
        assert_eq!(clip.visible_rect().max_y(), store.usage_bounds().max_y());
    }

    #[test]
    fn test_growth_after_edit_and_scroll_is_mounted_in_one_pass() {
        let mut doc = wrapping_paragraphs(60);
        let (mut store, mut controller, mut clip) = narrow_setup(&doc);
        controller.layout_viewport(&mut store, &doc, &mut clip);
        clip.scroll_to(630.0);
        controller.layout_viewport(&mut store, &doc, &mut clip);

        replace(&mut doc, &mut store, 345, 15, "");
        replace(&mut doc, &mut store, 263, 27, "\n");
        clip.scroll_to(935.0);
        let first = controller.layout_viewport(&mut store, &doc, &mut clip);
        assert_viewport_covered(&mut store, &doc, &controller, &clip);

        let second = controller.layout_viewport(&mut store, &doc, &mut clip);
        assert!(second.created.is_empty());
        assert_eq!(second.mounted, first.mounted);
        assert_viewport_covered(&mut store, &doc, &controller, &clip);
    }

    #[derive(Debug, Clone)]
    enum ViewportStep {
        ScrollTo(f64),
        Replace(usize, usize, &'static str),
    }

    fn viewport_step() -> impl Strategy<Value = ViewportStep> {
        prop_oneof![
            (0.0..1200.0f64).prop_map(|it| ViewportStep::ScrollTo(it.round())),
            (0..900usize, 0..40usize, prop::sample::select(vec!["", "\n", "xx yy zz", "q\nr"]))
                .prop_map(|(start, len, text)| ViewportStep::Replace(start, len, text)),
        ]
    }

    proptest! {
        #[test]
        fn prop_viewport_is_covered_at_any_scroll_position(
            offsets in prop::collection::vec(0.0..700.0f64, 1..8)
        ) {
            let doc = tall_paragraphs(40);
            let (mut store, mut controller, mut clip) = setup(&doc);
            controller.layout_viewport(&mut store, &doc, &mut clip);
            for offset in offsets {
                clip.scroll_to(offset.round());
                controller.layout_viewport(&mut store, &doc, &mut clip);
                assert_viewport_covered(&mut store, &doc, &controller, &clip);
            }
        }

        #[test]
        fn prop_viewport_is_covered_between_edits_and_scrolling(
            steps in prop::collection::vec(viewport_step(), 1..12)
        ) {
            let mut doc = wrapping_paragraphs(60);
            let (mut store, mut controller, mut clip) = narrow_setup(&doc);
            controller.layout_viewport(&mut store, &doc, &mut clip);
            for step in steps {
                match step {
                    ViewportStep::ScrollTo(offset) => clip.scroll_to(offset),
                    ViewportStep::Replace(start, len, text) => {
                        replace(&mut doc, &mut store, start, len, text);
                    }
                }
                let first = controller.layout_viewport(&mut store, &doc, &mut clip);
                assert_viewport_covered(&mut store, &doc, &controller, &clip);

                let second = controller.layout_viewport(&mut store, &doc, &mut clip);
                prop_assert!(second.created.is_empty());
                prop_assert_eq!(second.mounted, first.mounted);
            }
        }
    }
}
