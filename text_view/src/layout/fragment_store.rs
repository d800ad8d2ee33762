// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`LayoutFragmentStore`] computes [`LayoutFragment`]s on demand.
//!
//! Every paragraph of the document owns one slot. A slot starts out with an
//! estimated height and becomes an exact [`LayoutFragment`] the first time something
//! needs its geometry. Slot positions are derived from a movable layout anchor:
//!
//! ```text
//!            ┌──────────────┐
//!  slot 0    │ estimated    │ ▲ tops above the anchor are computed backward
//!            ├──────────────┤ │ (top = next top - height)
//!  slot 1    │ laid out     │ │
//!            ├──────────────┤ ┴
//!  slot 2 ───│ laid out     │◀── anchor { slot_index: 2, y }
//!            ├──────────────┤ ┬
//!  slot 3    │ laid out     │ │ tops below the anchor are computed forward
//!            ├──────────────┤ │ (top = previous top + previous height)
//!  slot 4    │ estimated    │ ▼
//!            └──────────────┘
//! ```
//!
//! Laying out a slot below the anchor never moves anything above it, so the content
//! the user is looking at stays put. Laying out a slot above the anchor shifts every
//! slot above it, which is the drift the viewport controller corrects for.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{AttributedString, DocRange, DocumentModel, EnumerationOptions, FragmentId,
            LayoutFragment, LineFragment, Location, Point, Rect, TextAttributes, TextEdit,
            TextElement, TextShaper, call_if_true};

const DEBUG_LAYOUT_STORE: bool = false;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub container_width: f64,
    /// When `false` lines never wrap.
    pub wraps: bool,
    pub line_fragment_padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            container_width: 500.0,
            wraps: true,
            line_fragment_padding: 0.0,
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn wrap_width(&self) -> f64 {
        if self.wraps {
            (self.container_width - 2.0 * self.line_fragment_padding).max(1.0)
        } else {
            f64::MAX
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutAnchor {
    pub slot_index: usize,
    pub y: f64,
}

#[derive(Debug)]
enum SlotState {
    /// Created by an edit, not yet estimated.
    Unmeasured,
    Estimated { height: f64 },
    LaidOut(Rc<LayoutFragment>),
}

#[derive(Debug)]
struct FragmentSlot {
    range: DocRange,
    top: f64,
    state: SlotState,
}

impl FragmentSlot {
    fn height(&self) -> f64 {
        match &self.state {
            SlotState::Unmeasured => 0.0,
            SlotState::Estimated { height } => *height,
            SlotState::LaidOut(fragment) => fragment.frame().height(),
        }
    }

    fn bottom(&self) -> f64 { self.top + self.height() }

    fn fragment(&self) -> Option<&Rc<LayoutFragment>> {
        match &self.state {
            SlotState::LaidOut(fragment) => Some(fragment),
            SlotState::Unmeasured | SlotState::Estimated { .. } => None,
        }
    }

    fn set_top(&mut self, top: f64) {
        self.top = top;
        if let SlotState::LaidOut(fragment) = &self.state {
            fragment.set_origin_y(top);
        }
    }
}

#[derive(Debug)]
pub struct LayoutFragmentStore {
    shaper: Box<dyn TextShaper>,
    config: LayoutConfig,
    slots: Vec<FragmentSlot>,
    anchor: LayoutAnchor,
    extra_line_attributes: TextAttributes,
    empty_fragment: Option<Rc<LayoutFragment>>,
    next_fragment_id: u64,
    synced_generation: Option<u64>,
}

impl LayoutFragmentStore {
    #[must_use]
    pub fn new(shaper: Box<dyn TextShaper>, config: LayoutConfig) -> Self {
        Self {
            shaper,
            config,
            slots: vec![],
            anchor: LayoutAnchor {
                slot_index: 0,
                y: 0.0,
            },
            extra_line_attributes: TextAttributes::default(),
            empty_fragment: None,
            next_fragment_id: 0,
            synced_generation: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig { &self.config }

    #[must_use]
    pub fn anchor(&self) -> LayoutAnchor { self.anchor }

    #[must_use]
    pub fn slot_count(&self) -> usize { self.slots.len() }

    #[must_use]
    pub fn laid_out_count(&self) -> usize {
        self.slots.iter().filter(|it| it.fragment().is_some()).count()
    }

    /// Used for the extra line fragment when the paragraph gives no better choice, and
    /// for the whole fragment of an empty document.
    pub fn set_extra_line_attributes(&mut self, attributes: TextAttributes) {
        if self.extra_line_attributes != attributes {
            self.extra_line_attributes = attributes;
            self.empty_fragment = None;
        }
    }

    /// Changes the wrapping width. Every fragment is laid out again on next use.
    pub fn set_config<D: DocumentModel + ?Sized>(&mut self, doc: &D, config: LayoutConfig) {
        if self.config == config {
            return;
        }
        tracing::debug!(
            message = "📐 layout config changed, invalidating all fragments",
            container_width = config.container_width,
            wraps = config.wraps
        );
        self.config = config;
        self.empty_fragment = None;
        for index in 0..self.slots.len() {
            let height = self.estimate_height_for_slot(doc, index);
            self.slots[index].state = SlotState::Estimated { height };
        }
        self.recompute_tops();
    }

    /// Throws away all slots and estimates them again from the document.
    pub fn rebuild<D: DocumentModel + ?Sized>(&mut self, doc: &D) {
        let mut slots = vec![];
        let mut elements = vec![];
        doc.enumerate_elements(None, EnumerationOptions::FORWARD, &mut |element| {
            elements.push(element.clone());
            true
        });
        let count = elements.len();
        for (index, element) in elements.iter().enumerate() {
            slots.push(FragmentSlot {
                range: element.range,
                top: 0.0,
                state: SlotState::Estimated {
                    height: self.estimate_height(element, index + 1 == count),
                },
            });
        }
        self.slots = slots;
        self.empty_fragment = None;
        self.anchor = LayoutAnchor {
            slot_index: 0,
            y: 0.0,
        };
        self.synced_generation = Some(doc.edit_generation());
        self.recompute_tops();

        tracing::debug!(message = "📐 layout store rebuilt", slot_count = self.slots.len());
    }

    /// Rebuilds if the document changed without [`Self::invalidate`] being called.
    pub fn ensure_synced<D: DocumentModel + ?Sized>(&mut self, doc: &D) {
        if self.synced_generation != Some(doc.edit_generation()) {
            if self.synced_generation.is_some() {
                tracing::warn!(
                    message = "📐 layout store out of sync with document, rebuilding",
                    synced = ?self.synced_generation,
                    current = doc.edit_generation()
                );
            }
            self.rebuild(doc);
        }
    }

    /// Applies published document edits. Only slots touched by an edit lose their
    /// layout; slots after an edit are shifted and keep their fragments.
    pub fn invalidate<D: DocumentModel + ?Sized>(&mut self, doc: &D, edits: &[TextEdit]) {
        if edits.is_empty() {
            self.synced_generation = Some(doc.edit_generation());
            return;
        }
        if self.synced_generation.is_none() {
            self.rebuild(doc);
            return;
        }

        let mut anchor_location = self
            .slots
            .get(self.anchor.slot_index)
            .map_or(0, |it| it.range.location().byte_index());
        let anchor_y = self.anchor.y;

        // Structural pass: replace touched slots by dirty placeholders.
        let mut dirty: Vec<bool> = vec![false; self.slots.len()];
        for edit in edits {
            let replaced = edit.replaced_range.byte_range();
            let delta = edit.delta();

            let first = self
                .slots
                .iter()
                .position(|it| it.range.end_location().byte_index() >= replaced.start)
                .unwrap_or(self.slots.len());
            let last_exclusive = self
                .slots
                .iter()
                .rposition(|it| it.range.location().byte_index() <= replaced.end)
                .map_or(first, |it| (it + 1).max(first));

            let start = self
                .slots
                .get(first)
                .map_or(replaced.start, |it| it.range.location().byte_index().min(replaced.start));
            let old_end = if last_exclusive > first {
                self.slots[last_exclusive - 1]
                    .range
                    .end_location()
                    .byte_index()
                    .max(replaced.end)
            } else {
                replaced.end
            };
            let new_end = old_end.saturating_add_signed(delta);

            if anchor_location >= old_end && anchor_location > replaced.start {
                anchor_location = anchor_location.saturating_add_signed(delta);
            } else if anchor_location >= start && anchor_location < old_end.max(start + 1) {
                anchor_location = start;
            }

            for slot in &mut self.slots[last_exclusive..] {
                let shifted = slot.range.byte_range();
                slot.range = DocRange::from_byte_range(
                    shifted.start.saturating_add_signed(delta)
                        ..shifted.end.saturating_add_signed(delta),
                );
                if let SlotState::LaidOut(fragment) = &slot.state {
                    fragment.shift_range(delta);
                }
            }

            self.slots.splice(
                first..last_exclusive,
                std::iter::once(FragmentSlot {
                    range: DocRange::from_byte_range(start..new_end),
                    top: 0.0,
                    state: SlotState::Unmeasured,
                }),
            );
            dirty.splice(first..last_exclusive, std::iter::once(true));
        }

        // Re-enumerate paragraphs for every placeholder.
        let old_slots = std::mem::take(&mut self.slots);
        let count_hint = old_slots.len();
        let mut slots = Vec::with_capacity(count_hint);
        for (slot, is_dirty) in old_slots.into_iter().zip(dirty) {
            if !is_dirty {
                slots.push(slot);
                continue;
            }
            let placeholder = slot.range.byte_range();
            if placeholder.is_empty() {
                continue;
            }
            let mut elements: Vec<TextElement> = vec![];
            doc.enumerate_elements(
                Some(Location::from_byte_index(placeholder.start)),
                EnumerationOptions::FORWARD,
                &mut |element| {
                    let element_start = element.range.location().byte_index();
                    if element_start >= placeholder.end {
                        return false;
                    }
                    if element_start >= placeholder.start {
                        elements.push(element.clone());
                    }
                    true
                },
            );
            for element in elements {
                slots.push(FragmentSlot {
                    range: element.range,
                    top: 0.0,
                    state: SlotState::Unmeasured,
                });
            }
        }
        self.slots = slots;

        if !self.slots_tile_document(doc) {
            tracing::warn!(message = "📐 slots don't tile the document after edit, rebuilding");
            self.rebuild(doc);
            return;
        }

        // Estimate the new slots, and any slot whose extra line fragment is now wrong.
        let last_index = self.slots.len().saturating_sub(1);
        let ends_with_line_break = self.document_ends_with_line_break(doc);
        for index in 0..self.slots.len() {
            let is_last = index == last_index;
            let is_stale = match &self.slots[index].state {
                SlotState::Unmeasured => true,
                SlotState::Estimated { .. } => is_last,
                SlotState::LaidOut(fragment) => {
                    fragment.has_extra_line_fragment() != (is_last && ends_with_line_break)
                }
            };
            if is_stale {
                let height = self.estimate_height_for_slot(doc, index);
                self.slots[index].state = SlotState::Estimated { height };
            }
        }

        self.empty_fragment = None;
        self.anchor = LayoutAnchor {
            slot_index: self
                .slot_index_for(Location::from_byte_index(anchor_location))
                .unwrap_or(0),
            y: anchor_y,
        };
        if self.slots.is_empty() {
            self.anchor.y = 0.0;
        }
        self.synced_generation = Some(doc.edit_generation());
        self.recompute_tops();

        tracing::debug!(
            message = "📐 layout store invalidated",
            edit_count = edits.len(),
            slot_count = self.slots.len(),
            laid_out = self.laid_out_count()
        );
    }

    /// Fragment containing `location`, laid out if needed. Locations outside of the
    /// document yield [`None`].
    pub fn fragment_for<D: DocumentModel + ?Sized>(
        &mut self,
        doc: &D,
        location: Location,
    ) -> Option<Rc<LayoutFragment>> {
        self.ensure_synced(doc);
        if self.slots.is_empty() {
            return (location == doc.document_range().location())
                .then(|| self.empty_fragment());
        }
        let index = self.slot_index_for(location)?;
        self.layout_slot(doc, index)
    }

    /// Fragment containing `location` only if it is already laid out.
    #[must_use]
    pub fn laid_out_fragment_for(&self, location: Location) -> Option<Rc<LayoutFragment>> {
        if self.slots.is_empty() {
            return self.empty_fragment.clone();
        }
        let index = self.slot_index_for(location)?;
        self.slots[index].fragment().cloned()
    }

    /// Fragment whose vertical span contains `point.y`, laid out if needed.
    pub fn fragment_at_point<D: DocumentModel + ?Sized>(
        &mut self,
        doc: &D,
        point: Point,
    ) -> Option<Rc<LayoutFragment>> {
        self.ensure_synced(doc);
        if self.slots.is_empty() {
            let fragment = self.empty_fragment();
            let frame = fragment.frame();
            return (point.y >= frame.min_y() && point.y < frame.max_y()).then_some(fragment);
        }
        let index = self.slot_index_at_y(point.y)?;
        let fragment = self.layout_slot(doc, index)?;
        // Exact layout may have changed the height of the slot.
        let frame = fragment.frame();
        if point.y >= frame.min_y() && point.y < frame.max_y() {
            return Some(fragment);
        }
        let index = self.slot_index_at_y(point.y)?;
        self.layout_slot(doc, index)
    }

    /// Calls `f` with each fragment starting at the one containing `from`. Without
    /// `ensures_layout` only fragments that are already laid out are visited. Returns
    /// the start of the fragment where `f` returned `false`.
    pub fn enumerate_fragments<D: DocumentModel + ?Sized>(
        &mut self,
        doc: &D,
        from: Option<Location>,
        options: EnumerationOptions,
        mut f: impl FnMut(&Rc<LayoutFragment>) -> bool,
    ) -> Option<Location> {
        self.ensure_synced(doc);

        if self.slots.is_empty() {
            let fragment = self.empty_fragment();
            return (!f(&fragment)).then(|| fragment.range_in_element().location());
        }

        let start = match from {
            Some(location) => self.slot_index_for(location)?,
            None if options.reverse => self.slots.len() - 1,
            None => 0,
        };

        let visit = |store: &mut Self, index: usize| -> Option<Rc<LayoutFragment>> {
            if options.ensures_layout {
                store.layout_slot(doc, index)
            } else {
                store.slots[index].fragment().cloned()
            }
        };

        if options.reverse {
            for index in (0..=start).rev() {
                if let Some(fragment) = visit(self, index)
                    && !f(&fragment)
                {
                    return Some(fragment.range_in_element().location());
                }
            }
        } else {
            for index in start..self.slots.len() {
                if let Some(fragment) = visit(self, index)
                    && !f(&fragment)
                {
                    return Some(fragment.range_in_element().location());
                }
            }
        }
        None
    }

    /// Lazy sequence of fragments intersecting `range`, laid out as they are produced.
    /// Dropping the iterator early leaves the rest untouched; a new one can start from
    /// any location.
    pub fn fragments_intersecting<'a, D: DocumentModel + ?Sized>(
        &'a mut self,
        doc: &'a D,
        range: DocRange,
    ) -> FragmentsIntersecting<'a, D> {
        self.ensure_synced(doc);
        let range = range.clamped(&doc.document_range());
        let next_index = self.slot_index_for(range.location());
        FragmentsIntersecting {
            store: self,
            doc,
            range,
            next_index,
            yielded_empty_fragment: false,
        }
    }

    /// Forces layout of every fragment intersecting `range`.
    ///
    /// This is expensive. Its cost grows with the size of `range`, so calling it with
    /// the whole document range is `O(document size)`. Prefer the narrowest range
    /// that answers the question at hand.
    pub fn ensure_layout<D: DocumentModel + ?Sized>(&mut self, doc: &D, range: DocRange) {
        let count = self.fragments_intersecting(doc, range).count();
        call_if_true!(DEBUG_LAYOUT_STORE, {
            tracing::trace!(message = "📐 ensure_layout", ?range, fragment_count = count);
        });
    }

    /// Lays out every slot whose (possibly estimated) position intersects `rect`.
    ///
    /// Layout grows forward from the anchor (or the first slot in `rect` if the anchor
    /// is outside of it) and then backward above it, so slots above the starting point
    /// drift upward instead of pushing visible content down.
    pub fn ensure_layout_for_rect<D: DocumentModel + ?Sized>(&mut self, doc: &D, rect: Rect) {
        self.ensure_synced(doc);
        if self.slots.is_empty() {
            return;
        }
        let start = if self.slot_intersects_y(self.anchor.slot_index, rect) {
            self.anchor.slot_index
        } else {
            self.slot_index_at_y_clamped(rect.min_y())
        };

        let mut index = start;
        while index < self.slots.len() && self.slots[index].top < rect.max_y() {
            self.layout_slot(doc, index);
            index += 1;
        }

        let mut index = start;
        while index > 0 && self.slots[index - 1].bottom() > rect.min_y() {
            index -= 1;
            self.layout_slot(doc, index);
        }
    }

    /// Keeps the anchor if its slot intersects `rect`. Otherwise moves it to the first
    /// laid out slot in `rect`, or to the slot at the top of `rect`.
    pub fn settle_anchor_in(&mut self, rect: Rect) {
        if self.slots.is_empty() || self.slot_intersects_y(self.anchor.slot_index, rect) {
            return;
        }
        let first = self.slot_index_at_y_clamped(rect.min_y());
        let laid_out = (first..self.slots.len())
            .take_while(|&it| self.slots[it].top < rect.max_y())
            .find(|&it| self.slots[it].fragment().is_some());
        let index = laid_out.unwrap_or(first);
        self.relocate_anchor_to_slot(index);
        call_if_true!(DEBUG_LAYOUT_STORE, {
            tracing::trace!(message = "📐 anchor settled", index, y = self.anchor.y);
        });
    }

    /// Moves the anchor to the slot containing `location` without moving anything.
    /// Returns the top of that slot.
    pub fn relocate_anchor_to(&mut self, location: Location) -> Option<f64> {
        let index = self.slot_index_for(location)?;
        self.relocate_anchor_to_slot(index);
        Some(self.anchor.y)
    }

    /// Moves every slot by `dy`.
    pub fn adjust_anchor_by(&mut self, dy: f64) {
        self.anchor.y += dy;
        for slot in &mut self.slots {
            let top = slot.top + dy;
            slot.set_top(top);
        }
        if let Some(fragment) = &self.empty_fragment {
            fragment.set_origin_y(fragment.frame().min_y() + dy);
        }
    }

    /// Top of the first slot. Zero when the layout has not drifted.
    #[must_use]
    pub fn top_of_document(&self) -> f64 { self.slots.first().map_or(0.0, |it| it.top) }

    /// Area used by all slots, estimated ones included.
    #[must_use]
    pub fn usage_bounds(&self) -> Rect {
        let width = self.usage_width();
        match (self.slots.first(), self.slots.last()) {
            (Some(first), Some(last)) => {
                Rect::new(0.0, first.top, width, last.bottom() - first.top)
            }
            _ => {
                let height = self.shaper.line_metrics(&self.extra_line_attributes).height();
                Rect::new(0.0, 0.0, width, height)
            }
        }
    }

    /// Start of the slot at `y`, clamped to the first or last slot.
    #[must_use]
    pub fn location_for_y(&self, y: f64) -> Option<Location> {
        self.slots
            .get(self.slot_index_at_y_clamped(y))
            .map(|it| it.range.location())
    }

    /// Top and height of the slot containing `location`, estimated or exact.
    #[must_use]
    pub fn slot_frame_for(&self, location: Location) -> Option<Rect> {
        let index = self.slot_index_for(location)?;
        let slot = &self.slots[index];
        Some(Rect::new(0.0, slot.top, self.usage_width(), slot.height()))
    }

    #[must_use]
    pub fn document_ends_with_line_break<D: DocumentModel + ?Sized>(&self, doc: &D) -> bool {
        let range = doc.document_range();
        doc.location(range.end_location(), -1)
            .is_some_and(|it| doc.text_in(DocRange::from_unordered(it, range.end_location())) == "\n")
    }
}

mod impl_slots {
    use super::*;

    impl LayoutFragmentStore {
        pub(super) fn slot_index_for(&self, location: Location) -> Option<usize> {
            let last = self.slots.last()?;
            let index = self
                .slots
                .partition_point(|it| it.range.end_location() <= location);
            if index < self.slots.len() {
                Some(index)
            } else {
                (location == last.range.end_location()).then(|| self.slots.len() - 1)
            }
        }

        pub(super) fn slot_index_at_y(&self, y: f64) -> Option<usize> {
            let first = self.slots.first()?;
            if y < first.top {
                return None;
            }
            let index = self.slots.partition_point(|it| it.bottom() <= y);
            (index < self.slots.len()).then_some(index)
        }

        pub(super) fn slot_index_at_y_clamped(&self, y: f64) -> usize {
            match self.slot_index_at_y(y) {
                Some(index) => index,
                None => match self.slots.first() {
                    Some(first) if y < first.top => 0,
                    _ => self.slots.len().saturating_sub(1),
                },
            }
        }

        pub(super) fn slot_intersects_y(&self, index: usize, rect: Rect) -> bool {
            self.slots
                .get(index)
                .is_some_and(|it| it.top < rect.max_y() && it.bottom() > rect.min_y())
        }

        pub(super) fn relocate_anchor_to_slot(&mut self, index: usize) {
            if let Some(slot) = self.slots.get(index) {
                self.anchor = LayoutAnchor {
                    slot_index: index,
                    y: slot.top,
                };
            }
        }

        pub(super) fn usage_width(&self) -> f64 {
            if self.config.wraps {
                return self.config.container_width;
            }
            self.slots
                .iter()
                .filter_map(|it| it.fragment().map(|it| it.frame().width()))
                .fold(self.config.container_width, f64::max)
        }

        /// Positions every slot relative to the anchor.
        pub(super) fn recompute_tops(&mut self) {
            if self.slots.is_empty() {
                return;
            }
            let anchor_index = self.anchor.slot_index.min(self.slots.len() - 1);
            self.anchor.slot_index = anchor_index;
            self.slots[anchor_index].set_top(self.anchor.y);
            for index in anchor_index + 1..self.slots.len() {
                let top = self.slots[index - 1].bottom();
                self.slots[index].set_top(top);
            }
            for index in (0..anchor_index).rev() {
                let top = self.slots[index + 1].top - self.slots[index].height();
                self.slots[index].set_top(top);
            }
        }

        /// Repositions slots after the height of slot `changed` changed.
        fn refresh_tops_after(&mut self, changed: usize) {
            if changed >= self.anchor.slot_index {
                for index in changed + 1..self.slots.len() {
                    let top = self.slots[index - 1].bottom();
                    self.slots[index].set_top(top);
                }
            } else {
                for index in (0..=changed).rev() {
                    let top = self.slots[index + 1].top - self.slots[index].height();
                    self.slots[index].set_top(top);
                }
            }
        }

        pub(super) fn slots_tile_document<D: DocumentModel + ?Sized>(&self, doc: &D) -> bool {
            let document_range = doc.document_range();
            let mut expected = document_range.location();
            for slot in &self.slots {
                if slot.range.location() != expected || slot.range.is_empty() {
                    return false;
                }
                expected = slot.range.end_location();
            }
            expected == document_range.end_location()
        }

        pub(super) fn layout_slot<D: DocumentModel + ?Sized>(
            &mut self,
            doc: &D,
            index: usize,
        ) -> Option<Rc<LayoutFragment>> {
            let slot = self.slots.get(index)?;
            if let Some(fragment) = slot.fragment() {
                return Some(fragment.clone());
            }

            let range = slot.range;
            let top = slot.top;
            let mut found: Option<TextElement> = None;
            doc.enumerate_elements(
                Some(range.location()),
                EnumerationOptions::FORWARD,
                &mut |element| {
                    found = Some(element.clone());
                    false
                },
            );
            let element = found?;
            if element.range != range {
                tracing::warn!(
                    message = "📐 slot range doesn't match paragraph",
                    slot = ?range,
                    element = ?element.range
                );
            }

            let with_extra_line =
                index + 1 == self.slots.len() && element.ends_with_line_break();
            let fragment = Rc::new(self.make_fragment(&element, top, with_extra_line));
            self.slots[index].state = SlotState::LaidOut(fragment.clone());
            self.refresh_tops_after(index);

            call_if_true!(DEBUG_LAYOUT_STORE, {
                tracing::trace!(
                    message = "📐 laid out slot",
                    index,
                    id = %fragment.id(),
                    frame = %fragment.frame()
                );
            });

            Some(fragment)
        }

        fn next_id(&mut self) -> FragmentId {
            self.next_fragment_id += 1;
            FragmentId(self.next_fragment_id)
        }

        fn make_fragment(
            &mut self,
            element: &TextElement,
            top: f64,
            with_extra_line: bool,
        ) -> LayoutFragment {
            let padding = self.config.line_fragment_padding;
            let shaped =
                self.shaper
                    .shape_paragraph(&element.text, &element.runs, self.config.wrap_width());

            let mut line_fragments: SmallVec<[LineFragment; 2]> = SmallVec::new();
            let mut y = 0.0;
            let mut max_width: f64 = 0.0;
            for (line_index, line) in shaped.into_iter().enumerate() {
                let height = line.metrics.height();
                max_width = max_width.max(line.width);
                line_fragments.push(LineFragment {
                    character_range: line.byte_range,
                    typographic_bounds: Rect::new(padding, y, line.width, height),
                    metrics: line.metrics,
                    caret_offsets: line.caret_offsets.into_iter().collect(),
                    starts_after_soft_wrap: line_index > 0,
                });
                y += height;
            }

            if with_extra_line {
                let attributes = element
                    .runs
                    .last()
                    .map_or_else(|| self.extra_line_attributes.clone(), |it| it.attributes.clone());
                let metrics = self.shaper.line_metrics(&attributes);
                let end = element.text.len();
                line_fragments.push(LineFragment {
                    character_range: end..end,
                    typographic_bounds: Rect::new(padding, y, 0.0, metrics.height()),
                    metrics,
                    caret_offsets: SmallVec::new(),
                    starts_after_soft_wrap: false,
                });
                y += metrics.height();
            }

            let width = if self.config.wraps {
                self.config.container_width
            } else {
                max_width + 2.0 * padding
            };

            LayoutFragment::new(
                self.next_id(),
                element.range,
                Rect::new(0.0, top, width, y),
                AttributedString::from_runs(element.text.clone(), element.runs.clone()),
                line_fragments,
                false,
            )
        }

        pub(super) fn empty_fragment(&mut self) -> Rc<LayoutFragment> {
            if let Some(fragment) = &self.empty_fragment {
                return fragment.clone();
            }
            let padding = self.config.line_fragment_padding;
            let metrics = self.shaper.line_metrics(&self.extra_line_attributes);
            let mut line_fragments: SmallVec<[LineFragment; 2]> = SmallVec::new();
            line_fragments.push(LineFragment {
                character_range: 0..0,
                typographic_bounds: Rect::new(padding, 0.0, 0.0, metrics.height()),
                metrics,
                caret_offsets: SmallVec::new(),
                starts_after_soft_wrap: false,
            });
            let id = self.next_id();
            let fragment = Rc::new(LayoutFragment::new(
                id,
                DocRange::empty_at(Location::default()),
                Rect::new(0.0, 0.0, self.config.container_width, metrics.height()),
                AttributedString::default(),
                line_fragments,
                true,
            ));
            self.empty_fragment = Some(fragment.clone());
            fragment
        }

        #[allow(clippy::cast_precision_loss)]
        pub(super) fn estimate_height(&self, element: &TextElement, is_last: bool) -> f64 {
            let attributes = element
                .runs
                .first()
                .map_or_else(|| self.extra_line_attributes.clone(), |it| it.attributes.clone());
            let line_height = self.shaper.line_metrics(&attributes).height();
            let estimated_width =
                element.content().chars().count() as f64 * attributes.font_size / 2.0;
            let line_count = if self.config.wraps {
                (estimated_width / self.config.wrap_width()).ceil().max(1.0)
            } else {
                1.0
            };
            let extra = if is_last && element.ends_with_line_break() {
                line_height
            } else {
                0.0
            };
            line_count * line_height + extra
        }

        pub(super) fn estimate_height_for_slot<D: DocumentModel + ?Sized>(
            &self,
            doc: &D,
            index: usize,
        ) -> f64 {
            let Some(slot) = self.slots.get(index) else {
                return 0.0;
            };
            let mut height = None;
            let is_last = index + 1 == self.slots.len();
            doc.enumerate_elements(
                Some(slot.range.location()),
                EnumerationOptions::FORWARD,
                &mut |element| {
                    height = Some(self.estimate_height(element, is_last));
                    false
                },
            );
            height.unwrap_or_else(|| self.shaper.line_metrics(&self.extra_line_attributes).height())
        }
    }
}

/// See [`LayoutFragmentStore::fragments_intersecting`].
#[allow(missing_debug_implementations)]
pub struct FragmentsIntersecting<'a, D: DocumentModel + ?Sized> {
    store: &'a mut LayoutFragmentStore,
    doc: &'a D,
    range: DocRange,
    next_index: Option<usize>,
    yielded_empty_fragment: bool,
}

impl<D: DocumentModel + ?Sized> Iterator for FragmentsIntersecting<'_, D> {
    type Item = Rc<LayoutFragment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.store.slots.is_empty() {
            if self.yielded_empty_fragment {
                return None;
            }
            self.yielded_empty_fragment = true;
            return Some(self.store.empty_fragment());
        }

        let index = self.next_index?;
        let slot = self.store.slots.get(index)?;
        let is_first = self.store.slot_index_for(self.range.location()) == Some(index);
        if !is_first && !slot.range.intersects(&self.range) {
            self.next_index = None;
            return None;
        }
        if !is_first && self.range.is_empty() {
            self.next_index = None;
            return None;
        }
        self.next_index = Some(index + 1);
        self.store.layout_slot(self.doc, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributedString, MonospaceShaper, TextContentStorage};
    use pretty_assertions::assert_eq;

    fn store_for(doc: &TextContentStorage, width: f64) -> LayoutFragmentStore {
        let mut store = LayoutFragmentStore::new(
            Box::new(MonospaceShaper),
            LayoutConfig {
                container_width: width,
                ..Default::default()
            },
        );
        store.rebuild(doc);
        store
    }

    #[test]
    fn test_fragment_for_lays_out_lazily() {
        let doc = TextContentStorage::from_plain("012\n456\n89");
        let mut store = store_for(&doc, 500.0);
        assert_eq!(store.slot_count(), 3);
        assert_eq!(store.laid_out_count(), 0);

        let location = doc.location_from_start(5).unwrap();
        let fragment = store.fragment_for(&doc, location).unwrap();
        assert_eq!(doc.char_range(fragment.range_in_element()), (4, 4));
        assert_eq!(fragment.frame(), Rect::new(0.0, 10.0, 500.0, 10.0));
        assert_eq!(store.laid_out_count(), 1);

        // Same identity on the second lookup.
        let again = store.fragment_for(&doc, location).unwrap();
        assert_eq!(again.id(), fragment.id());
    }

    #[test]
    fn test_out_of_range_location_yields_none() {
        let doc = TextContentStorage::from_plain("ab");
        let mut store = store_for(&doc, 500.0);
        let past_end = Location::from_byte_index(10);
        assert!(store.fragment_for(&doc, past_end).is_none());
        let end = doc.document_range().end_location();
        assert!(store.fragment_for(&doc, end).is_some());
    }

    #[test]
    fn test_extra_line_fragment_for_trailing_line_break() {
        let doc = TextContentStorage::from_plain("ab\n");
        let mut store = store_for(&doc, 500.0);
        let end = doc.document_range().end_location();
        let fragment = store.fragment_for(&doc, end).unwrap();
        assert!(fragment.has_extra_line_fragment());
        assert_eq!(fragment.line_fragments().len(), 2);
        assert_eq!(fragment.frame().height(), 20.0);
    }

    #[test]
    fn test_empty_document_has_single_extra_fragment() {
        let doc = TextContentStorage::default();
        let mut store = store_for(&doc, 500.0);
        let mut seen = vec![];
        store.enumerate_fragments(&doc, None, EnumerationOptions::FORWARD, |it| {
            seen.push(it.clone());
            true
        });
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_extra_fragment());
        assert!(seen[0].line_fragments()[0].is_extra_line_fragment());
        assert_eq!(store.usage_bounds().height(), 10.0);
    }

    #[test]
    fn test_enumeration_can_stop_early() {
        let doc = TextContentStorage::from_plain("a\nb\nc\nd");
        let mut store = store_for(&doc, 500.0);
        let mut count = 0;
        let options = EnumerationOptions {
            reverse: false,
            ensures_layout: true,
        };
        let stopped = store.enumerate_fragments(&doc, None, options, |_| {
            count += 1;
            count < 2
        });
        assert_eq!(count, 2);
        assert_eq!(stopped, doc.location_from_start(2));
        assert_eq!(store.laid_out_count(), 2);
    }

    #[test]
    fn test_fragments_intersecting_is_lazy_and_restartable() {
        let doc = TextContentStorage::from_plain("a\nb\nc\nd");
        let mut store = store_for(&doc, 500.0);
        let range = doc.range_from_chars(2, 3);
        let first = store.fragments_intersecting(&doc, range).next().unwrap();
        assert_eq!(doc.char_range(first.range_in_element()), (2, 2));
        assert_eq!(store.laid_out_count(), 1);

        let all: Vec<_> = store.fragments_intersecting(&doc, range).collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id(), first.id());
    }

    #[test]
    fn test_invalidate_keeps_fragments_after_edit() {
        let mut doc = TextContentStorage::from_plain("aa\nbb\ncc");
        let mut store = store_for(&doc, 500.0);
        store.ensure_layout(&doc, doc.document_range());
        let last_before = store
            .fragment_for(&doc, doc.location_from_start(7).unwrap())
            .unwrap();

        let at = doc.range_from_chars(1, 0);
        doc.replace_contents(at, &AttributedString::plain("X\nY"));
        let edits = doc.take_edits();
        store.invalidate(&doc, &edits);

        assert_eq!(store.slot_count(), 4);
        let last_after = store
            .fragment_for(&doc, doc.location_from_start(9).unwrap())
            .unwrap();
        assert_eq!(last_after.id(), last_before.id());
        assert_eq!(doc.char_range(last_after.range_in_element()), (9, 2));
        assert_eq!(last_after.frame().min_y(), 30.0);
    }

    #[test]
    fn test_invalidate_appending_after_trailing_line_break() {
        let mut doc = TextContentStorage::from_plain("ab\n");
        let mut store = store_for(&doc, 500.0);
        store.ensure_layout(&doc, doc.document_range());

        let end = DocRange::empty_at(doc.document_range().end_location());
        doc.replace_contents(end, &AttributedString::plain("c"));
        let edits = doc.take_edits();
        store.invalidate(&doc, &edits);

        assert_eq!(store.slot_count(), 2);
        let first = store
            .fragment_for(&doc, doc.document_range().location())
            .unwrap();
        assert!(!first.has_extra_line_fragment());
        assert_eq!(store.usage_bounds().height(), 20.0);
    }

    #[test]
    fn test_invalidate_deleting_everything() {
        let mut doc = TextContentStorage::from_plain("ab\ncd");
        let mut store = store_for(&doc, 500.0);
        doc.replace_contents(doc.document_range(), &AttributedString::default());
        let edits = doc.take_edits();
        store.invalidate(&doc, &edits);
        assert_eq!(store.slot_count(), 0);
        let fragment = store
            .fragment_for(&doc, doc.document_range().location())
            .unwrap();
        assert!(fragment.is_extra_fragment());
    }

    #[test]
    fn test_layout_above_anchor_drifts_upward() {
        // First paragraph is taller than its estimate.
        let big = TextAttributes::default().with_font_size(20.0);
        let mut doc = TextContentStorage::from_plain("ab\nc\nd");
        let second = doc.range_from_chars(1, 1);
        doc.replace_contents(second, &AttributedString::new("b", big));
        let mut store = store_for(&doc, 500.0);
        store.relocate_anchor_to(doc.location_from_start(5).unwrap());
        let anchor_y = store.anchor().y;

        store.ensure_layout(&doc, doc.range_from_chars(0, 1));
        // Laying out above the anchor doesn't move the anchor.
        assert_eq!(store.anchor().y, anchor_y);
        assert_eq!(store.top_of_document(), -10.0);

        store.adjust_anchor_by(-store.top_of_document());
        assert_eq!(store.top_of_document(), 0.0);
    }

    #[test]
    fn test_width_change_invalidates_layout() {
        let doc = TextContentStorage::from_plain("Hello world");
        let mut store = store_for(&doc, 500.0);
        let start = doc.document_range().location();
        let wide = store.fragment_for(&doc, start).unwrap();
        assert_eq!(wide.line_fragments().len(), 1);

        let config = LayoutConfig {
            container_width: 40.0,
            ..*store.config()
        };
        store.set_config(&doc, config);
        let narrow = store.fragment_for(&doc, start).unwrap();
        assert_ne!(narrow.id(), wide.id());
        assert_eq!(narrow.line_fragments().len(), 2);
        assert!(narrow.line_fragments()[1].starts_after_soft_wrap);
    }

    #[test]
    fn test_no_wrap_uses_unbounded_width() {
        let doc = TextContentStorage::from_plain("Hello world");
        let mut store = LayoutFragmentStore::new(
            Box::new(MonospaceShaper),
            LayoutConfig {
                container_width: 20.0,
                wraps: false,
                line_fragment_padding: 0.0,
            },
        );
        store.rebuild(&doc);
        let fragment = store
            .fragment_for(&doc, doc.document_range().location())
            .unwrap();
        assert_eq!(fragment.line_fragments().len(), 1);
        assert_eq!(fragment.frame().width(), 55.0);
    }
}
