// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use strum_macros::{Display, EnumIter};

use crate::{DocRange, Location};

/// Which of two visually adjacent positions a caret belongs to: the end of a wrapped
/// line (`Upstream`) or the start of the next one (`Downstream`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
pub enum Affinity {
    Upstream,
    #[default]
    Downstream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize)]
pub enum Granularity {
    #[default]
    Character,
    Word,
    Line,
    Paragraph,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    Forward,
    Backward,
}

impl Direction {
    /// Towards the start of the document, for left-to-right text.
    #[must_use]
    pub fn is_backward(self) -> bool { matches!(self, Self::Left | Self::Up | Self::Backward) }

    #[must_use]
    pub fn is_vertical(self) -> bool { matches!(self, Self::Up | Self::Down) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionModifiers {
    /// Shift: extend the last selection.
    pub extend: bool,
    /// Option: rectangular selection. Accepted and treated like a logical selection.
    pub visual: bool,
    /// Command: add a selection instead of replacing.
    pub multiple: bool,
}

/// One selection: one or more ranges plus how it was made.
///
/// Selections are values. Navigation produces new ones instead of mutating.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSelection {
    ranges: SmallVec<[DocRange; 1]>,
    pub granularity: Granularity,
    pub affinity: Affinity,
    /// Programmatic state that is not drawn.
    pub is_logical: bool,
    /// Scratch state (double click in progress) left out of selection reporting.
    pub is_transient: bool,
    /// Fixed end of an extended selection.
    anchor: Option<Location>,
    /// Sticky x used by repeated vertical moves.
    pub anchor_position_offset: Option<f64>,
}

impl TextSelection {
    #[must_use]
    pub fn new(range: DocRange, affinity: Affinity, granularity: Granularity) -> Self {
        Self {
            ranges: smallvec![range],
            granularity,
            affinity,
            is_logical: false,
            is_transient: false,
            anchor: None,
            anchor_position_offset: None,
        }
    }

    #[must_use]
    pub fn insertion_point(location: Location, affinity: Affinity) -> Self {
        Self::new(DocRange::empty_at(location), affinity, Granularity::Character)
    }

    /// Ranges are sorted. An empty list is replaced by the empty range at `fallback`.
    #[must_use]
    pub fn from_ranges(mut ranges: Vec<DocRange>, fallback: Location) -> Self {
        ranges.sort_by_key(DocRange::location);
        ranges.dedup();
        if ranges.is_empty() {
            ranges.push(DocRange::empty_at(fallback));
        }
        Self {
            ranges: ranges.into_iter().collect(),
            ..Self::insertion_point(fallback, Affinity::Downstream)
        }
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: Option<Location>) -> Self {
        self.anchor = anchor;
        self
    }

    #[must_use]
    pub fn with_anchor_position_offset(mut self, x: Option<f64>) -> Self {
        self.anchor_position_offset = x;
        self
    }

    #[must_use]
    pub fn with_transient(mut self, is_transient: bool) -> Self {
        self.is_transient = is_transient;
        self
    }

    #[must_use]
    pub fn ranges(&self) -> &[DocRange] { &self.ranges }

    /// Smallest range that covers every range of the selection.
    #[must_use]
    pub fn range(&self) -> DocRange {
        let first = self.ranges[0];
        self.ranges[1..].iter().fold(first, |acc, it| acc.union(it))
    }

    #[must_use]
    pub fn anchor(&self) -> Option<Location> { self.anchor }

    #[must_use]
    pub fn is_insertion_point(&self) -> bool {
        !self.is_logical && self.ranges.len() == 1 && self.ranges[0].is_empty()
    }
}

/// Current selections of a view, always normalized: sorted by location, with
/// duplicate and overlapping selections merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    selections: Vec<TextSelection>,
}

impl SelectionSet {
    #[must_use]
    pub fn new(selections: Vec<TextSelection>) -> Self {
        let mut set = Self { selections };
        set.normalize();
        set
    }

    #[must_use]
    pub fn single(selection: TextSelection) -> Self {
        Self {
            selections: vec![selection],
        }
    }

    #[must_use]
    pub fn selections(&self) -> &[TextSelection] { &self.selections }

    /// The selection edits and navigation apply to: the last one.
    #[must_use]
    pub fn primary(&self) -> Option<&TextSelection> { self.selections.last() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.selections.is_empty() }

    #[must_use]
    pub fn len(&self) -> usize { self.selections.len() }

    pub fn iter(&self) -> impl Iterator<Item = &TextSelection> { self.selections.iter() }

    /// Every range of every selection, sorted.
    #[must_use]
    pub fn ranges(&self) -> Vec<DocRange> {
        self.selections
            .iter()
            .flat_map(|it| it.ranges().iter().copied())
            .collect()
    }

    /// Ranges of the selections that take part in selection reporting.
    #[must_use]
    pub fn reported_ranges(&self) -> Vec<DocRange> {
        self.selections
            .iter()
            .filter(|it| !it.is_transient)
            .flat_map(|it| it.ranges().iter().copied())
            .collect()
    }

    fn normalize(&mut self) {
        self.selections.sort_by_key(|it| it.range().location());
        let mut merged: Vec<TextSelection> = Vec::with_capacity(self.selections.len());
        for selection in self.selections.drain(..) {
            match merged.last_mut() {
                Some(last) if overlaps(&last.range(), &selection.range()) => {
                    let range = last.range().union(&selection.range());
                    let is_empty_into_range = selection.range().is_empty();
                    if !is_empty_into_range || last.range().is_empty() {
                        *last = TextSelection {
                            ranges: smallvec![range],
                            ..selection
                        };
                    }
                }
                _ => merged.push(selection),
            }
        }
        self.selections = merged;
    }
}

fn overlaps(a: &DocRange, b: &DocRange) -> bool {
    if a == b {
        return true;
    }
    match (a.is_empty(), b.is_empty()) {
        (false, false) => a.intersection(b).is_some_and(|it| !it.is_empty()),
        (true, false) => b.contains(a.location()),
        (false, true) => a.contains(b.location()),
        (true, true) => false,
    }
}
