// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`Location`] and [`DocRange`].
//!
//! A [`Location`] is an opaque, totally ordered marker into a document. Consumers never
//! do integer arithmetic on it. Moving a location by some number of characters, or
//! measuring the distance between two of them, always goes through the
//! [`crate::DocumentModel`] so it stays valid across multi byte and composed
//! characters.
//!
//! ```text
//! document:   0 1 2 \n 4 5 6 \n 8 9
//!             ▲                    ▲
//!             document start       document end
//!
//! DocRange { location: 4, end_location: 7 } covers "456"
//! DocRange { location: 4, end_location: 4 } is empty (an insertion point)
//! ```

use std::fmt::{Debug, Display, Formatter};

/// Opaque position in a document. Internally this is the byte offset into the
/// document's storage, which is only visible inside this crate.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location(usize);

impl Location {
    pub(crate) const fn from_byte_index(byte_index: usize) -> Self { Self(byte_index) }

    pub(crate) const fn byte_index(self) -> usize { self.0 }
}

impl Debug for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "@{}", self.0) }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "@{}", self.0) }
}

/// Ordered pair of [`Location`]s with `location <= end_location`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DocRange {
    location: Location,
    end_location: Location,
}

impl Debug for DocRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.location, self.end_location)
    }
}

impl DocRange {
    /// Returns [`None`] if `end_location` is before `location`.
    #[must_use]
    pub fn new(location: Location, end_location: Location) -> Option<Self> {
        (location <= end_location).then_some(Self {
            location,
            end_location,
        })
    }

    /// Orders the two locations so the result is always valid.
    #[must_use]
    pub fn from_unordered(a: Location, b: Location) -> Self {
        Self {
            location: a.min(b),
            end_location: a.max(b),
        }
    }

    #[must_use]
    pub const fn empty_at(location: Location) -> Self {
        Self {
            location,
            end_location: location,
        }
    }

    #[must_use]
    pub const fn location(&self) -> Location { self.location }

    #[must_use]
    pub const fn end_location(&self) -> Location { self.end_location }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.location == self.end_location }

    /// Half open containment. An empty range contains only its own location.
    #[must_use]
    pub fn contains(&self, location: Location) -> bool {
        if self.is_empty() {
            return location == self.location;
        }
        self.location <= location && location < self.end_location
    }

    #[must_use]
    pub fn contains_range(&self, other: &DocRange) -> bool {
        self.location <= other.location && other.end_location <= self.end_location
    }

    /// Two non empty ranges intersect if they share at least one position. An empty
    /// range intersects a range that contains its location or ends at it.
    #[must_use]
    pub fn intersects(&self, other: &DocRange) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.location <= other.end_location
                && other.location <= self.end_location;
        }
        self.location < other.end_location && other.location < self.end_location
    }

    #[must_use]
    pub fn intersection(&self, other: &DocRange) -> Option<DocRange> {
        self.intersects(other).then(|| DocRange {
            location: self.location.max(other.location),
            end_location: self.end_location.min(other.end_location),
        })
    }

    #[must_use]
    pub fn union(&self, other: &DocRange) -> DocRange {
        DocRange {
            location: self.location.min(other.location),
            end_location: self.end_location.max(other.end_location),
        }
    }

    /// Total. The result always lies inside `bounds`, collapsing to one of its
    /// boundaries when `self` lies entirely outside.
    #[must_use]
    pub fn clamped(&self, bounds: &DocRange) -> DocRange {
        let clamp = |it: Location| it.clamp(bounds.location, bounds.end_location);
        DocRange {
            location: clamp(self.location),
            end_location: clamp(self.end_location),
        }
    }

    pub(crate) fn byte_range(&self) -> std::ops::Range<usize> {
        self.location.byte_index()..self.end_location.byte_index()
    }

    pub(crate) fn from_byte_range(range: std::ops::Range<usize>) -> Self {
        Self::from_unordered(
            Location::from_byte_index(range.start),
            Location::from_byte_index(range.end),
        )
    }

    pub(crate) fn byte_len(&self) -> usize {
        self.end_location.byte_index() - self.location.byte_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn range(a: usize, b: usize) -> DocRange { DocRange::from_byte_range(a..b) }

    #[test]
    fn test_new_rejects_reversed() {
        let a = Location::from_byte_index(3);
        let b = Location::from_byte_index(1);
        assert!(DocRange::new(a, b).is_none());
        assert_eq!(DocRange::from_unordered(a, b), range(1, 3));
    }

    #[test]
    fn test_contains_and_intersects() {
        let it = range(2, 5);
        assert!(it.contains(Location::from_byte_index(2)));
        assert!(!it.contains(Location::from_byte_index(5)));
        assert!(it.intersects(&range(4, 9)));
        assert!(!it.intersects(&range(5, 9)));
        assert!(it.intersects(&range(5, 5)));
        assert!(range(3, 3).contains(Location::from_byte_index(3)));
        assert_eq!(it.intersection(&range(4, 9)), Some(range(4, 5)));
        assert_eq!(it.union(&range(7, 9)), range(2, 9));
    }

    #[test]
    fn test_clamped_outside_collapses_to_boundary() {
        let bounds = range(10, 20);
        assert_eq!(range(0, 5).clamped(&bounds), range(10, 10));
        assert_eq!(range(25, 30).clamped(&bounds), range(20, 20));
        assert_eq!(range(5, 15).clamped(&bounds), range(10, 15));
    }

    proptest! {
        #[test]
        fn prop_clamped_is_contained(
            a in 0usize..200, b in 0usize..200, c in 0usize..200, d in 0usize..200
        ) {
            let it = range(a, b);
            let bounds = range(c, d);
            let clamped = it.clamped(&bounds);
            prop_assert!(bounds.contains_range(&clamped));
            prop_assert!(clamped.location() <= clamped.end_location());
        }
    }
}
