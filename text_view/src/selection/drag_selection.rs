// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{DocumentModel, Granularity, Point, SelectionModifiers, SelectionNavigation,
            TextSelection};

/// A mouse drag in progress.
///
/// The selections at mouse down are captured once and every drag event extends from
/// them, so dragging back over the starting point shrinks the selection again. Dropped
/// on mouse up.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSelection {
    anchors: Vec<TextSelection>,
    granularity: Granularity,
    modifiers: SelectionModifiers,
}

impl DragSelection {
    #[must_use]
    pub fn begin(
        anchors: Vec<TextSelection>,
        granularity: Granularity,
        modifiers: SelectionModifiers,
    ) -> Self {
        Self {
            anchors,
            granularity,
            modifiers,
        }
    }

    #[must_use]
    pub fn anchors(&self) -> &[TextSelection] { &self.anchors }

    #[must_use]
    pub fn granularity(&self) -> Granularity { self.granularity }

    /// Selections for the pointer at `point`.
    pub fn selections_at<D: DocumentModel + ?Sized>(
        &self,
        navigation: &mut SelectionNavigation<'_, D>,
        point: Point,
    ) -> Vec<TextSelection> {
        navigation.text_selections_interacting_at(
            point,
            None,
            &self.anchors,
            self.modifiers,
            true,
            self.granularity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Affinity, LayoutConfig, LayoutFragmentStore, MonospaceShaper,
                ResolverOptions, TextContentStorage};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_drag_extends_from_captured_anchor() {
        let doc = TextContentStorage::from_plain("Hello world again");
        let mut store = LayoutFragmentStore::new(Box::new(MonospaceShaper), LayoutConfig::default());
        store.rebuild(&doc);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());

        let down = navigation
            .text_selection_for(Granularity::Word, doc.location_from_start(7).unwrap())
            .unwrap();
        let drag = DragSelection::begin(vec![down], Granularity::Word, SelectionModifiers::default());

        // Over "again".
        let forward = drag.selections_at(&mut navigation, Point::new(72.0, 5.0));
        assert_eq!(doc.char_range(forward[0].range()), (6, 11));

        // Back over "Hello", the anchor word stays selected.
        let backward = drag.selections_at(&mut navigation, Point::new(2.0, 5.0));
        assert_eq!(doc.char_range(backward[0].range()), (0, 11));

        // Back to the start word only.
        let same = drag.selections_at(&mut navigation, Point::new(36.0, 5.0));
        assert_eq!(doc.char_range(same[0].range()), (6, 5));
        assert_eq!(drag.anchors().len(), 1);
    }

    #[test]
    fn test_character_drag() {
        let doc = TextContentStorage::from_plain("0123456789");
        let mut store = LayoutFragmentStore::new(Box::new(MonospaceShaper), LayoutConfig::default());
        store.rebuild(&doc);
        let mut navigation = SelectionNavigation::new(&mut store, &doc, ResolverOptions::default());
        let anchor = TextSelection::insertion_point(
            doc.location_from_start(4).unwrap(),
            Affinity::Downstream,
        );
        let drag = DragSelection::begin(vec![anchor], Granularity::Character, SelectionModifiers::default());

        let right = drag.selections_at(&mut navigation, Point::new(40.0, 5.0));
        assert_eq!(doc.char_range(right[0].range()), (4, 4));
        let left = drag.selections_at(&mut navigation, Point::new(10.0, 5.0));
        assert_eq!(doc.char_range(left[0].range()), (2, 2));
    }
}
