// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::fmt::Debug;

use crate::{DocRange, Location, SelectionSet, ViewportLayoutReport};

/// Hooks a [`crate::TextView`] calls into. Every method has a default, so implementers
/// only write the ones they care about.
pub trait TextViewDelegate: Debug {
    /// Return `false` to refuse an edit. Defaults to `true`.
    fn should_change_text(&mut self, _range: DocRange, _replacement: &str) -> bool { true }

    fn will_change_text(&mut self) {}

    fn did_change_text(&mut self) {}

    /// Called once per change of the whole selection set.
    fn did_change_selection(&mut self, _selections: &SelectionSet) {}

    fn did_layout_viewport(&mut self, _report: &ViewportLayoutReport) {}

    /// Return `true` if the click was handled. Defaults to `false`, which lets the click
    /// place the caret as usual.
    fn clicked_on_link(&mut self, _link: &str, _location: Location) -> bool { false }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDelegate;

impl TextViewDelegate for NoopDelegate {}
