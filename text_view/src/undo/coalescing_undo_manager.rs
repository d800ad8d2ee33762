// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Typing coalescing on top of [`UndoManager`].
//!
//! ```text
//!            typing edit                      contiguous typing edit
//!   idle ───────────────────▶ coalescing ◀─────────────────────────┐
//!    ▲                          │  │  └──────────────────────────────┘
//!    │     undo (direct call)   │  │ break: non typing edit, gap, selection
//!    └──────────────────────────┘  │        change, explicit request
//!    ▲                             ▼
//!    └──────────────────── committed to the undo stack as one group
//! ```
//!
//! While coalescing nothing is on the real undo stack for the pending edit.
//! [`CoalescingUndoManager::undo`] calls the pending action directly instead of
//! popping the stack, which keeps the stack order intact. The consequence is that a
//! pending edit undone this way can't be redone.

use std::fmt::{Debug, Formatter};

use crate::{UndoAction, UndoManager};

pub const TYPING_ACTION_NAME: &str = "Typing";

/// Reverts a coalesced edit described by the pending value `T`.
pub type CoalescingAction<Target, T> = Box<dyn FnOnce(&mut Target, &mut UndoManager<Target>, T)>;

pub struct CoalescingState<Target, T> {
    pub pending_value: T,
    pending_action: CoalescingAction<Target, T>,
}

impl<Target, T: Debug> Debug for CoalescingState<Target, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingState")
            .field("pending_value", &self.pending_value)
            .finish_non_exhaustive()
    }
}

pub struct CoalescingUndoManager<Target, T> {
    manager: UndoManager<Target>,
    coalescing: Option<CoalescingState<Target, T>>,
    is_coalescing_undo: bool,
}

impl<Target, T: Debug> Debug for CoalescingUndoManager<Target, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingUndoManager")
            .field("manager", &self.manager)
            .field("coalescing", &self.coalescing)
            .finish()
    }
}

impl<Target: 'static, T: 'static> Default for CoalescingUndoManager<Target, T> {
    fn default() -> Self { Self::new(0) }
}

impl<Target: 'static, T: 'static> CoalescingUndoManager<Target, T> {
    #[must_use]
    pub fn new(levels_of_undo: usize) -> Self {
        Self {
            manager: UndoManager::new(levels_of_undo),
            coalescing: None,
            is_coalescing_undo: false,
        }
    }

    #[must_use]
    pub fn manager(&self) -> &UndoManager<Target> { &self.manager }

    pub fn manager_mut(&mut self) -> &mut UndoManager<Target> { &mut self.manager }

    #[must_use]
    pub fn is_coalescing(&self) -> bool { self.coalescing.is_some() }

    #[must_use]
    pub fn pending_value(&self) -> Option<&T> { self.coalescing.as_ref().map(|it| &it.pending_value) }

    /// Starts coalescing with `value`, committing any pending edit first.
    pub fn register_coalescing_undo(&mut self, value: T, action: CoalescingAction<Target, T>) {
        if !self.manager.is_undo_registration_enabled() {
            return;
        }
        self.break_undo_coalescing();
        self.manager.remove_redo_actions();
        self.coalescing = Some(CoalescingState {
            pending_value: value,
            pending_action: action,
        });
    }

    /// Replaces the pending value. Does nothing when not coalescing.
    pub fn coalesce(&mut self, value: T) {
        if !self.manager.is_undo_registration_enabled() {
            return;
        }
        if let Some(state) = self.coalescing.as_mut() {
            state.pending_value = value;
        }
    }

    /// Commits the pending edit to the undo stack as one "Typing" group.
    pub fn break_undo_coalescing(&mut self) {
        let Some(CoalescingState {
            pending_value,
            pending_action,
        }) = self.coalescing.take()
        else {
            return;
        };
        let action: UndoAction<Target> =
            Box::new(move |target: &mut Target, manager: &mut UndoManager<Target>| {
                pending_action(target, manager, pending_value);
            });
        self.manager.register_undo(action);
        self.manager.set_action_name(TYPING_ACTION_NAME);
    }

    pub fn register_undo(&mut self, action: UndoAction<Target>) {
        self.manager.register_undo(action);
    }

    #[must_use]
    pub fn can_undo(&self) -> bool { self.manager.can_undo() || self.is_coalescing() }

    #[must_use]
    pub fn can_redo(&self) -> bool { self.manager.can_redo() }

    #[must_use]
    pub fn is_undoing(&self) -> bool { self.manager.is_undoing() || self.is_coalescing_undo }

    #[must_use]
    pub fn is_redoing(&self) -> bool { self.manager.is_redoing() }

    /// Reverts the pending edit if there is one, bypassing the undo stack. Otherwise
    /// reverts the newest group on the stack.
    pub fn undo(&mut self, target: &mut Target) -> bool {
        let Some(CoalescingState {
            pending_value,
            pending_action,
        }) = self.coalescing.take()
        else {
            return self.manager.undo(target);
        };
        self.is_coalescing_undo = true;
        self.manager.disable_undo_registration();
        pending_action(target, &mut self.manager, pending_value);
        self.manager.enable_undo_registration();
        self.is_coalescing_undo = false;
        true
    }

    /// Replays the real redo stack only.
    pub fn redo(&mut self, target: &mut Target) -> bool { self.manager.redo(target) }

    #[must_use]
    pub fn undo_menu_title(&self) -> String {
        if self.is_coalescing() {
            format!("Undo {TYPING_ACTION_NAME}")
        } else {
            self.manager.undo_menu_title()
        }
    }

    #[must_use]
    pub fn redo_menu_title(&self) -> String { self.manager.redo_menu_title() }

    pub fn remove_all_actions(&mut self) {
        self.coalescing = None;
        self.manager.remove_all_actions();
    }
}
