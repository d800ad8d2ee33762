// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::VecDeque,
          fmt::{Debug, Formatter}};

use strum_macros::Display;

use crate::{TextViewError, call_if_true};

pub const DEBUG_UNDO: bool = false;

/// Reverts one change on `Target`. The action receives the manager so it can register
/// its own inverse, which lands on the redo stack while undoing and on the undo stack
/// while redoing.
pub type UndoAction<Target> = Box<dyn FnOnce(&mut Target, &mut UndoManager<Target>)>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum UndoState {
    #[default]
    Idle,
    Undoing,
    Redoing,
}

struct UndoGroup<Target> {
    actions: Vec<UndoAction<Target>>,
    action_name: Option<String>,
}

impl<Target> UndoGroup<Target> {
    fn new() -> Self {
        Self {
            actions: vec![],
            action_name: None,
        }
    }
}

/// # Undo/Redo Algorithm
///
/// Actions are collected into groups. One call to [`UndoManager::undo`] reverts one
/// group.
///
/// ## Registering (register_undo)
///
/// 1. Nothing happens while registration is disabled.
/// 2. If a group is open (between [`UndoManager::begin_undo_grouping`] and
///    [`UndoManager::end_undo_grouping`]) the action joins it.
/// 3. Otherwise the action becomes a group of its own and is committed right away.
///
/// ## Committing a group
///
/// - While undoing, the group goes on the redo stack.
/// - While redoing, it goes on the undo stack.
/// - Otherwise it goes on the undo stack and the redo stack is cleared, since a new
///   change invalidates whatever could have been redone.
///
/// When the undo stack grows past `levels_of_undo` the oldest group is dropped.
///
/// ## Undoing (undo)
///
/// 1. An open group is closed first.
/// 2. The newest group is popped and its actions run in reverse registration order,
///    inside a fresh group, so the inverses they register become a single redo group.
///
/// ## Notes
///
/// Grouping is not reentrant. A second `begin_undo_grouping` without an `end`, or an
/// `end` without a `begin`, is logged and ignored.
pub struct UndoManager<Target> {
    undo_stack: VecDeque<UndoGroup<Target>>,
    redo_stack: Vec<UndoGroup<Target>>,
    open_group: Option<UndoGroup<Target>>,
    state: UndoState,
    /// `0` means unlimited.
    levels_of_undo: usize,
    registration_disabled_count: usize,
}

impl<Target> Debug for UndoManager<Target> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoManager")
            .field("undo_groups", &self.undo_stack.len())
            .field("redo_groups", &self.redo_stack.len())
            .field("is_grouping", &self.open_group.is_some())
            .field("state", &self.state)
            .field("levels_of_undo", &self.levels_of_undo)
            .finish()
    }
}

impl<Target> Default for UndoManager<Target> {
    fn default() -> Self { Self::new(0) }
}

impl<Target> UndoManager<Target> {
    #[must_use]
    pub fn new(levels_of_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: vec![],
            open_group: None,
            state: UndoState::Idle,
            levels_of_undo,
            registration_disabled_count: 0,
        }
    }

    #[must_use]
    pub fn levels_of_undo(&self) -> usize { self.levels_of_undo }

    pub fn set_levels_of_undo(&mut self, levels_of_undo: usize) {
        self.levels_of_undo = levels_of_undo;
        self.trim_to_levels();
    }

    #[must_use]
    pub fn state(&self) -> UndoState { self.state }

    #[must_use]
    pub fn is_undoing(&self) -> bool { self.state == UndoState::Undoing }

    #[must_use]
    pub fn is_redoing(&self) -> bool { self.state == UndoState::Redoing }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
            || self.open_group.as_ref().is_some_and(|it| !it.actions.is_empty())
    }

    #[must_use]
    pub fn can_redo(&self) -> bool { !self.redo_stack.is_empty() }

    #[must_use]
    pub fn undo_count(&self) -> usize { self.undo_stack.len() }

    #[must_use]
    pub fn is_undo_registration_enabled(&self) -> bool { self.registration_disabled_count == 0 }

    /// Calls nest. Each one needs a matching [`Self::enable_undo_registration`].
    pub fn disable_undo_registration(&mut self) { self.registration_disabled_count += 1; }

    pub fn enable_undo_registration(&mut self) {
        self.registration_disabled_count = self.registration_disabled_count.saturating_sub(1);
    }

    #[must_use]
    pub fn is_grouping(&self) -> bool { self.open_group.is_some() }

    pub fn begin_undo_grouping(&mut self) {
        if self.open_group.is_some() {
            warn_invalid_state("begin_undo_grouping called while a group is already open");
            return;
        }
        self.open_group = Some(UndoGroup::new());
    }

    pub fn end_undo_grouping(&mut self) {
        let Some(group) = self.open_group.take() else {
            warn_invalid_state("end_undo_grouping called without begin_undo_grouping");
            return;
        };
        self.commit(group);
    }

    pub fn register_undo(&mut self, action: UndoAction<Target>) {
        if !self.is_undo_registration_enabled() {
            return;
        }
        match self.open_group.as_mut() {
            Some(group) => group.actions.push(action),
            None => {
                let mut group = UndoGroup::new();
                group.actions.push(action);
                self.commit(group);
            }
        }
    }

    /// Names the open group, or else the group that was committed last.
    pub fn set_action_name(&mut self, name: impl Into<String>) {
        let name = Some(name.into());
        if let Some(group) = self.open_group.as_mut() {
            group.action_name = name;
            return;
        }
        let last = match self.state {
            UndoState::Undoing => self.redo_stack.last_mut(),
            UndoState::Idle | UndoState::Redoing => self.undo_stack.back_mut(),
        };
        if let Some(group) = last {
            group.action_name = name;
        }
    }

    #[must_use]
    pub fn undo_action_name(&self) -> Option<&str> {
        self.undo_stack.back().and_then(|it| it.action_name.as_deref())
    }

    #[must_use]
    pub fn redo_action_name(&self) -> Option<&str> {
        self.redo_stack.last().and_then(|it| it.action_name.as_deref())
    }

    /// "Undo" followed by the action name, if there is one.
    #[must_use]
    pub fn undo_menu_title(&self) -> String { menu_title("Undo", self.undo_action_name()) }

    #[must_use]
    pub fn redo_menu_title(&self) -> String { menu_title("Redo", self.redo_action_name()) }

    /// Reverts the newest group. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self, target: &mut Target) -> bool {
        if self.open_group.is_some() {
            self.end_undo_grouping();
        }
        let Some(group) = self.undo_stack.pop_back() else {
            return false;
        };
        call_if_true!(DEBUG_UNDO, {
            tracing::debug!(
                message = "↩️ undo",
                actions = group.actions.len(),
                name = ?group.action_name
            );
        });
        self.replay(group, target, UndoState::Undoing);
        true
    }

    /// Re-applies the newest undone group. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self, target: &mut Target) -> bool {
        if self.open_group.is_some() {
            self.end_undo_grouping();
        }
        let Some(group) = self.redo_stack.pop() else {
            return false;
        };
        call_if_true!(DEBUG_UNDO, {
            tracing::debug!(
                message = "↪️ redo",
                actions = group.actions.len(),
                name = ?group.action_name
            );
        });
        self.replay(group, target, UndoState::Redoing);
        true
    }

    pub fn remove_all_actions(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_group = None;
    }

    pub fn remove_redo_actions(&mut self) { self.redo_stack.clear(); }
}

mod impl_stacks {
    use super::*;

    impl<Target> UndoManager<Target> {
        pub(super) fn commit(&mut self, group: UndoGroup<Target>) {
            if group.actions.is_empty() {
                return;
            }
            match self.state {
                UndoState::Undoing => self.redo_stack.push(group),
                UndoState::Redoing => {
                    self.undo_stack.push_back(group);
                    self.trim_to_levels();
                }
                UndoState::Idle => {
                    self.undo_stack.push_back(group);
                    self.redo_stack.clear();
                    self.trim_to_levels();
                }
            }
        }

        pub(super) fn replay(
            &mut self,
            group: UndoGroup<Target>,
            target: &mut Target,
            state: UndoState,
        ) {
            let UndoGroup {
                actions,
                action_name,
            } = group;

            self.state = state;
            self.open_group = Some(UndoGroup {
                actions: vec![],
                action_name,
            });
            for action in actions.into_iter().rev() {
                action(target, self);
            }
            if let Some(inverse) = self.open_group.take() {
                self.commit(inverse);
            }
            self.state = UndoState::Idle;
        }

        pub(super) fn trim_to_levels(&mut self) {
            if self.levels_of_undo == 0 {
                return;
            }
            while self.undo_stack.len() > self.levels_of_undo {
                self.undo_stack.pop_front();
            }
        }
    }
}

fn menu_title(verb: &str, action_name: Option<&str>) -> String {
    match action_name {
        Some(name) if !name.is_empty() => format!("{verb} {name}"),
        _ => verb.to_string(),
    }
}

fn warn_invalid_state(reason: &str) {
    let error = TextViewError::InvalidUndoState {
        reason: reason.to_string(),
    };
    tracing::warn!(message = "↩️ Ignoring unbalanced undo grouping", error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn push_action(value: u8) -> UndoAction<Vec<u8>> {
        Box::new(move |doc: &mut Vec<u8>, manager: &mut UndoManager<Vec<u8>>| {
            doc.push(value);
            manager.register_undo(pop_action());
        })
    }

    fn pop_action() -> UndoAction<Vec<u8>> {
        Box::new(|doc: &mut Vec<u8>, manager: &mut UndoManager<Vec<u8>>| {
            if let Some(value) = doc.pop() {
                manager.register_undo(push_action(value));
            }
        })
    }

    fn push(manager: &mut UndoManager<Vec<u8>>, doc: &mut Vec<u8>, value: u8) {
        doc.push(value);
        manager.register_undo(pop_action());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut manager = UndoManager::default();
        let mut doc = vec![];
        push(&mut manager, &mut doc, 1);
        push(&mut manager, &mut doc, 2);

        assert!(manager.undo(&mut doc));
        assert_eq!(doc, vec![1]);
        assert!(manager.undo(&mut doc));
        assert_eq!(doc, Vec::<u8>::new());
        assert!(!manager.undo(&mut doc));
        assert!(manager.can_redo());

        assert!(manager.redo(&mut doc));
        assert!(manager.redo(&mut doc));
        assert_eq!(doc, vec![1, 2]);
        assert!(!manager.can_redo());
        assert_eq!(manager.state(), UndoState::Idle);
    }

    #[test]
    fn test_new_change_clears_redo() {
        let mut manager = UndoManager::default();
        let mut doc = vec![];
        push(&mut manager, &mut doc, 1);
        manager.undo(&mut doc);
        assert!(manager.can_redo());
        push(&mut manager, &mut doc, 7);
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_group_undoes_in_one_step() {
        let mut manager = UndoManager::default();
        let mut doc = vec![];
        manager.begin_undo_grouping();
        push(&mut manager, &mut doc, 1);
        push(&mut manager, &mut doc, 2);
        manager.end_undo_grouping();
        push(&mut manager, &mut doc, 3);

        manager.undo(&mut doc);
        manager.undo(&mut doc);
        assert_eq!(doc, Vec::<u8>::new());

        manager.redo(&mut doc);
        assert_eq!(doc, vec![1, 2]);
    }

    #[test]
    fn test_unbalanced_grouping_is_ignored() {
        let mut manager = UndoManager::default();
        let mut doc = vec![];
        manager.end_undo_grouping();
        manager.begin_undo_grouping();
        manager.begin_undo_grouping();
        push(&mut manager, &mut doc, 1);
        manager.end_undo_grouping();
        manager.end_undo_grouping();
        assert_eq!(manager.undo_count(), 1);
        assert!(!manager.is_grouping());
    }

    #[test]
    fn test_undo_closes_open_group() {
        let mut manager = UndoManager::default();
        let mut doc = vec![];
        manager.begin_undo_grouping();
        push(&mut manager, &mut doc, 1);
        assert!(manager.can_undo());
        manager.undo(&mut doc);
        assert_eq!(doc, Vec::<u8>::new());
    }

    #[test]
    fn test_levels_of_undo_drops_oldest() {
        let mut manager = UndoManager::new(2);
        let mut doc = vec![];
        for value in 1..=4 {
            push(&mut manager, &mut doc, value);
        }
        assert_eq!(manager.undo_count(), 2);
        while manager.undo(&mut doc) {}
        assert_eq!(doc, vec![1, 2]);
    }

    #[test]
    fn test_disabled_registration() {
        let mut manager = UndoManager::default();
        let mut doc = vec![];
        manager.disable_undo_registration();
        manager.disable_undo_registration();
        push(&mut manager, &mut doc, 1);
        manager.enable_undo_registration();
        push(&mut manager, &mut doc, 2);
        manager.enable_undo_registration();
        push(&mut manager, &mut doc, 3);
        assert_eq!(manager.undo_count(), 1);
    }

    #[test]
    fn test_menu_titles() {
        let mut manager = UndoManager::default();
        let mut doc = vec![];
        assert_eq!(manager.undo_menu_title(), "Undo");
        push(&mut manager, &mut doc, 1);
        manager.set_action_name("Typing");
        assert_eq!(manager.undo_menu_title(), "Undo Typing");
        manager.undo(&mut doc);
        assert_eq!(manager.redo_menu_title(), "Redo Typing");
        assert_eq!(manager.undo_menu_title(), "Undo");
    }

    #[test]
    fn test_remove_all_actions() {
        let mut manager = UndoManager::default();
        let mut doc = vec![];
        push(&mut manager, &mut doc, 1);
        push(&mut manager, &mut doc, 2);
        manager.undo(&mut doc);
        manager.remove_all_actions();
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
    }
}
