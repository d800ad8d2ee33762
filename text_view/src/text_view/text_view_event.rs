// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::{Direction, Granularity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Key {
    Character(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Escape,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub control: bool,
    pub command: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        alt: false,
        control: false,
        command: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub const COMMAND: Self = Self {
        command: true,
        ..Self::NONE
    };

    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// A key press. `characters` is what the key produces, which decides whether an edit
/// it causes counts as typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub characters: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub fn character(ch: char) -> Self {
        Self {
            key: Key::Character(ch),
            characters: ch.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    #[must_use]
    pub fn special(key: Key) -> Self {
        let characters = match key {
            Key::Character(ch) => ch.to_string(),
            Key::Enter => "\r".to_string(),
            Key::Tab => "\t".to_string(),
            Key::Backspace => "\u{7f}".to_string(),
            Key::Escape => "\u{1b}".to_string(),
            _ => String::new(),
        };
        Self {
            key,
            characters,
            modifiers: Modifiers::NONE,
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Operations a [`crate::TextView`] performs in response to input.
///
/// Converting from a [`KeyEvent`] makes it easy to write key handlers that turn input
/// into edits and selection changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TextViewEvent {
    InsertText(String),
    InsertNewline,
    InsertTab,
    DeleteBackward,
    DeleteForward,
    DeleteWordBackward,
    DeleteWordForward,
    Move {
        direction: Direction,
        granularity: Granularity,
        extending: bool,
    },
    PageUp { extending: bool },
    PageDown { extending: bool },
    SelectAll,
    Undo,
    Redo,
    Complete,
    CancelOperation,
}

impl TryFrom<&KeyEvent> for TextViewEvent {
    type Error = String;

    fn try_from(event: &KeyEvent) -> Result<Self, Self::Error> {
        let Modifiers {
            shift,
            alt,
            control,
            command,
        } = event.modifiers;
        let move_by = |direction: Direction, granularity: Granularity| TextViewEvent::Move {
            direction,
            granularity,
            extending: shift,
        };

        match event.key {
            Key::Character('a') if command => Ok(Self::SelectAll),
            Key::Character('z') if command && shift => Ok(Self::Redo),
            Key::Character('z') if command => Ok(Self::Undo),
            Key::Character(' ') if control => Ok(Self::Complete),
            Key::Character(_) if command || control => {
                Err(format!("Unbound key event: {event:?}"))
            }
            Key::Character(_) => Ok(Self::InsertText(event.characters.clone())),
            Key::Enter => Ok(Self::InsertNewline),
            Key::Tab => Ok(Self::InsertTab),
            Key::Backspace if alt => Ok(Self::DeleteWordBackward),
            Key::Backspace => Ok(Self::DeleteBackward),
            Key::Delete if alt => Ok(Self::DeleteWordForward),
            Key::Delete => Ok(Self::DeleteForward),
            Key::Left if command => Ok(move_by(Direction::Left, Granularity::Line)),
            Key::Left if alt => Ok(move_by(Direction::Left, Granularity::Word)),
            Key::Left => Ok(move_by(Direction::Left, Granularity::Character)),
            Key::Right if command => Ok(move_by(Direction::Right, Granularity::Line)),
            Key::Right if alt => Ok(move_by(Direction::Right, Granularity::Word)),
            Key::Right => Ok(move_by(Direction::Right, Granularity::Character)),
            Key::Up if command => Ok(move_by(Direction::Backward, Granularity::Document)),
            Key::Up if alt => Ok(move_by(Direction::Backward, Granularity::Paragraph)),
            Key::Up => Ok(move_by(Direction::Up, Granularity::Character)),
            Key::Down if command => Ok(move_by(Direction::Forward, Granularity::Document)),
            Key::Down if alt => Ok(move_by(Direction::Forward, Granularity::Paragraph)),
            Key::Down => Ok(move_by(Direction::Down, Granularity::Character)),
            Key::Home => Ok(move_by(Direction::Backward, Granularity::Document)),
            Key::End => Ok(move_by(Direction::Forward, Granularity::Document)),
            Key::PageUp => Ok(Self::PageUp { extending: shift }),
            Key::PageDown => Ok(Self::PageDown { extending: shift }),
            Key::Escape => Ok(Self::CancelOperation),
        }
    }
}
