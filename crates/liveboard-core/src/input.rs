//! Keyboard input and the global shortcut table.

use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A pressed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Character(char),
    Enter,
    Escape,
    Backspace,
    Delete,
}

/// A key press with the modifiers held at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// An unmodified key press.
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// An unmodified printable character.
    pub fn char(c: char) -> Self {
        Self::plain(Key::Character(c))
    }
}

/// Actions the global keyboard surface can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    DeleteSelection,
    Undo,
    Redo,
    Copy,
    Cut,
    Paste,
    OpenChat,
    CloseChat,
    OpenReactions,
}

/// Map a key press to a global command.
pub fn command_for(event: &KeyEvent) -> Option<Command> {
    let m = event.modifiers;
    match &event.key {
        Key::Delete | Key::Backspace => Some(Command::DeleteSelection),
        Key::Escape => Some(Command::CloseChat),
        Key::Character(c) if m.command() => match c.to_ascii_lowercase() {
            'z' if m.shift => Some(Command::Redo),
            'z' => Some(Command::Undo),
            'y' => Some(Command::Redo),
            'c' => Some(Command::Copy),
            'x' => Some(Command::Cut),
            'v' => Some(Command::Paste),
            _ => None,
        },
        Key::Character('/') => Some(Command::OpenChat),
        Key::Character('e') if !m.alt => Some(Command::OpenReactions),
        _ => None,
    }
}
