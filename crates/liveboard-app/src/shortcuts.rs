//! Keyboard shortcut registry and documentation.

use liveboard_core::input::{Command, Key, KeyEvent, Modifiers, command_for};

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// The key event this shortcut stands for.
    pub fn key_event(&self) -> KeyEvent {
        let key = match self.key {
            "Delete" => Key::Delete,
            "Backspace" => Key::Backspace,
            "Escape" => Key::Escape,
            "Enter" => Key::Enter,
            other => Key::Character(other.chars().next().unwrap_or(' ').to_ascii_lowercase()),
        };
        KeyEvent::new(
            key,
            Modifiers {
                ctrl: self.ctrl,
                shift: self.shift,
                ..Modifiers::NONE
            },
        )
    }

    /// The command the core maps this shortcut to.
    pub fn command(&self) -> Option<Command> {
        command_for(&self.key_event())
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, "Undo"),
            Shortcut::new("Z", true, true, "Redo"),
            Shortcut::new("Y", true, false, "Redo"),
            Shortcut::new("C", true, false, "Copy shape"),
            Shortcut::new("X", true, false, "Cut shape"),
            Shortcut::new("V", true, false, "Paste shape"),
            Shortcut::new("Delete", false, false, "Delete selected shape"),
            Shortcut::new("Backspace", false, false, "Delete selected shape"),
            Shortcut::new("/", false, false, "Open cursor chat"),
            Shortcut::new("Escape", false, false, "Close chat"),
            Shortcut::new("E", false, false, "Open reaction picker"),
        ]
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}
