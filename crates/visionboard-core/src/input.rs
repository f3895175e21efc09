//! Platform-neutral pointer, wheel and key events.
//!
//! The rendering shell converts its native events into these, in canvas
//! coordinates, before handing them to the interaction controller.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// Wheel input. `delta.y` is measured in notches, positive when scrolling down.
    Scroll {
        position: Point,
        delta: Vec2,
    },
    /// The pointer left the canvas surface.
    Leave,
}

impl PointerEvent {
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Scroll { position, .. } => Some(*position),
            PointerEvent::Leave => None,
        }
    }
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    /// A printable character, lowercased.
    Character(String),
    /// Anything else, by its platform name.
    Other(String),
}

impl Key {
    /// Map a DOM-style key name (`"Delete"`, `"Escape"`, `"z"`).
    pub fn from_name(name: &str) -> Self {
        match name {
            "Delete" => Key::Delete,
            "Backspace" => Key::Backspace,
            "Escape" | "Esc" => Key::Escape,
            other if other.chars().count() == 1 => Key::Character(other.to_lowercase()),
            other => Key::Other(other.to_string()),
        }
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_name() {
        assert_eq!(Key::from_name("Delete"), Key::Delete);
        assert_eq!(Key::from_name("Esc"), Key::Escape);
        assert_eq!(Key::from_name("Z"), Key::Character("z".into()));
        assert_eq!(Key::from_name("ArrowLeft"), Key::Other("ArrowLeft".into()));
    }

    #[test]
    fn test_pointer_position() {
        let event = PointerEvent::Move {
            position: Point::new(3.0, 4.0),
        };
        assert_eq!(event.position(), Some(Point::new(3.0, 4.0)));
        assert_eq!(PointerEvent::Leave.position(), None);
    }

    #[test]
    fn test_command_modifier() {
        let mods = Modifiers {
            meta: true,
            ..Modifiers::default()
        };
        assert!(mods.command());
        assert!(!Modifiers::default().command());
    }
}
