//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and pen events into a unified `InputEvent`
//! consumed by the editor engine. Pointer coordinates are screen-space.

use fc_render::hit::PressTarget;
use serde::{Deserialize, Serialize};

/// Keyboard modifiers held during an event.
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

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// Platform "command" key: ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Which pointer button changed state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` index.
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            _ => PointerButton::Primary,
        }
    }
}

/// A normalized input event from any pointing device or keyboard.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed. `target` lets a host that already knows what was
    /// pressed (e.g. a text editor inside a node) say so; `None` means the
    /// engine resolves the target geometrically.
    PointerDown {
        x: f32,
        y: f32,
        button: PointerButton,
        modifiers: Modifiers,
        target: Option<PressTarget>,
    },

    PointerMove {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    PointerUp {
        x: f32,
        y: f32,
        button: PointerButton,
        modifiers: Modifiers,
    },

    DoubleClick {
        x: f32,
        y: f32,
    },

    /// Wheel notch; only the sign of `delta_y` matters.
    Wheel {
        delta_y: f32,
    },

    Key {
        key: String,
        modifiers: Modifiers,
    },
}

impl InputEvent {
    /// A primary-button press resolved by the engine.
    pub fn pointer_down(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
            modifiers,
            target: None,
        }
    }

    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp {
            x,
            y,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_buttons() {
        assert_eq!(PointerButton::from_dom(0), PointerButton::Primary);
        assert_eq!(PointerButton::from_dom(1), PointerButton::Middle);
        assert_eq!(PointerButton::from_dom(2), PointerButton::Secondary);
    }
}
