//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives
//! in Rust so it is shared by every host (WASM, native).

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    /// Delete every selected node and edge.
    Delete,
    SelectAll,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ZoomToFit,

    // ── Gesture ──
    /// Cancel the active gesture, or clear the selection when idle.
    Cancel,
}

impl ShortcutAction {
    pub fn name(self) -> &'static str {
        match self {
            ShortcutAction::Undo => "undo",
            ShortcutAction::Redo => "redo",
            ShortcutAction::Delete => "delete",
            ShortcutAction::SelectAll => "selectAll",
            ShortcutAction::ZoomIn => "zoomIn",
            ShortcutAction::ZoomOut => "zoomOut",
            ShortcutAction::ResetZoom => "resetZoom",
            ShortcutAction::ZoomToFit => "zoomToFit",
            ShortcutAction::Cancel => "cancel",
        }
    }
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: &Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetZoom),
                _ => None,
            };
        }

        if modifiers.shift {
            return match key {
                // Shift+1 arrives as "!" on US layouts.
                "1" | "!" => Some(ShortcutAction::ZoomToFit),
                _ => None,
            };
        }

        // ── Single keys (no modifiers) ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}
