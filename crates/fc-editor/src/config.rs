//! Editor configuration.

use fc_core::viewport::PAN_SENSITIVITY;
use fc_render::hit::{DEFAULT_CONNECT_TOLERANCE, DEFAULT_HANDLE_RADIUS};
use serde::{Deserialize, Serialize};

/// Modifier that turns an empty-canvas press into a box selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxSelectModifier {
    Shift,
    Alt,
    /// Ctrl or ⌘.
    Command,
}

/// Tunables for [`EditorEngine`](crate::engine::EditorEngine).
///
/// Every field has a default; hosts typically deserialize a partial JSON
/// object and let the rest fall back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Offset change per screen pixel while panning. Default: **0.7**.
    pub pan_sensitivity: f32,
    /// Margin around a node's bbox that still accepts a dropped connection.
    /// Default: **30**.
    pub connect_tolerance: f32,
    /// Screen-pixel radius of resize and connect grips. Default: **8**.
    pub handle_radius: f32,
    /// Maximum undo depth. Default: **200**.
    pub history_depth: usize,
    /// Disables every gesture that would change the document. Default: **false**.
    pub read_only: bool,
    /// Default: **Shift**.
    pub box_select_modifier: BoxSelectModifier,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            pan_sensitivity: PAN_SENSITIVITY,
            connect_tolerance: DEFAULT_CONNECT_TOLERANCE,
            handle_radius: DEFAULT_HANDLE_RADIUS,
            history_depth: 200,
            read_only: false,
            box_select_modifier: BoxSelectModifier::Shift,
        }
    }
}

impl EditorConfig {
    pub(crate) fn wants_box_select(&self, modifiers: &crate::input::Modifiers) -> bool {
        match self.box_select_modifier {
            BoxSelectModifier::Shift => modifiers.shift,
            BoxSelectModifier::Alt => modifiers.alt,
            BoxSelectModifier::Command => modifiers.command(),
        }
    }
}
