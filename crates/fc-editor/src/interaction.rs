//! Pointer gesture state.
//!
//! Exactly one gesture is active at a time. Each variant carries only the
//! scratch data its gesture needs, so combinations such as "dragging while
//! panning" cannot be expressed.
//!
//! | Gesture | Started by | Points stored in |
//! |---------|------------|------------------|
//! | `DraggingNode` | node-body press | screen space (delta / scale per move) |
//! | `ResizingNode` | resize-grip press | screen space, from gesture start |
//! | `Panning` | empty-canvas press | screen space |
//! | `BoxSelecting` | empty-canvas press + modifier | canvas space |
//! | `Connecting` | connect-grip press | canvas space |

use fc_core::geometry::{Point, Rect, Side};
use fc_core::id::NodeId;
use fc_core::model::{MIN_NODE_HEIGHT, MIN_NODE_WIDTH};
use fc_render::hit::ResizeHandle;
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    DraggingNode {
        /// Nodes moved together; the pressed node first.
        nodes: SmallVec<[NodeId; 4]>,
        /// Pointer position of the previous move, rebased every move.
        last: Point,
        /// Viewport scale when the drag started.
        scale: f32,
    },
    ResizingNode {
        node: NodeId,
        handle: ResizeHandle,
        /// Pointer position at press.
        origin: Point,
        /// Node bounds at press.
        start: Rect,
        /// Viewport scale when the resize started.
        scale: f32,
    },
    Panning {
        last: Point,
    },
    BoxSelecting {
        start: Point,
        current: Point,
    },
    Connecting {
        from: NodeId,
        side: Side,
        /// Live pointer position for the preview curve.
        pointer: Point,
        /// Node under the pointer, highlighted as a drop candidate.
        hover: Option<NodeId>,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::DraggingNode { .. } => "dragging-node",
            InteractionState::ResizingNode { .. } => "resizing-node",
            InteractionState::Panning { .. } => "panning",
            InteractionState::BoxSelecting { .. } => "box-selecting",
            InteractionState::Connecting { .. } => "connecting",
        }
    }

    /// Current rubber-band rectangle, normalized for any drag direction.
    pub fn selection_box(&self) -> Option<Rect> {
        match self {
            InteractionState::BoxSelecting { start, current } => {
                Some(Rect::from_corners(*start, *current))
            }
            _ => None,
        }
    }
}

/// Whether a finished box selection was really just a click: the pointer
/// was released exactly where it was pressed.
pub fn is_click(start: Point, end: Point) -> bool {
    start == end
}

/// Canvas delta for a screen-space pointer movement at `scale`.
pub fn drag_delta(last: Point, current: Point, scale: f32) -> Point {
    (current - last) / scale
}

/// Bounds after dragging `handle` by a canvas-space `delta` from `start`.
///
/// Each moving edge is clamped so the node keeps its minimum size; the
/// opposite edge never moves.
pub fn resize_rect(start: Rect, handle: ResizeHandle, delta: Point) -> Rect {
    let mut left = start.x;
    let mut right = start.right();
    let mut top = start.y;
    let mut bottom = start.bottom();

    if handle.moves_left() {
        left = (start.x + delta.x).min(right - MIN_NODE_WIDTH);
    }
    if handle.moves_right() {
        right = (start.right() + delta.x).max(left + MIN_NODE_WIDTH);
    }
    if handle.moves_top() {
        top = (start.y + delta.y).min(bottom - MIN_NODE_HEIGHT);
    }
    if handle.moves_bottom() {
        bottom = (start.bottom() + delta.y).max(top + MIN_NODE_HEIGHT);
    }

    Rect::new(left, top, right - left, bottom - top)
}
