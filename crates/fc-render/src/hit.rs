//! Hit testing: point / box / edge lookups against a diagram document.
//!
//! All coordinates are canvas coordinates. Node tests are shape-agnostic
//! and use the raw bounding box. Overlaps are settled by document order:
//! searches that pick a *target* scan front-to-back and take the first
//! match, while pointer presses take the topmost (last painted) node.

use crate::path::{EdgeCurve, to_kurbo};
use fc_core::geometry::{Point, Rect, Side};
use fc_core::id::{EdgeId, NodeId};
use fc_core::model::{DiagramDocument, Edge, Node};
use fc_core::shape::{anchor, visual_bounds};
use kurbo::ParamCurveNearest;
use serde::{Deserialize, Serialize};

/// Extra margin around a node's bbox that still counts as dropping a
/// connection onto it.
pub const DEFAULT_CONNECT_TOLERANCE: f32 = 30.0;

/// Screen-pixel radius within which a handle counts as pressed.
pub const DEFAULT_HANDLE_RADIUS: f32 = 8.0;

/// Screen-pixel gap between a node side and its connect handle.
pub const CONNECT_HANDLE_GAP: f32 = 20.0;

/// Number of interior chord samples used by [`box_intersects_edge`].
const EDGE_CHORD_SAMPLES: usize = 9;

pub fn point_in_node(p: Point, node: &Node) -> bool {
    node.bounds().contains(p)
}

/// Side of `node` facing `p`. Horizontal wins only when strictly dominant,
/// so exact diagonals resolve to top/bottom.
pub fn nearest_side(node: &Node, p: Point) -> Side {
    let c = node.center();
    let dx = p.x - c.x;
    let dy = p.y - c.y;
    if dx.abs() > dy.abs() {
        if dx > 0.0 { Side::Right } else { Side::Left }
    } else if dy > 0.0 {
        Side::Bottom
    } else {
        Side::Top
    }
}

/// Where a connection dropped at some point would attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub node: NodeId,
    pub side: Side,
}

/// First node (document order, skipping `exclude`) whose bbox grown by
/// `tolerance` contains `p`. First match wins, not the closest.
pub fn connection_target(
    p: Point,
    exclude: Option<NodeId>,
    nodes: &[Node],
    tolerance: f32,
) -> Option<ConnectionTarget> {
    nodes
        .iter()
        .filter(|n| Some(n.id) != exclude)
        .find(|n| n.bounds().inflate(tolerance).contains(p))
        .map(|n| ConnectionTarget {
            node: n.id,
            side: nearest_side(n, p),
        })
}

/// Node to highlight while a connection is being dragged: first node other
/// than the source whose raw bbox contains `p`.
pub fn hover_target(p: Point, source: NodeId, nodes: &[Node]) -> Option<NodeId> {
    nodes
        .iter()
        .find(|n| n.id != source && point_in_node(p, n))
        .map(|n| n.id)
}

/// Topmost node under `p` (last in document order is painted last).
pub fn node_at(p: Point, nodes: &[Node]) -> Option<NodeId> {
    nodes
        .iter()
        .rev()
        .find(|n| point_in_node(p, n))
        .map(|n| n.id)
}

pub fn box_intersects_node(rect: &Rect, node: &Node) -> bool {
    visual_bounds(node).intersects(rect)
}

/// Whether the straight chord between an edge's anchors touches `rect`.
/// The rendered curve is not sampled; dangling edges never intersect.
pub fn box_intersects_edge(rect: &Rect, edge: &Edge, nodes: &[Node]) -> bool {
    let find = |id: NodeId| nodes.iter().find(|n| n.id == id);
    let (Some(from), Some(to)) = (find(edge.from_node), find(edge.to_node)) else {
        return false;
    };
    let a = anchor(from, edge.from_side);
    let b = anchor(to, edge.to_side);
    if rect.contains(a) || rect.contains(b) {
        return true;
    }
    (1..=EDGE_CHORD_SAMPLES)
        .map(|i| a.lerp(b, i as f32 / (EDGE_CHORD_SAMPLES + 1) as f32))
        .any(|p| rect.contains(p))
}

/// Nodes intersecting a selection box, in document order.
pub fn nodes_in_box(rect: &Rect, nodes: &[Node]) -> Vec<NodeId> {
    nodes
        .iter()
        .filter(|n| box_intersects_node(rect, n))
        .map(|n| n.id)
        .collect()
}

/// Edges intersecting a selection box, in document order.
pub fn edges_in_box(rect: &Rect, doc: &DiagramDocument) -> Vec<EdgeId> {
    doc.edges
        .iter()
        .filter(|e| box_intersects_edge(rect, e, &doc.nodes))
        .map(|e| e.id)
        .collect()
}

/// Topmost edge whose rendered curve passes within `tolerance` of `p`.
pub fn edge_at(p: Point, doc: &DiagramDocument, tolerance: f32) -> Option<EdgeId> {
    let target = to_kurbo(p);
    let max_sq = (tolerance as f64).powi(2);
    doc.edges.iter().rev().find_map(|edge| {
        let curve = EdgeCurve::for_edge(doc, edge)?;
        let nearest = curve.to_cubic().nearest(target, 1e-3);
        (nearest.distance_sq <= max_sq).then_some(edge.id)
    })
}

// ─── Handles ─────────────────────────────────────────────────────────────

/// One of the eight resize grips on a selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeHandle {
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    TopLeft,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::Top,
        ResizeHandle::TopRight,
        ResizeHandle::Right,
        ResizeHandle::BottomRight,
        ResizeHandle::Bottom,
        ResizeHandle::BottomLeft,
        ResizeHandle::Left,
        ResizeHandle::TopLeft,
    ];

    /// Grip position on `rect`.
    pub fn position(self, rect: &Rect) -> Point {
        let c = rect.center();
        match self {
            ResizeHandle::Top => Point::new(c.x, rect.y),
            ResizeHandle::TopRight => Point::new(rect.right(), rect.y),
            ResizeHandle::Right => Point::new(rect.right(), c.y),
            ResizeHandle::BottomRight => Point::new(rect.right(), rect.bottom()),
            ResizeHandle::Bottom => Point::new(c.x, rect.bottom()),
            ResizeHandle::BottomLeft => Point::new(rect.x, rect.bottom()),
            ResizeHandle::Left => Point::new(rect.x, c.y),
            ResizeHandle::TopLeft => Point::new(rect.x, rect.y),
        }
    }

    /// Whether dragging this grip moves the left / right / top / bottom edge.
    pub fn moves_left(self) -> bool {
        matches!(
            self,
            ResizeHandle::Left | ResizeHandle::TopLeft | ResizeHandle::BottomLeft
        )
    }

    pub fn moves_right(self) -> bool {
        matches!(
            self,
            ResizeHandle::Right | ResizeHandle::TopRight | ResizeHandle::BottomRight
        )
    }

    pub fn moves_top(self) -> bool {
        matches!(
            self,
            ResizeHandle::Top | ResizeHandle::TopLeft | ResizeHandle::TopRight
        )
    }

    pub fn moves_bottom(self) -> bool {
        matches!(
            self,
            ResizeHandle::Bottom | ResizeHandle::BottomLeft | ResizeHandle::BottomRight
        )
    }
}

/// Connect grip for `side` of `node`, floating just outside the side.
pub fn connect_handle_position(node: &Node, side: Side, scale: f32) -> Point {
    anchor(node, side) + side.outward_normal() * (CONNECT_HANDLE_GAP / scale)
}

/// What a pointer press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PressTarget {
    Canvas,
    NodeBody { node: NodeId },
    /// Text being edited inside a node; presses here belong to the text editor.
    NodeText { node: NodeId },
    ResizeHandle { node: NodeId, handle: ResizeHandle },
    ConnectHandle { node: NodeId, side: Side },
    Edge { edge: EdgeId },
}

/// Inputs for resolving a press geometrically.
#[derive(Debug, Clone, Copy)]
pub struct PressContext {
    /// Node showing resize grips, if any.
    pub selected: Option<NodeId>,
    pub scale: f32,
    pub handle_radius: f32,
    /// Read-only canvases expose no resize or connect grips.
    pub read_only: bool,
}

/// Resolve a canvas-space press. Grips take precedence over bodies, bodies
/// over edges, and anything over empty canvas.
pub fn press_target(p: Point, doc: &DiagramDocument, ctx: &PressContext) -> PressTarget {
    let radius = ctx.handle_radius / ctx.scale;
    let near = |q: Point| q.distance(p) <= radius;

    if !ctx.read_only {
        if let Some(node) = ctx.selected.and_then(|id| doc.node(id)) {
            let rect = node.bounds();
            if let Some(handle) = ResizeHandle::ALL
                .into_iter()
                .find(|h| near(h.position(&rect)))
            {
                return PressTarget::ResizeHandle {
                    node: node.id,
                    handle,
                };
            }
        }

        for node in doc.nodes.iter().rev() {
            if let Some(side) = Side::ALL
                .into_iter()
                .find(|&s| near(connect_handle_position(node, s, ctx.scale)))
            {
                return PressTarget::ConnectHandle {
                    node: node.id,
                    side,
                };
            }
        }
    }

    if let Some(node) = node_at(p, &doc.nodes) {
        return PressTarget::NodeBody { node };
    }
    if let Some(edge) = edge_at(p, doc, radius) {
        return PressTarget::Edge { edge };
    }
    PressTarget::Canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::model::Shape;
    use pretty_assertions::assert_eq;

    fn node(name: &str, x: f32, y: f32) -> Node {
        Node::new(NodeId::intern(name), Shape::Process, x, y).with_size(100.0, 100.0)
    }

    fn two_nodes() -> DiagramDocument {
        DiagramDocument::new()
            .add_node(node("hit_a", 0.0, 0.0))
            .and_then(|d| d.add_node(node("hit_b", 300.0, 0.0)))
            .and_then(|d| {
                d.add_edge(Edge::new(
                    EdgeId::intern("hit_ab"),
                    (NodeId::intern("hit_a"), Side::Right),
                    (NodeId::intern("hit_b"), Side::Left),
                ))
            })
            .unwrap()
    }

    #[test]
    fn nearest_side_prefers_vertical_on_ties() {
        let n = node("hit_side", 0.0, 0.0);
        assert_eq!(nearest_side(&n, Point::new(120.0, 60.0)), Side::Right);
        assert_eq!(nearest_side(&n, Point::new(-20.0, 40.0)), Side::Left);
        assert_eq!(nearest_side(&n, Point::new(50.0, 130.0)), Side::Bottom);
        assert_eq!(nearest_side(&n, Point::new(100.0, 100.0)), Side::Bottom);
        assert_eq!(nearest_side(&n, Point::new(0.0, 0.0)), Side::Top);
        assert_eq!(nearest_side(&n, n.center()), Side::Top);
    }

    #[test]
    fn connection_target_uses_tolerance_and_skips_source() {
        let doc = two_nodes();
        let a = NodeId::intern("hit_a");
        let b = NodeId::intern("hit_b");
        // Inside the tolerance band left of B.
        let hit = connection_target(Point::new(280.0, 50.0), Some(a), &doc.nodes, 30.0);
        assert_eq!(hit, Some(ConnectionTarget { node: b, side: Side::Left }));
        // Beyond the band.
        assert_eq!(
            connection_target(Point::new(260.0, 50.0), Some(a), &doc.nodes, 30.0),
            None
        );
        // Directly over the source.
        assert_eq!(
            connection_target(Point::new(50.0, 50.0), Some(a), &doc.nodes, 30.0),
            None
        );
    }

    #[test]
    fn connection_target_is_first_match_in_document_order() {
        let doc = DiagramDocument::new()
            .add_node(node("hit_first", 0.0, 0.0))
            .and_then(|d| d.add_node(node("hit_second", 50.0, 50.0)))
            .unwrap();
        let hit = connection_target(Point::new(75.0, 75.0), None, &doc.nodes, 0.0).unwrap();
        assert_eq!(hit.node, NodeId::intern("hit_first"));
        // Presses, in contrast, hit the topmost node.
        assert_eq!(
            node_at(Point::new(75.0, 75.0), &doc.nodes),
            Some(NodeId::intern("hit_second"))
        );
    }

    #[test]
    fn hover_target_uses_raw_bbox() {
        let doc = two_nodes();
        let a = NodeId::intern("hit_a");
        assert_eq!(hover_target(Point::new(290.0, 50.0), a, &doc.nodes), None);
        assert_eq!(
            hover_target(Point::new(310.0, 50.0), a, &doc.nodes),
            Some(NodeId::intern("hit_b"))
        );
        assert_eq!(hover_target(Point::new(50.0, 50.0), a, &doc.nodes), None);
    }

    #[test]
    fn box_outside_everything_selects_nothing() {
        let doc = two_nodes();
        let rect = Rect::new(0.0, 500.0, 400.0, 100.0);
        assert!(nodes_in_box(&rect, &doc.nodes).is_empty());
        assert!(edges_in_box(&rect, &doc).is_empty());
    }

    #[test]
    fn box_over_chord_selects_edge_only() {
        let doc = two_nodes();
        // Between the nodes, covering the chord's midpoint samples.
        let rect = Rect::new(180.0, 40.0, 40.0, 20.0);
        assert!(nodes_in_box(&rect, &doc.nodes).is_empty());
        assert_eq!(edges_in_box(&rect, &doc), vec![EdgeId::intern("hit_ab")]);
    }

    #[test]
    fn box_over_node_selects_node_and_its_anchor_edge() {
        let doc = two_nodes();
        let rect = Rect::new(90.0, 40.0, 20.0, 20.0);
        assert_eq!(nodes_in_box(&rect, &doc.nodes), vec![NodeId::intern("hit_a")]);
        assert_eq!(edges_in_box(&rect, &doc), vec![EdgeId::intern("hit_ab")]);
    }

    #[test]
    fn dangling_edges_never_intersect() {
        let mut doc = two_nodes();
        doc.nodes.pop();
        let rect = Rect::new(-1000.0, -1000.0, 5000.0, 5000.0);
        assert!(edges_in_box(&rect, &doc).is_empty());
        assert_eq!(edge_at(Point::new(200.0, 50.0), &doc, 10.0), None);
    }

    #[test]
    fn edge_at_follows_curve() {
        let doc = two_nodes();
        assert_eq!(
            edge_at(Point::new(200.0, 53.0), &doc, 5.0),
            Some(EdgeId::intern("hit_ab"))
        );
        assert_eq!(edge_at(Point::new(200.0, 80.0), &doc, 5.0), None);
    }

    #[test]
    fn press_target_priorities() {
        let doc = two_nodes();
        let a = NodeId::intern("hit_a");
        let ctx = PressContext {
            selected: Some(a),
            scale: 1.0,
            handle_radius: DEFAULT_HANDLE_RADIUS,
            read_only: false,
        };
        assert_eq!(
            press_target(Point::new(101.0, 99.0), &doc, &ctx),
            PressTarget::ResizeHandle {
                node: a,
                handle: ResizeHandle::BottomRight
            }
        );
        assert_eq!(
            press_target(Point::new(50.0, -20.0), &doc, &ctx),
            PressTarget::ConnectHandle { node: a, side: Side::Top }
        );
        assert_eq!(
            press_target(Point::new(50.0, 50.0), &doc, &ctx),
            PressTarget::NodeBody { node: a }
        );
        assert_eq!(
            press_target(Point::new(200.0, 50.0), &doc, &ctx),
            PressTarget::Edge {
                edge: EdgeId::intern("hit_ab")
            }
        );
        assert_eq!(
            press_target(Point::new(200.0, 400.0), &doc, &ctx),
            PressTarget::Canvas
        );
    }

    #[test]
    fn read_only_press_has_no_grips() {
        let doc = two_nodes();
        let a = NodeId::intern("hit_a");
        let ctx = PressContext {
            selected: Some(a),
            scale: 1.0,
            handle_radius: DEFAULT_HANDLE_RADIUS,
            read_only: true,
        };
        assert_eq!(
            press_target(Point::new(99.0, 99.0), &doc, &ctx),
            PressTarget::NodeBody { node: a }
        );
        assert_eq!(
            press_target(Point::new(50.0, -20.0), &doc, &ctx),
            PressTarget::Canvas
        );
    }
}
