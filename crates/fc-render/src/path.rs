//! Edge curve generation.
//!
//! Edges are cubic beziers between two anchors. Each control point leaves
//! its anchor along the outward normal of that anchor's side, so curves
//! always exit a node perpendicular to the face they attach to.

use fc_core::geometry::{Point, Side};
use fc_core::id::EdgeId;
use fc_core::model::{DiagramDocument, Edge, Node};
use fc_core::shape::anchor;
use kurbo::{BezPath, CubicBez};

/// Upper bound on how far a control point sits from its anchor.
pub const MAX_CONTROL_OFFSET: f32 = 100.0;

/// Control-point distance for anchors `a` and `b`: half their distance,
/// capped at [`MAX_CONTROL_OFFSET`].
pub fn control_offset(a: Point, b: Point) -> f32 {
    (a.distance(b) * 0.5).min(MAX_CONTROL_OFFSET)
}

/// The four points of an edge's cubic bezier, in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCurve {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl EdgeCurve {
    /// Curve from `from`'s `from_side` anchor to `to`'s `to_side` anchor.
    pub fn between(from: &Node, from_side: Side, to: &Node, to_side: Side) -> Self {
        let start = anchor(from, from_side);
        let end = anchor(to, to_side);
        let offset = control_offset(start, end);
        Self {
            start,
            c1: start + from_side.outward_normal() * offset,
            c2: end + to_side.outward_normal() * offset,
            end,
        }
    }

    /// Curve for a document edge; `None` when either endpoint is missing.
    pub fn for_edge(doc: &DiagramDocument, edge: &Edge) -> Option<Self> {
        let (from, to) = doc.endpoints(edge)?;
        Some(Self::between(from, edge.from_side, to, edge.to_side))
    }

    pub fn to_cubic(&self) -> CubicBez {
        CubicBez::new(
            to_kurbo(self.start),
            to_kurbo(self.c1),
            to_kurbo(self.c2),
            to_kurbo(self.end),
        )
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(to_kurbo(self.start));
        path.curve_to(to_kurbo(self.c1), to_kurbo(self.c2), to_kurbo(self.end));
        path
    }
}

/// Path for a document edge. Dangling edges yield an empty path, which
/// renderers skip.
pub fn edge_path(doc: &DiagramDocument, edge: &Edge) -> BezPath {
    match EdgeCurve::for_edge(doc, edge) {
        Some(curve) => curve.to_path(),
        None => {
            log::trace!("edge {} is dangling, no path", edge.id);
            BezPath::new()
        }
    }
}

/// Every renderable edge in document order, dangling edges skipped.
pub fn edge_paths(doc: &DiagramDocument) -> impl Iterator<Item = (EdgeId, BezPath)> + '_ {
    doc.edges
        .iter()
        .filter_map(|edge| EdgeCurve::for_edge(doc, edge).map(|c| (edge.id, c.to_path())))
}

/// Live preview while dragging a new connection: a quadratic bezier from the
/// source anchor to the pointer, bending out of the source side.
pub fn preview_path(source: &Node, side: Side, pointer: Point) -> BezPath {
    let start = anchor(source, side);
    let control = start + side.outward_normal() * control_offset(start, pointer);
    let mut path = BezPath::new();
    path.move_to(to_kurbo(start));
    path.quad_to(to_kurbo(control), to_kurbo(pointer));
    path
}

pub fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

pub fn from_kurbo(p: kurbo::Point) -> Point {
    Point::new(p.x as f32, p.y as f32)
}
