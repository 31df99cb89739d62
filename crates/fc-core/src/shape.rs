//! Shape anchor resolution.
//!
//! An anchor is the point on a node's outline where an edge attaches for a
//! given side. Selection bounds stay rectangular for every shape.
//!
//! | Shape | Anchor rule |
//! |-------|-------------|
//! | process, terminal, subroutine | bbox edge midpoint |
//! | decision | bbox edge midpoint (= diamond vertex) |
//! | io | edge midpoint shifted by half the skew onto the slanted outline |
//! | database | bbox edge midpoint (cap height is purely visual) |

use crate::geometry::{Point, Rect, Side};
use crate::model::{Node, Shape};

/// Horizontal skew of the I/O parallelogram, as a fraction of its width.
pub const IO_SKEW_RATIO: f32 = 0.15;
/// Height of the elliptical cap drawn at the top and bottom of a database.
pub const DATABASE_CAP_HEIGHT: f32 = 16.0;

/// Horizontal skew in canvas units for an I/O node.
pub fn io_skew(node: &Node) -> f32 {
    node.width * IO_SKEW_RATIO
}

/// Where an edge attached to `side` of `node` meets the node.
pub fn anchor(node: &Node, side: Side) -> Point {
    let b = node.bounds();
    let c = b.center();
    let midpoint = match side {
        Side::Top => Point::new(c.x, b.y),
        Side::Right => Point::new(b.right(), c.y),
        Side::Bottom => Point::new(c.x, b.bottom()),
        Side::Left => Point::new(b.x, c.y),
    };

    match node.shape {
        Shape::Process
        | Shape::Terminal
        | Shape::Subroutine
        | Shape::Decision
        | Shape::Database => midpoint,
        Shape::Io => {
            let half = io_skew(node) / 2.0;
            let dx = match side {
                Side::Top | Side::Left => half,
                Side::Bottom | Side::Right => -half,
            };
            Point::new(midpoint.x + dx, midpoint.y)
        }
    }
}

/// Anchor for a side given by name, as handed over by a host.
/// Unrecognised names resolve to the node center.
pub fn anchor_named(node: &Node, side: &str) -> Point {
    match side.parse::<Side>() {
        Ok(side) => anchor(node, side),
        Err(_) => node.center(),
    }
}

/// Selection and hit-test bounds: always the raw bounding box.
pub fn visual_bounds(node: &Node) -> Rect {
    node.bounds()
}

/// Closed outline polygon of the shape, clockwise from the top-left.
///
/// Rounded shapes (terminal, database) report their bounding rectangle;
/// the rounding is left to whoever draws them.
pub fn outline(node: &Node) -> Vec<Point> {
    let b = node.bounds();
    let c = b.center();
    match node.shape {
        Shape::Decision => vec![
            Point::new(c.x, b.y),
            Point::new(b.right(), c.y),
            Point::new(c.x, b.bottom()),
            Point::new(b.x, c.y),
        ],
        Shape::Io => {
            let skew = io_skew(node);
            vec![
                Point::new(b.x + skew, b.y),
                Point::new(b.right(), b.y),
                Point::new(b.right() - skew, b.bottom()),
                Point::new(b.x, b.bottom()),
            ]
        }
        Shape::Process | Shape::Terminal | Shape::Subroutine | Shape::Database => vec![
            Point::new(b.x, b.y),
            Point::new(b.right(), b.y),
            Point::new(b.right(), b.bottom()),
            Point::new(b.x, b.bottom()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;

    fn node(shape: Shape) -> Node {
        Node::new(NodeId::intern("anchor_test"), shape, 100.0, 200.0).with_size(200.0, 100.0)
    }

    #[test]
    fn rectangular_anchors_lie_on_bbox_edges() {
        for shape in [Shape::Process, Shape::Terminal, Shape::Subroutine] {
            let n = node(shape);
            assert_eq!(anchor(&n, Side::Top), Point::new(200.0, 200.0));
            assert_eq!(anchor(&n, Side::Right), Point::new(300.0, 250.0));
            assert_eq!(anchor(&n, Side::Bottom), Point::new(200.0, 300.0));
            assert_eq!(anchor(&n, Side::Left), Point::new(100.0, 250.0));
        }
    }

    #[test]
    fn diamond_anchors_are_its_vertices() {
        let n = node(Shape::Decision);
        let vertices = outline(&n);
        for (side, vertex) in Side::ALL.into_iter().zip(vertices) {
            assert_eq!(anchor(&n, side), vertex);
        }
    }

    #[test]
    fn io_top_and_bottom_offset_by_half_skew() {
        let n = node(Shape::Io);
        let c = n.center();
        let expected = n.width * 0.075;
        let top = anchor(&n, Side::Top);
        let bottom = anchor(&n, Side::Bottom);
        assert!((top.x - c.x - expected).abs() < 1e-4);
        assert!((c.x - bottom.x - expected).abs() < 1e-4);
        assert_eq!(top.y, n.y);
        assert_eq!(bottom.y, n.y + n.height);
    }

    #[test]
    fn io_side_anchors_sit_on_slanted_edges() {
        let n = node(Shape::Io);
        let skew = io_skew(&n);
        assert_eq!(anchor(&n, Side::Left), Point::new(n.x + skew / 2.0, 250.0));
        assert_eq!(
            anchor(&n, Side::Right),
            Point::new(n.x + n.width - skew / 2.0, 250.0)
        );
    }

    #[test]
    fn database_cap_does_not_move_anchors() {
        let n = node(Shape::Database);
        assert_eq!(anchor(&n, Side::Top), Point::new(200.0, 200.0));
        assert_eq!(anchor(&n, Side::Bottom), Point::new(200.0, 300.0));
    }

    #[test]
    fn unknown_side_name_falls_back_to_center() {
        let n = node(Shape::Io);
        assert_eq!(anchor_named(&n, "middle"), n.center());
        assert_eq!(anchor_named(&n, "left"), anchor(&n, Side::Left));
    }

    #[test]
    fn visual_bounds_ignore_shape() {
        let n = node(Shape::Decision);
        assert_eq!(visual_bounds(&n), Rect::new(100.0, 200.0, 200.0, 100.0));
    }
}
