use fc_core::geometry::{Point, Rect};
use fc_core::id::NodeId;
use fc_core::model::{Color, DiagramDocument, Node, NodePayload, Shape};
use fc_core::shape::{DATABASE_CAP_HEIGHT, outline};
use fc_render::path::edge_paths;

const DEFAULT_FILL: &str = "#FFFFFF";
const DEFAULT_STROKE: &str = "#2D3436";
const SELECTED_STROKE: &str = "#0984E3";
const TERMINAL_RADIUS: f32 = 40.0;
const SUBROUTINE_INSET: f32 = 12.0;
const FONT_SIZE: f32 = 14.0;

fn svg_color(c: &Color) -> String {
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    if byte(c.a) == 255 {
        c.to_hex()
    } else {
        format!("rgba({}, {}, {}, {})", byte(c.r), byte(c.g), byte(c.b), c.a)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Standalone SVG of the diagram. With `selected` empty the whole document
/// is exported, otherwise only those nodes and the edges between them.
pub fn render_svg(doc: &DiagramDocument, selected: &[NodeId]) -> String {
    let included = |id: NodeId| selected.is_empty() || selected.contains(&id);
    let nodes: Vec<&Node> = doc.nodes.iter().filter(|n| included(n.id)).collect();

    let bounds = nodes
        .iter()
        .map(|n| n.bounds())
        .reduce(|a, b| a.union(&b))
        .unwrap_or(Rect::new(0.0, 0.0, 800.0, 600.0));

    let pad = 16.0;
    let width = bounds.width + pad * 2.0;
    let height = bounds.height + pad * 2.0;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    ));
    svg.push_str("<style>\n");
    svg.push_str("  text { font-family: Inter, system-ui, sans-serif; }\n");
    svg.push_str("</style>\n");
    svg.push_str(&format!(
        "<g transform=\"translate({}, {})\">\n",
        pad - bounds.x,
        pad - bounds.y
    ));

    // Edges first so node fills cover their ends.
    for (id, path) in edge_paths(doc) {
        let Some(edge) = doc.edge(id) else { continue };
        if !included(edge.from_node) || !included(edge.to_node) {
            continue;
        }
        let stroke = edge
            .color
            .as_ref()
            .map(svg_color)
            .unwrap_or_else(|| DEFAULT_STROKE.to_string());
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" />\n",
            path.to_svg(),
            stroke
        ));
    }

    for node in nodes {
        render_node_svg(&mut svg, node);
    }

    svg.push_str("</g>\n</svg>");
    svg
}

fn render_node_svg(out: &mut String, node: &Node) {
    let b = node.bounds();
    let fill = node
        .color
        .as_ref()
        .map(svg_color)
        .unwrap_or_else(|| DEFAULT_FILL.to_string());
    let paint = format!("fill=\"{fill}\" stroke=\"{DEFAULT_STROKE}\" stroke-width=\"2\"");

    match node.shape {
        Shape::Terminal => {
            let r = TERMINAL_RADIUS.min(b.height / 2.0);
            out.push_str(&format!(
                "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{r}\" ry=\"{r}\" {paint} />\n",
                b.x, b.y, b.width, b.height
            ));
        }
        Shape::Database => {
            let cap = DATABASE_CAP_HEIGHT / 2.0;
            let cx = b.x + b.width / 2.0;
            let rx = b.width / 2.0;
            out.push_str(&format!(
                "  <path d=\"M {} {} L {} {} A {rx} {cap} 0 0 0 {} {} L {} {} A {rx} {cap} 0 0 0 {} {} Z\" {paint} />\n",
                b.x,
                b.y + cap,
                b.x,
                b.bottom() - cap,
                b.right(),
                b.bottom() - cap,
                b.right(),
                b.y + cap,
                b.x,
                b.y + cap,
            ));
            out.push_str(&format!(
                "  <ellipse cx=\"{cx}\" cy=\"{}\" rx=\"{rx}\" ry=\"{cap}\" {paint} />\n",
                b.y + cap
            ));
        }
        _ => {
            out.push_str(&format!(
                "  <polygon points=\"{}\" {paint} />\n",
                points_attr(&outline(node))
            ));
            if node.shape == Shape::Subroutine {
                for x in [b.x + SUBROUTINE_INSET, b.right() - SUBROUTINE_INSET] {
                    out.push_str(&format!(
                        "  <line x1=\"{x}\" y1=\"{}\" x2=\"{x}\" y2=\"{}\" stroke=\"{DEFAULT_STROKE}\" stroke-width=\"2\" />\n",
                        b.y,
                        b.bottom()
                    ));
                }
            }
        }
    }

    let label = match &node.payload {
        NodePayload::Text { text } => text.clone(),
        NodePayload::File { path } => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    if label.is_empty() {
        return;
    }

    let lines: Vec<&str> = label.lines().collect();
    let line_height = FONT_SIZE * 1.2;
    let total_height = lines.len() as f32 * line_height;
    let center = node.center();
    let mut y = center.y - total_height / 2.0 + FONT_SIZE * 0.8;
    for line in lines {
        out.push_str(&format!(
            "  <text x=\"{}\" y=\"{y}\" font-size=\"{FONT_SIZE}\" fill=\"{DEFAULT_STROKE}\" text-anchor=\"middle\">{}</text>\n",
            center.x,
            escape(line)
        ));
        y += line_height;
    }
}

/// Outline for the selection highlight drawn by the host.
pub fn selection_outline(node: &Node) -> String {
    format!(
        "<polygon points=\"{}\" fill=\"none\" stroke=\"{SELECTED_STROKE}\" stroke-width=\"2\" />",
        points_attr(&outline(node))
    )
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}
