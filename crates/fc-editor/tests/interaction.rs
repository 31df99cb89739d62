//! Integration tests: pointer gestures through `EditorEngine` (fc-editor).
//!
//! Every test drives the engine with the same `InputEvent`s a host would
//! send and checks the resulting document, selection and viewport.

use fc_core::geometry::{Point, Side};
use fc_core::id::{EdgeId, NodeId};
use fc_core::model::*;
use fc_core::viewport::{Viewport, ViewportSize};
use fc_editor::drop::{AttachmentImporter, FileDrop, ImportError};
use fc_editor::engine::{EditorEngine, EditorHost, TextSelection};
use fc_editor::input::{InputEvent, Modifiers};
use fc_editor::{EditorConfig, InteractionState};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct RecordingHost {
    changes: usize,
    previews: Vec<PathBuf>,
    external: Vec<PathBuf>,
    text: Vec<Option<String>>,
}

impl EditorHost for RecordingHost {
    fn on_change(&mut self, _document: &DiagramDocument) {
        self.changes += 1;
    }

    fn on_selection_change(&mut self, selection: Option<&TextSelection>) {
        self.text.push(selection.map(|s| s.text.clone()));
    }

    fn open_preview(&mut self, path: &Path) {
        self.previews.push(path.to_path_buf());
    }

    fn open_in_default_app(&mut self, path: &Path) {
        self.external.push(path.to_path_buf());
    }
}

fn a() -> NodeId {
    NodeId::intern("gesture_a")
}

fn b() -> NodeId {
    NodeId::intern("gesture_b")
}

fn square(id: NodeId, x: f32, y: f32) -> Node {
    Node::new(id, Shape::Process, x, y).with_size(100.0, 100.0)
}

/// A(0,0,100,100) and B(300,0,100,100), optionally joined A.right → B.left.
fn two_nodes(connected: bool) -> DiagramDocument {
    let doc = DiagramDocument::new()
        .add_node(square(a(), 0.0, 0.0))
        .and_then(|d| d.add_node(square(b(), 300.0, 0.0)))
        .unwrap();
    if connected {
        doc.add_edge(Edge::new(
            EdgeId::intern("gesture_ab"),
            (a(), Side::Right),
            (b(), Side::Left),
        ))
        .unwrap()
    } else {
        doc
    }
}

/// Engine at scale 1 with no offset, so screen and canvas coincide.
fn engine_with(doc: DiagramDocument, config: EditorConfig) -> EditorEngine<RecordingHost> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine =
        EditorEngine::with_host(ViewportSize::default(), config, RecordingHost::default());
    engine.load_document(doc);
    engine.set_viewport(Viewport::default());
    engine
}

fn engine(doc: DiagramDocument) -> EditorEngine<RecordingHost> {
    engine_with(doc, EditorConfig::default())
}

fn press(engine: &mut EditorEngine<RecordingHost>, x: f32, y: f32) -> bool {
    engine.handle(&InputEvent::pointer_down(x, y, Modifiers::NONE))
}

fn drag(engine: &mut EditorEngine<RecordingHost>, from: (f32, f32), to: (f32, f32)) {
    engine.handle(&InputEvent::pointer_down(from.0, from.1, Modifiers::NONE));
    engine.handle(&InputEvent::pointer_move(to.0, to.1));
    engine.handle(&InputEvent::pointer_up(to.0, to.1));
}

fn position(engine: &EditorEngine<RecordingHost>, id: NodeId) -> (f32, f32) {
    let node = engine.document().node(id).unwrap();
    (node.x, node.y)
}

// ─── Load & fit ─────────────────────────────────────────────────────────

#[test]
fn load_fits_once_per_document() {
    let mut engine = EditorEngine::new(ViewportSize::default());
    engine.load_document(two_nodes(false));
    assert_eq!(
        *engine.viewport(),
        Viewport {
            offset: Point::new(200.0, 250.0),
            scale: 1.0
        }
    );

    // Resizing the host view does not refit the same document.
    engine.set_viewport(Viewport::default());
    engine.set_viewport_size(ViewportSize {
        width: 400.0,
        height: 300.0,
    });
    assert_eq!(*engine.viewport(), Viewport::default());

    // A new document instance is fitted again.
    engine.load_document(two_nodes(true));
    assert!(engine.viewport().scale <= 1.0);
    assert_ne!(*engine.viewport(), Viewport::default());
}

#[test]
fn load_raises_undersized_nodes_to_minimum() {
    let json = r#"{"nodes": [{"id": "gesture_tiny", "x": 0, "y": 0, "width": 10, "height": 5}]}"#;
    let doc: DiagramDocument = serde_json::from_str(json).unwrap();
    let engine = engine(doc);
    let tiny = engine.document().node(NodeId::intern("gesture_tiny")).unwrap();
    assert_eq!((tiny.width, tiny.height), (MIN_NODE_WIDTH, MIN_NODE_HEIGHT));
}

#[test]
fn empty_document_keeps_default_view() {
    let mut engine = EditorEngine::new(ViewportSize::default());
    engine.load_document(DiagramDocument::new());
    assert_eq!(*engine.viewport(), Viewport::default());
}

// ─── Dragging ───────────────────────────────────────────────────────────

#[test]
fn drag_divides_screen_delta_by_scale() {
    let mut engine = engine(two_nodes(true));
    engine.set_viewport(Viewport {
        offset: Point::ORIGIN,
        scale: 2.0,
    });

    // Screen (100,100) is canvas (50,50), the centre of A.
    drag(&mut engine, (100.0, 100.0), (120.0, 120.0));

    assert_eq!(position(&engine, a()), (10.0, 10.0));
    assert_eq!(position(&engine, b()), (300.0, 0.0));
    assert_eq!(engine.selection().node, Some(a()));
    assert!(engine.state().is_idle());
}

#[test]
fn drag_uses_scale_from_gesture_start() {
    let mut engine = engine(two_nodes(false));
    engine.set_viewport(Viewport {
        offset: Point::ORIGIN,
        scale: 2.0,
    });

    press(&mut engine, 100.0, 100.0);
    engine.handle(&InputEvent::Wheel { delta_y: 1.0 });
    assert!(engine.viewport().scale < 2.0);
    engine.handle(&InputEvent::pointer_move(120.0, 120.0));
    engine.handle(&InputEvent::pointer_up(120.0, 120.0));

    assert_eq!(position(&engine, a()), (10.0, 10.0));
}

#[test]
fn dragging_a_multi_selected_node_moves_the_group() {
    let mut engine = engine(two_nodes(true));
    engine.select_all();

    drag(&mut engine, (50.0, 50.0), (60.0, 75.0));

    assert_eq!(position(&engine, a()), (10.0, 25.0));
    assert_eq!(position(&engine, b()), (310.0, 25.0));
}

#[test]
fn pressing_a_node_outside_the_group_drops_the_group() {
    let extra = NodeId::intern("gesture_extra");
    let doc = two_nodes(false)
        .add_node(square(extra, 0.0, 300.0))
        .unwrap();
    let mut engine = engine(doc);
    engine.handle(&InputEvent::pointer_down(-20.0, -20.0, Modifiers::SHIFT));
    engine.handle(&InputEvent::pointer_up(450.0, 150.0));
    assert_eq!(engine.selection().nodes, vec![a(), b()]);

    drag(&mut engine, (50.0, 350.0), (60.0, 350.0));

    assert!(engine.selection().nodes.is_empty());
    assert_eq!(position(&engine, extra), (10.0, 300.0));
    assert_eq!(position(&engine, a()), (0.0, 0.0));
}

// ─── Resizing ───────────────────────────────────────────────────────────

#[test]
fn resize_clamps_to_minimum_and_pins_opposite_corner() {
    let mut engine = engine(two_nodes(false));
    // Select A so its grips appear.
    drag(&mut engine, (50.0, 50.0), (50.0, 50.0));

    press(&mut engine, 100.0, 100.0);
    assert!(matches!(
        engine.state(),
        InteractionState::ResizingNode { .. }
    ));
    engine.handle(&InputEvent::pointer_move(-500.0, -500.0));
    engine.handle(&InputEvent::pointer_up(-500.0, -500.0));

    let node = engine.document().node(a()).unwrap();
    assert_eq!(
        (node.x, node.y, node.width, node.height),
        (0.0, 0.0, MIN_NODE_WIDTH, MIN_NODE_HEIGHT)
    );
}

#[test]
fn resize_grips_need_a_selected_node() {
    let mut engine = engine(two_nodes(false));
    press(&mut engine, 100.0, 100.0);
    // The bottom-right corner of A is just its body when A is unselected.
    assert!(matches!(
        engine.state(),
        InteractionState::DraggingNode { .. }
    ));
}

// ─── Connecting ─────────────────────────────────────────────────────────

#[test]
fn connect_creates_edge_on_target_side() {
    let mut engine = engine(two_nodes(false));

    press(&mut engine, 120.0, 50.0);
    assert!(matches!(
        engine.state(),
        InteractionState::Connecting { .. }
    ));
    assert!(engine.connection_preview().is_some());

    engine.handle(&InputEvent::pointer_move(310.0, 50.0));
    assert_eq!(engine.connection_hover(), Some(b()));
    engine.handle(&InputEvent::pointer_up(310.0, 50.0));

    let edges = &engine.document().edges;
    assert_eq!(edges.len(), 1);
    assert_eq!(
        (edges[0].from_node, edges[0].from_side, edges[0].to_node, edges[0].to_side),
        (a(), Side::Right, b(), Side::Left)
    );
    assert!(engine.state().is_idle());
    assert!(engine.connection_preview().is_none());
}

#[test]
fn connect_released_on_source_makes_no_edge() {
    let mut engine = engine(two_nodes(false));
    engine.select_all();

    press(&mut engine, 120.0, 50.0);
    // Connecting clears every selection.
    assert!(engine.selection().is_empty());
    engine.handle(&InputEvent::pointer_up(50.0, 50.0));

    assert!(engine.document().edges.is_empty());
    assert_eq!(engine.host().changes, 0);
}

#[test]
fn connect_released_within_tolerance_of_target() {
    let mut engine = engine(two_nodes(false));
    press(&mut engine, 120.0, 50.0);
    // 25 left of B, inside the 30 tolerance band.
    engine.handle(&InputEvent::pointer_up(275.0, 50.0));
    assert_eq!(engine.document().edges.len(), 1);
}

#[test]
fn canvas_press_while_connecting_cancels() {
    let mut engine = engine(two_nodes(false));
    press(&mut engine, 120.0, 50.0);

    assert!(press(&mut engine, 600.0, 400.0));
    assert!(engine.state().is_idle());

    engine.handle(&InputEvent::pointer_up(310.0, 50.0));
    assert!(engine.document().edges.is_empty());
}

#[test]
fn escape_cancels_connecting() {
    let mut engine = engine(two_nodes(false));
    press(&mut engine, 120.0, 50.0);
    assert!(engine.handle(&InputEvent::key("Escape", Modifiers::NONE)));
    assert!(engine.state().is_idle());
}

// ─── Box selection & panning ────────────────────────────────────────────

#[test]
fn box_outside_everything_selects_nothing() {
    let mut engine = engine(two_nodes(true));
    engine.handle(&InputEvent::pointer_down(600.0, 400.0, Modifiers::SHIFT));
    engine.handle(&InputEvent::pointer_move(700.0, 500.0));
    assert!(engine.selection_box().is_some());
    engine.handle(&InputEvent::pointer_up(700.0, 500.0));

    assert!(engine.selection().nodes.is_empty());
    assert!(engine.selection().edges.is_empty());
    assert!(engine.selection_box().is_none());
}

#[test]
fn box_selects_nodes_and_edges_it_touches() {
    let mut engine = engine(two_nodes(true));
    engine.handle(&InputEvent::pointer_down(-10.0, -10.0, Modifiers::SHIFT));
    engine.handle(&InputEvent::pointer_up(110.0, 110.0));

    assert_eq!(engine.selection().nodes, vec![a()]);
    assert_eq!(engine.selection().edges, vec![EdgeId::intern("gesture_ab")]);
}

#[test]
fn box_select_click_clears_multi_selection() {
    let mut engine = engine(two_nodes(true));
    engine.select_all();
    engine.handle(&InputEvent::pointer_down(600.0, 400.0, Modifiers::SHIFT));
    engine.handle(&InputEvent::pointer_up(600.0, 400.0));
    assert!(engine.selection().nodes.is_empty());
    assert!(engine.selection().edges.is_empty());
}

#[test]
fn canvas_press_pans_and_clears_multi_selection() {
    let mut engine = engine(two_nodes(true));
    engine.select_all();

    drag(&mut engine, (600.0, 400.0), (610.0, 390.0));

    assert!(engine.selection().nodes.is_empty());
    let offset = engine.viewport().offset;
    assert!((offset.x - 7.0).abs() < 1e-4);
    assert!((offset.y + 7.0).abs() < 1e-4);
    assert_eq!(engine.host().changes, 0);
}

// ─── Edges, keys, read-only ─────────────────────────────────────────────

#[test]
fn edge_press_selects_edge() {
    let mut engine = engine(two_nodes(true));
    drag(&mut engine, (50.0, 50.0), (50.0, 50.0));
    press(&mut engine, 200.0, 50.0);
    assert_eq!(engine.selection().edge, Some(EdgeId::intern("gesture_ab")));
    assert_eq!(engine.selection().node, None);
}

#[test]
fn delete_key_cascades_edges() {
    let mut engine = engine(two_nodes(true));
    drag(&mut engine, (50.0, 50.0), (50.0, 50.0));

    assert!(engine.handle(&InputEvent::key("Delete", Modifiers::NONE)));

    let ids: Vec<_> = engine.document().nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![b()]);
    assert!(engine.document().edges.is_empty());
    assert_eq!(engine.selection().node, None);
    assert_eq!(engine.host().changes, 1);
}

#[test]
fn read_only_blocks_gestures_that_mutate() {
    let config = EditorConfig {
        read_only: true,
        ..EditorConfig::default()
    };
    let mut engine = engine_with(two_nodes(false), config);

    drag(&mut engine, (50.0, 50.0), (90.0, 90.0));
    assert_eq!(position(&engine, a()), (0.0, 0.0));
    assert_eq!(engine.selection().node, Some(a()));

    // The connect grip spot is plain canvas without grips.
    press(&mut engine, 120.0, 50.0);
    assert!(matches!(engine.state(), InteractionState::Panning { .. }));
    engine.handle(&InputEvent::pointer_up(120.0, 50.0));

    assert!(!engine.handle(&InputEvent::key("Delete", Modifiers::NONE)));
    assert_eq!(engine.document().nodes.len(), 2);
}

#[test]
fn double_click_on_canvas_adds_node() {
    let mut engine = engine(two_nodes(false));
    assert!(engine.handle(&InputEvent::DoubleClick { x: 600.0, y: 400.0 }));

    let added = engine.selection().node.unwrap();
    let node = engine.document().node(added).unwrap();
    assert_eq!(node.center(), Point::new(600.0, 400.0));
    assert_eq!(engine.document().nodes.len(), 3);
}

#[test]
fn double_click_on_file_node_opens_it() {
    let pdf = NodeId::intern("gesture_pdf");
    let sheet = NodeId::intern("gesture_sheet");
    let doc = DiagramDocument::new()
        .add_node(square(pdf, 0.0, 0.0).with_payload(NodePayload::File {
            path: PathBuf::from("docs/plan.pdf"),
        }))
        .and_then(|d| {
            d.add_node(square(sheet, 300.0, 0.0).with_payload(NodePayload::File {
                path: PathBuf::from("docs/budget.xlsx"),
            }))
        })
        .unwrap();
    let mut engine = engine(doc);

    engine.handle(&InputEvent::DoubleClick { x: 50.0, y: 50.0 });
    engine.handle(&InputEvent::DoubleClick { x: 350.0, y: 50.0 });

    assert_eq!(engine.host().previews, vec![PathBuf::from("docs/plan.pdf")]);
    assert_eq!(engine.host().external, vec![PathBuf::from("docs/budget.xlsx")]);
    assert_eq!(engine.document().nodes.len(), 2);
}

#[test]
fn text_selection_changes_reach_the_host() {
    let mut engine = engine(two_nodes(false));
    let selection = TextSelection {
        node: a(),
        text: "hello".into(),
        start: 0,
        end: 5,
    };
    engine.set_text_selection(Some(selection.clone()));
    engine.set_text_selection(Some(selection));
    engine.delete_node(a());

    assert_eq!(engine.host().text, vec![Some("hello".to_string()), None]);
}

#[test]
fn text_target_press_does_not_drag() {
    let mut engine = engine(two_nodes(false));
    engine.handle(&InputEvent::PointerDown {
        x: 50.0,
        y: 50.0,
        button: fc_editor::PointerButton::Primary,
        modifiers: Modifiers::NONE,
        target: Some(fc_render::hit::PressTarget::NodeText { node: a() }),
    });
    engine.handle(&InputEvent::pointer_move(90.0, 90.0));

    assert!(engine.state().is_idle());
    assert_eq!(position(&engine, a()), (0.0, 0.0));
    assert_eq!(engine.selection().node, Some(a()));
}

// ─── File drop ──────────────────────────────────────────────────────────

struct CopyingImporter;

impl AttachmentImporter for CopyingImporter {
    fn import_attachment(&mut self, source: &Path, owner: &str) -> Result<PathBuf, ImportError> {
        match source.file_name() {
            Some(name) => Ok(Path::new("store").join(owner).join(name)),
            None => Err(ImportError::Rejected {
                path: source.to_path_buf(),
                reason: "no file name".into(),
            }),
        }
    }
}

#[test]
fn dropped_files_stack_below_drop_point() {
    let mut engine = engine(DiagramDocument::new());
    let drop = FileDrop {
        paths: vec![PathBuf::from("/home/u/photo.jpg"), PathBuf::from("/")],
        position: Some(Point::new(400.0, 300.0)),
    };
    // Also covers a failed import: "/" has no file name.
    let added = engine.drop_files(&mut CopyingImporter, &drop, "canvas-1");
    assert_eq!(added, 1);

    let more = FileDrop {
        paths: vec![
            PathBuf::from("/home/u/a.png"),
            PathBuf::from("/home/u/notes.md"),
        ],
        position: Some(Point::new(400.0, 300.0)),
    };
    engine.drop_files(&mut CopyingImporter, &more, "canvas-1");

    let placed: Vec<_> = engine
        .document()
        .nodes
        .iter()
        .map(|n| (n.x, n.y, n.width, n.height))
        .collect();
    assert_eq!(
        placed,
        vec![
            (400.0, 300.0, 250.0, 200.0),
            (400.0, 300.0, 250.0, 200.0),
            (400.0, 520.0, 240.0, 160.0),
        ]
    );
    assert_eq!(
        engine.document().nodes[0].file_path(),
        Some(Path::new("store/canvas-1/photo.jpg"))
    );
}
