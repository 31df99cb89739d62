//! WASM bridge for Flow Canvas: exposes the editor engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and loaded by the note app's
//! canvas view. Documents cross the boundary as JSON; callbacks from the
//! engine are queued and polled by the JS side after each event.

mod svg;

use fc_core::geometry::Point;
use fc_core::id::{EdgeId, NodeId};
use fc_core::model::{DiagramDocument, EdgePatch, NodePatch, Shape};
use fc_core::shape::outline;
use fc_core::viewport::ViewportSize;
use fc_editor::drop::layout_files;
use fc_editor::engine::{EditorEngine, EditorHost, TextSelection};
use fc_editor::input::{InputEvent, Modifiers, PointerButton};
use fc_editor::shortcuts::ShortcutMap;
use fc_editor::EditorConfig;
use fc_render::hit::PressTarget;
use fc_render::path::edge_paths;
use serde::Serialize;
use std::path::{Path, PathBuf};
use wasm_bindgen::prelude::*;

/// A file the engine asked the host to open.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenRequest {
    path: String,
    preview: bool,
}

/// Collects engine callbacks until JS polls for them.
#[derive(Default)]
struct BridgeHost {
    document_changed: bool,
    open_requests: Vec<OpenRequest>,
    text_selection: Option<TextSelection>,
    text_selection_changed: bool,
}

impl EditorHost for BridgeHost {
    fn on_change(&mut self, _document: &DiagramDocument) {
        self.document_changed = true;
    }

    fn on_selection_change(&mut self, selection: Option<&TextSelection>) {
        self.text_selection = selection.cloned();
        self.text_selection_changed = true;
    }

    fn open_preview(&mut self, path: &Path) {
        self.open_requests.push(OpenRequest {
            path: path.to_string_lossy().into_owned(),
            preview: true,
        });
    }

    fn open_in_default_app(&mut self, path: &Path) {
        self.open_requests.push(OpenRequest {
            path: path.to_string_lossy().into_owned(),
            preview: false,
        });
    }
}

#[derive(Serialize)]
struct EdgePathJson {
    id: String,
    d: String,
}

/// The main WASM-facing canvas controller.
///
/// All interaction from the JS view goes through this struct.
#[wasm_bindgen]
pub struct FlowCanvas {
    engine: EditorEngine<BridgeHost>,
}

#[wasm_bindgen]
impl FlowCanvas {
    /// Create a controller for a view of the given size. `config_json` may
    /// be empty or a partial `EditorConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, config_json: &str) -> Self {
        console_error_panic_hook_setup();

        let config = if config_json.trim().is_empty() {
            EditorConfig::default()
        } else {
            serde_json::from_str(config_json).unwrap_or_else(|e| {
                log::warn!("ignoring invalid editor config: {e}");
                EditorConfig::default()
            })
        };
        let size = ViewportSize { width, height };
        Self {
            engine: EditorEngine::with_host(size, config, BridgeHost::default()),
        }
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Replace the document. Returns `false` if the JSON does not parse.
    pub fn set_document(&mut self, json: &str) -> bool {
        match serde_json::from_str::<DiagramDocument>(json) {
            Ok(doc) => {
                self.engine.load_document(doc);
                true
            }
            Err(e) => {
                log::warn!("rejecting document: {e}");
                false
            }
        }
    }

    pub fn get_document(&self) -> String {
        serde_json::to_string(self.engine.document()).unwrap_or_default()
    }

    /// Whether the document changed since the last call. Clears the flag.
    pub fn take_document_change(&mut self) -> bool {
        std::mem::take(&mut self.engine.host_mut().document_changed)
    }

    /// Standalone SVG of the whole document, or of the multi-selection
    /// when `selection_only` is set and something is selected.
    pub fn export_svg(&self, selection_only: bool) -> String {
        let selected = if selection_only {
            self.engine.selection().all_nodes()
        } else {
            Vec::new()
        };
        svg::render_svg(self.engine.document(), &selected)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.engine.set_viewport_size(ViewportSize { width, height });
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    /// Handle pointer down. Returns true if a re-render is needed.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        self.engine.handle(&InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::from_dom(button),
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
            target: None,
        })
    }

    /// Pointer down on the text editor inside `node_id`; never starts a drag.
    pub fn handle_text_press(&mut self, x: f32, y: f32, node_id: &str) -> bool {
        self.engine.handle(&InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            target: Some(PressTarget::NodeText {
                node: NodeId::intern(node_id),
            }),
        })
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.engine.handle(&InputEvent::pointer_move(x, y))
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32, button: i16) -> bool {
        self.engine.handle(&InputEvent::PointerUp {
            x,
            y,
            button: PointerButton::from_dom(button),
            modifiers: Modifiers::NONE,
        })
    }

    pub fn handle_double_click(&mut self, x: f32, y: f32) -> bool {
        self.engine.handle(&InputEvent::DoubleClick { x, y })
    }

    pub fn handle_wheel(&mut self, delta_y: f32) -> bool {
        self.engine.handle(&InputEvent::Wheel { delta_y })
    }

    /// Handle a keyboard event. Returns a JSON string:
    /// `{"changed":bool, "action":"<action_name>"}`
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let Some(action) = ShortcutMap::resolve(key, &modifiers) else {
            return r#"{"changed":false,"action":"none"}"#.to_string();
        };
        let changed = self.engine.handle(&InputEvent::key(key, modifiers));
        format!(r#"{{"changed":{changed},"action":"{}"}}"#, action.name())
    }

    // ─── Commands ────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.engine.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.engine.redo()
    }

    pub fn delete_selected(&mut self) -> bool {
        self.engine.delete_selection()
    }

    pub fn select_all(&mut self) {
        self.engine.select_all();
    }

    pub fn zoom_to_fit(&mut self) -> bool {
        self.engine.zoom_to_fit()
    }

    /// Insert a template node of `shape` (e.g. `"decision"`) in the middle
    /// of the view. Returns the new node id, or an empty string.
    pub fn insert_template(&mut self, shape: &str) -> String {
        let shape = match serde_json::from_value::<Shape>(serde_json::Value::String(shape.into())) {
            Ok(shape) => shape,
            Err(e) => {
                log::warn!("unknown template shape: {e}");
                return String::new();
            }
        };
        self.engine
            .insert_template(shape)
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Apply a JSON `NodePatch` to one node.
    pub fn update_node(&mut self, node_id: &str, patch_json: &str) -> bool {
        match serde_json::from_str::<NodePatch>(patch_json) {
            Ok(patch) => self.engine.update_node(NodeId::intern(node_id), &patch),
            Err(e) => {
                log::warn!("bad node patch: {e}");
                false
            }
        }
    }

    /// Apply a JSON `EdgePatch` to one edge.
    pub fn update_edge(&mut self, edge_id: &str, patch_json: &str) -> bool {
        match serde_json::from_str::<EdgePatch>(patch_json) {
            Ok(patch) => self.engine.update_edge(EdgeId::intern(edge_id), &patch),
            Err(e) => {
                log::warn!("bad edge patch: {e}");
                false
            }
        }
    }

    // ─── File drops ──────────────────────────────────────────────────────

    /// Add nodes for files the host has already copied into storage.
    /// `paths_json` is a JSON array of stored paths; the screen position is
    /// used only when `has_position` is set. Returns how many were added.
    pub fn append_imported(&mut self, paths_json: &str, x: f32, y: f32, has_position: bool) -> usize {
        let stored: Vec<PathBuf> = match serde_json::from_str(paths_json) {
            Ok(paths) => paths,
            Err(e) => {
                log::warn!("bad import batch: {e}");
                return 0;
            }
        };
        let position = has_position.then(|| Point::new(x, y));
        let anchor = self.engine.drop_anchor(position);
        self.engine.append_nodes(layout_files(&stored, anchor))
    }

    /// Pending open requests as JSON `[{"path": "...", "preview": bool}]`.
    /// Clears the queue.
    pub fn take_open_requests(&mut self) -> String {
        let requests = std::mem::take(&mut self.engine.host_mut().open_requests);
        serde_json::to_string(&requests).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Text selection ──────────────────────────────────────────────────

    pub fn set_text_selection(&mut self, node_id: &str, text: &str, start: usize, end: usize) {
        self.engine.set_text_selection(Some(TextSelection {
            node: NodeId::intern(node_id),
            text: text.to_string(),
            start,
            end,
        }));
    }

    pub fn clear_text_selection(&mut self) {
        self.engine.set_text_selection(None);
    }

    /// The text selection as JSON if it changed since the last call,
    /// `"null"` when it was cleared, or an empty string when unchanged.
    pub fn take_text_selection_change(&mut self) -> String {
        let host = self.engine.host_mut();
        if !std::mem::take(&mut host.text_selection_changed) {
            return String::new();
        }
        serde_json::to_string(&host.text_selection).unwrap_or_default()
    }

    // ─── Render state ────────────────────────────────────────────────────

    /// Every renderable edge as JSON `[{"id": "...", "d": "<svg path>"}]`.
    pub fn get_edge_paths(&self) -> String {
        let paths: Vec<EdgePathJson> = edge_paths(self.engine.document())
            .map(|(id, path)| EdgePathJson {
                id: id.as_str().to_string(),
                d: path.to_svg(),
            })
            .collect();
        serde_json::to_string(&paths).unwrap_or_else(|_| "[]".to_string())
    }

    /// SVG path of the connection preview, or an empty string.
    pub fn get_connection_preview(&self) -> String {
        self.engine
            .connection_preview()
            .map(|path| path.to_svg())
            .unwrap_or_default()
    }

    /// Id of the node highlighted as a connection target, or empty.
    pub fn get_connection_hover(&self) -> String {
        self.engine
            .connection_hover()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Outline polygon of a node as JSON `[[x, y], ...]`.
    pub fn get_node_outline(&self, node_id: &str) -> String {
        match self.engine.document().node(NodeId::intern(node_id)) {
            Some(node) => {
                let points: Vec<[f32; 2]> = outline(node).iter().map(|p| [p.x, p.y]).collect();
                serde_json::to_string(&points).unwrap_or_default()
            }
            None => String::new(),
        }
    }

    /// SVG highlight for the single-selected node, or an empty string.
    pub fn get_selection_outline(&self) -> String {
        self.engine
            .selection()
            .node
            .and_then(|id| self.engine.document().node(id))
            .map(svg::selection_outline)
            .unwrap_or_default()
    }

    pub fn get_selection(&self) -> String {
        serde_json::to_string(self.engine.selection()).unwrap_or_default()
    }

    /// Rubber-band rectangle as JSON `{x, y, width, height}`, or `"null"`.
    pub fn get_selection_box(&self) -> String {
        serde_json::to_string(&self.engine.selection_box()).unwrap_or_default()
    }

    /// `{"offset": {"x", "y"}, "scale"}` for the host's CSS transform.
    pub fn get_viewport(&self) -> String {
        serde_json::to_string(self.engine.viewport()).unwrap_or_default()
    }

    pub fn get_gesture(&self) -> String {
        self.engine.state().name().to_string()
    }

    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.engine.can_redo()
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Flow Canvas WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone helpers (no canvas needed) ───────────────────────────────

/// Validate a document JSON. Returns `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_document(json: &str) -> String {
    match serde_json::from_str::<DiagramDocument>(json) {
        Ok(doc) => {
            let dangling = doc
                .edges
                .iter()
                .filter(|e| doc.endpoints(e).is_none())
                .count();
            serde_json::json!({ "ok": true, "danglingEdges": dangling }).to_string()
        }
        Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}
