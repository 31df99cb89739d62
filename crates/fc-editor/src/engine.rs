//! The editor engine: document, viewport, selection and gesture state in
//! one place, driven synchronously by the host's input events.
//!
//! Every document change goes through [`EditorEngine::commit`], which swaps
//! in the new snapshot, records undo history, prunes the selection and
//! notifies the host. Gestures apply their changes live on each pointer
//! move; release only finalizes.

use crate::commands::History;
use crate::config::EditorConfig;
use crate::drop::{self, AttachmentImporter, FileDrop, OpenAction};
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::interaction::{InteractionState, drag_delta, is_click, resize_rect};
use crate::selection::Selection;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use fc_core::geometry::{Point, Rect};
use fc_core::id::{EdgeId, NodeId};
use fc_core::model::{DiagramDocument, Edge, EdgePatch, Node, NodePatch, Shape};
use fc_core::viewport::{MAX_SCALE, MIN_SCALE, Viewport, ViewportSize};
use fc_render::hit::{
    PressContext, PressTarget, connection_target, edges_in_box, hover_target, nodes_in_box,
    press_target,
};
use fc_render::path::preview_path;
use kurbo::BezPath;
use serde::Serialize;
use smallvec::{SmallVec, smallvec};
use std::path::Path;

/// Text selected inside a text node, reported so the host can offer
/// follow-up actions on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSelection {
    pub node: NodeId,
    pub text: String,
    /// Byte offsets into the node text.
    pub start: usize,
    pub end: usize,
}

/// Callbacks from the engine to whoever embeds it. Every method has a no-op
/// default so hosts implement only what they need.
pub trait EditorHost {
    /// Called after every committed document change.
    fn on_change(&mut self, _document: &DiagramDocument) {}

    /// Called when the text selection inside a text node changes.
    fn on_selection_change(&mut self, _selection: Option<&TextSelection>) {}

    fn open_preview(&mut self, _path: &Path) {}

    fn open_in_default_app(&mut self, _path: &Path) {}
}

impl EditorHost for () {}

pub struct EditorEngine<H: EditorHost = ()> {
    document: DiagramDocument,
    viewport: Viewport,
    size: ViewportSize,
    selection: Selection,
    state: InteractionState,
    history: History,
    config: EditorConfig,
    host: H,
    /// Set once the current document instance has been fitted to the view.
    fitted: bool,
    text_selection: Option<TextSelection>,
}

impl EditorEngine<()> {
    pub fn new(size: ViewportSize) -> Self {
        Self::with_host(size, EditorConfig::default(), ())
    }
}

impl<H: EditorHost> EditorEngine<H> {
    pub fn with_host(size: ViewportSize, config: EditorConfig, host: H) -> Self {
        Self {
            document: DiagramDocument::default(),
            viewport: Viewport::default(),
            size,
            selection: Selection::default(),
            state: InteractionState::Idle,
            history: History::new(config.history_depth),
            config,
            host,
            fitted: false,
            text_selection: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &DiagramDocument {
        &self.document
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_size(&self) -> ViewportSize {
        self.size
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Rubber-band rectangle while box selecting, in canvas space.
    pub fn selection_box(&self) -> Option<Rect> {
        self.state.selection_box()
    }

    /// Preview curve while dragging a new connection.
    pub fn connection_preview(&self) -> Option<BezPath> {
        match &self.state {
            InteractionState::Connecting {
                from,
                side,
                pointer,
                ..
            } => self
                .document
                .node(*from)
                .map(|node| preview_path(node, *side, *pointer)),
            _ => None,
        }
    }

    /// Node highlighted as a drop candidate while connecting.
    pub fn connection_hover(&self) -> Option<NodeId> {
        match &self.state {
            InteractionState::Connecting { hover, .. } => *hover,
            _ => None,
        }
    }

    // ─── Document lifecycle ──────────────────────────────────────────────

    /// Replace the document with a new instance from the host. The view is
    /// fitted to its content once; history and gesture state start fresh.
    pub fn load_document(&mut self, mut document: DiagramDocument) {
        for node in &mut document.nodes {
            node.clamp_size();
        }
        log::debug!(
            "load document: {} nodes, {} edges",
            document.nodes.len(),
            document.edges.len()
        );
        self.document = document;
        self.history.clear();
        self.set_state(InteractionState::Idle);
        self.selection.prune(&self.document);
        self.text_selection = None;
        self.fitted = false;
        self.fit_once();
    }

    /// Restore a saved view. The scale is clamped to the zoom range.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Viewport {
            offset: viewport.offset,
            scale: viewport.scale.clamp(MIN_SCALE, MAX_SCALE),
        };
    }

    pub fn set_viewport_size(&mut self, size: ViewportSize) {
        self.size = size;
    }

    fn fit_once(&mut self) {
        if self.fitted {
            return;
        }
        self.viewport.fit_to_content(&self.document.nodes, self.size);
        self.fitted = true;
    }

    /// Swap in a new document snapshot. Returns `false` when nothing changed.
    fn commit(&mut self, next: DiagramDocument, description: &str) -> bool {
        if next == self.document {
            return false;
        }
        let before = std::mem::replace(&mut self.document, next);
        self.history.record(&before, &self.document, description);
        self.after_document_change();
        true
    }

    fn after_document_change(&mut self) {
        self.selection.prune(&self.document);
        let stale = self
            .text_selection
            .as_ref()
            .is_some_and(|sel| self.document.node(sel.node).is_none());
        if stale {
            self.set_text_selection(None);
        }
        self.host.on_change(&self.document);
    }

    fn set_state(&mut self, next: InteractionState) {
        if self.state.name() != next.name() {
            log::debug!("gesture {} -> {}", self.state.name(), next.name());
        }
        self.state = next;
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node) -> bool {
        match self.document.add_node(node) {
            Ok(next) => self.commit(next, "Add node"),
            Err(err) => {
                log::debug!("add node rejected: {err}");
                false
            }
        }
    }

    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch) -> bool {
        let next = self.document.update_node(id, patch);
        self.commit(next, "Edit node")
    }

    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let next = self.document.delete_node(id);
        self.commit(next, "Delete node")
    }

    pub fn add_edge(&mut self, edge: Edge) -> bool {
        match self.document.add_edge(edge) {
            Ok(next) => self.commit(next, "Connect nodes"),
            Err(err) => {
                log::debug!("add edge rejected: {err}");
                false
            }
        }
    }

    pub fn update_edge(&mut self, id: EdgeId, patch: &EdgePatch) -> bool {
        let next = self.document.update_edge(id, patch);
        self.commit(next, "Edit edge")
    }

    pub fn delete_edge(&mut self, id: EdgeId) -> bool {
        let next = self.document.delete_edge(id);
        self.commit(next, "Delete edge")
    }

    pub fn bulk_delete(&mut self, nodes: &[NodeId], edges: &[EdgeId]) -> bool {
        let next = self.document.bulk_delete(nodes, edges);
        self.commit(next, "Delete selection")
    }

    /// Delete everything selected, single and multi.
    pub fn delete_selection(&mut self) -> bool {
        if self.config.read_only {
            return false;
        }
        let nodes = self.selection.all_nodes();
        let edges = self.selection.all_edges();
        if nodes.is_empty() && edges.is_empty() {
            return false;
        }
        self.bulk_delete(&nodes, &edges)
    }

    /// Add a default-sized node of `shape` centred on a canvas point and
    /// select it.
    pub fn add_node_at(&mut self, shape: Shape, center: Point) -> Option<NodeId> {
        let (w, h) = shape.default_size();
        let node = Node::new(NodeId::generate(), shape, center.x - w / 2.0, center.y - h / 2.0);
        let id = node.id;
        if self.add_node(node) {
            self.selection.select_node(id);
            Some(id)
        } else {
            None
        }
    }

    /// Insert a template node in the middle of the visible area.
    pub fn insert_template(&mut self, shape: Shape) -> Option<NodeId> {
        if self.config.read_only {
            return None;
        }
        let center = self.viewport.visible_rect(self.size).center();
        self.add_node_at(shape, center)
    }

    /// Append nodes produced by a finished import. Imports may complete in
    /// any order; each batch is appended as it arrives.
    pub fn append_nodes(&mut self, nodes: Vec<Node>) -> usize {
        let count = nodes.len();
        if count == 0 {
            return 0;
        }
        // An import landing mid-gesture gets its own undo step beneath the
        // gesture's, so undoing the gesture keeps the imported nodes.
        self.history
            .rebase_batch("Import files", |before| before.append_nodes(nodes.clone()));
        let next = self.document.append_nodes(nodes);
        let added = next.nodes.len() - self.document.nodes.len();
        self.commit(next, "Import files");
        log::debug!("appended {added} of {count} imported nodes");
        added
    }

    /// Canvas point where nodes for a drop at `position` should start.
    pub fn drop_anchor(&self, position: Option<Point>) -> Point {
        drop::drop_anchor(position, &self.viewport)
    }

    /// Import dropped files through `importer` and append the resulting nodes.
    pub fn drop_files(
        &mut self,
        importer: &mut dyn AttachmentImporter,
        file_drop: &FileDrop,
        owner: &str,
    ) -> usize {
        if self.config.read_only {
            return 0;
        }
        let nodes = drop::import_drop(importer, file_drop, owner, &self.viewport);
        self.append_nodes(nodes)
    }

    pub fn undo(&mut self) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        match self.history.undo() {
            Some((document, description)) => {
                log::debug!("undo: {description}");
                self.document = document;
                self.after_document_change();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        match self.history.redo() {
            Some((document, description)) => {
                log::debug!("redo: {description}");
                self.document = document;
                self.after_document_change();
                true
            }
            None => false,
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_all(&mut self) {
        let nodes = self.document.nodes.iter().map(|n| n.id).collect();
        let edges = self.document.edges.iter().map(|e| e.id).collect();
        self.selection.set_multi(nodes, edges);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Report the text selection inside a text node; the host hears about
    /// it only when it actually changes.
    pub fn set_text_selection(&mut self, selection: Option<TextSelection>) {
        if self.text_selection == selection {
            return;
        }
        self.text_selection = selection;
        self.host.on_selection_change(self.text_selection.as_ref());
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> bool {
        self.update_viewport(Viewport::zoom_in)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.update_viewport(Viewport::zoom_out)
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.update_viewport(Viewport::reset_zoom)
    }

    /// Explicit fit; unlike the load-time fit this may run any number of times.
    pub fn zoom_to_fit(&mut self) -> bool {
        let before = self.viewport;
        self.viewport.fit_to_content(&self.document.nodes, self.size);
        before != self.viewport
    }

    fn update_viewport(&mut self, f: impl FnOnce(&mut Viewport)) -> bool {
        let before = self.viewport;
        f(&mut self.viewport);
        before != self.viewport
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event. Returns `true` when anything visible changed.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
                target,
            } => self.pointer_down(Point::new(*x, *y), *button, modifiers, *target),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y, button, .. } => {
                self.pointer_up(Point::new(*x, *y), *button)
            }
            InputEvent::DoubleClick { x, y } => self.double_click(Point::new(*x, *y)),
            InputEvent::Wheel { delta_y } => {
                let dy = *delta_y;
                self.update_viewport(|vp| vp.zoom(dy))
            }
            InputEvent::Key { key, modifiers } => match ShortcutMap::resolve(key, modifiers) {
                Some(action) => self.dispatch(action),
                None => false,
            },
        }
    }

    /// What a press at a canvas point would hit.
    pub fn resolve_press(&self, canvas: Point) -> PressTarget {
        let ctx = PressContext {
            selected: self.selection.node,
            scale: self.viewport.scale,
            handle_radius: self.config.handle_radius,
            read_only: self.config.read_only,
        };
        press_target(canvas, &self.document, &ctx)
    }

    fn pointer_down(
        &mut self,
        screen: Point,
        button: PointerButton,
        modifiers: &Modifiers,
        target: Option<PressTarget>,
    ) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        let canvas = self.viewport.to_canvas(screen);
        let target = target.unwrap_or_else(|| self.resolve_press(canvas));

        if !self.state.is_idle() {
            if matches!(self.state, InteractionState::Connecting { .. })
                && target == PressTarget::Canvas
            {
                log::debug!("connect cancelled by canvas press");
                self.set_state(InteractionState::Idle);
                return true;
            }
            return false;
        }

        match target {
            PressTarget::NodeBody { node } => {
                let group: SmallVec<[NodeId; 4]> = if self.selection.nodes.contains(&node) {
                    let mut group = smallvec![node];
                    group.extend(self.selection.nodes.iter().copied().filter(|id| *id != node));
                    group
                } else {
                    self.selection.clear_multi();
                    smallvec![node]
                };
                self.selection.select_node(node);
                if !self.config.read_only {
                    self.history.begin_batch(&self.document, "Move node");
                    self.set_state(InteractionState::DraggingNode {
                        nodes: group,
                        last: screen,
                        scale: self.viewport.scale,
                    });
                }
            }
            PressTarget::NodeText { node } => {
                self.selection.select_node(node);
            }
            PressTarget::ResizeHandle { node, handle } => {
                let Some(start) = self.document.node(node).map(Node::bounds) else {
                    return false;
                };
                if self.config.read_only {
                    return false;
                }
                self.history.begin_batch(&self.document, "Resize node");
                self.set_state(InteractionState::ResizingNode {
                    node,
                    handle,
                    origin: screen,
                    start,
                    scale: self.viewport.scale,
                });
            }
            PressTarget::ConnectHandle { node, side } => {
                if self.config.read_only || self.document.node(node).is_none() {
                    return false;
                }
                self.selection.clear();
                self.set_state(InteractionState::Connecting {
                    from: node,
                    side,
                    pointer: canvas,
                    hover: None,
                });
            }
            PressTarget::Edge { edge } => {
                self.selection.select_edge(edge);
            }
            PressTarget::Canvas => {
                if self.config.wants_box_select(modifiers) {
                    self.set_state(InteractionState::BoxSelecting {
                        start: canvas,
                        current: canvas,
                    });
                } else {
                    self.selection.clear_multi();
                    self.set_state(InteractionState::Panning { last: screen });
                }
            }
        }
        true
    }

    fn pointer_move(&mut self, screen: Point) -> bool {
        let canvas = self.viewport.to_canvas(screen);
        log::trace!("move {} at ({:.1}, {:.1})", self.state.name(), screen.x, screen.y);

        let (next, description) = match &mut self.state {
            InteractionState::Idle => return false,
            InteractionState::DraggingNode { nodes, last, scale } => {
                let delta = drag_delta(*last, screen, *scale);
                *last = screen;
                (
                    self.document.move_nodes(nodes, delta.x, delta.y),
                    "Move node",
                )
            }
            InteractionState::ResizingNode {
                node,
                handle,
                origin,
                start,
                scale,
            } => {
                let rect = resize_rect(*start, *handle, drag_delta(*origin, screen, *scale));
                (
                    self.document.update_node(*node, &NodePatch::bounds(rect)),
                    "Resize node",
                )
            }
            InteractionState::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.viewport
                    .pan_with(delta.x, delta.y, self.config.pan_sensitivity);
                return delta != Point::ORIGIN;
            }
            InteractionState::BoxSelecting { current, .. } => {
                *current = canvas;
                return true;
            }
            InteractionState::Connecting {
                from,
                pointer,
                hover,
                ..
            } => {
                *pointer = canvas;
                *hover = hover_target(canvas, *from, &self.document.nodes);
                return true;
            }
        };
        self.commit(next, description)
    }

    fn pointer_up(&mut self, screen: Point, button: PointerButton) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        let canvas = self.viewport.to_canvas(screen);
        let state = std::mem::take(&mut self.state);
        log::debug!("gesture {} -> idle", state.name());

        match state {
            InteractionState::Idle => false,
            InteractionState::DraggingNode { .. } | InteractionState::ResizingNode { .. } => {
                self.history.end_batch(&self.document);
                true
            }
            InteractionState::Panning { .. } => true,
            InteractionState::BoxSelecting { start, .. } => {
                if is_click(start, canvas) {
                    self.selection.clear_multi();
                } else {
                    let rect = Rect::from_corners(start, canvas);
                    let nodes = nodes_in_box(&rect, &self.document.nodes);
                    let edges = edges_in_box(&rect, &self.document);
                    log::debug!("box selected {} nodes, {} edges", nodes.len(), edges.len());
                    self.selection.set_multi(nodes, edges);
                }
                true
            }
            InteractionState::Connecting { from, side, .. } => {
                match connection_target(
                    canvas,
                    Some(from),
                    &self.document.nodes,
                    self.config.connect_tolerance,
                ) {
                    Some(target) => {
                        let edge = Edge::new(EdgeId::generate(), (from, side), (target.node, target.side));
                        self.add_edge(edge);
                    }
                    None => log::debug!("connect from {from} dropped on nothing"),
                }
                true
            }
        }
    }

    fn double_click(&mut self, screen: Point) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        let canvas = self.viewport.to_canvas(screen);
        match self.resolve_press(canvas) {
            PressTarget::Canvas if !self.config.read_only => {
                self.add_node_at(Shape::Process, canvas).is_some()
            }
            PressTarget::NodeBody { node } | PressTarget::NodeText { node } => {
                let Some(path) = self
                    .document
                    .node(node)
                    .and_then(Node::file_path)
                    .map(Path::to_path_buf)
                else {
                    return false;
                };
                match drop::open_action(&path) {
                    OpenAction::Preview => self.host.open_preview(&path),
                    OpenAction::DefaultApp => self.host.open_in_default_app(&path),
                }
                false
            }
            _ => false,
        }
    }

    fn dispatch(&mut self, action: ShortcutAction) -> bool {
        log::debug!("shortcut {}", action.name());
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.state.is_idle() && self.delete_selection(),
            ShortcutAction::SelectAll => {
                self.select_all();
                true
            }
            ShortcutAction::ZoomIn => self.zoom_in(),
            ShortcutAction::ZoomOut => self.zoom_out(),
            ShortcutAction::ResetZoom => self.reset_zoom(),
            ShortcutAction::ZoomToFit => self.zoom_to_fit(),
            ShortcutAction::Cancel => match self.state {
                InteractionState::Connecting { .. } | InteractionState::BoxSelecting { .. } => {
                    self.set_state(InteractionState::Idle);
                    true
                }
                InteractionState::Idle => {
                    let had_selection = !self.selection.is_empty();
                    self.selection.clear();
                    had_selection
                }
                // Pointer-driven gestures end on release only.
                _ => false,
            },
        }
    }
}
