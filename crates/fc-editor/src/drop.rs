//! File-drop import.
//!
//! Turns a list of dropped files into file nodes stacked vertically below
//! the drop point. Copying the files into storage is the job of an external
//! [`AttachmentImporter`]; this module only decides where nodes go and what
//! happens when an individual import fails (the file is skipped).

use fc_core::geometry::{Point, Rect};
use fc_core::id::NodeId;
use fc_core::model::{Node, NodePayload, Shape};
use fc_core::viewport::Viewport;
use std::path::{Path, PathBuf};

/// Extensions laid out with the larger image footprint.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp"];

/// Extensions the host can show in its built-in preview.
pub const PREVIEW_EXTENSIONS: [&str; 13] = [
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "pdf", "md", "txt", "mp3", "mp4", "webm",
];

/// Canvas point used when a drop carries no position.
pub const DEFAULT_DROP_ANCHOR: Point = Point::new(100.0, 100.0);

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Other,
}

impl FileKind {
    pub fn of(path: &Path) -> Self {
        match extension(path) {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => FileKind::Image,
            _ => FileKind::Other,
        }
    }

    /// Node size for a file of this kind.
    pub fn size(self) -> (f32, f32) {
        match self {
            FileKind::Image => (250.0, 200.0),
            FileKind::Other => (240.0, 160.0),
        }
    }

    /// Vertical distance to the next node in a dropped stack.
    pub fn step(self) -> f32 {
        match self {
            FileKind::Image => 220.0,
            FileKind::Other => 180.0,
        }
    }
}

/// How a file node opens on double-click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAction {
    Preview,
    DefaultApp,
}

pub fn open_action(path: &Path) -> OpenAction {
    match extension(path) {
        Some(ext) if PREVIEW_EXTENSIONS.contains(&ext.as_str()) => OpenAction::Preview,
        _ => OpenAction::DefaultApp,
    }
}

/// Files dropped onto a canvas, as delivered by the host's drag-drop bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDrop {
    /// Absolute source paths.
    pub paths: Vec<PathBuf>,
    /// Screen-space drop point, if the bridge reported one.
    pub position: Option<Point>,
}

/// Canvas point the first dropped node is placed at.
pub fn drop_anchor(position: Option<Point>, viewport: &Viewport) -> Point {
    position.map_or(DEFAULT_DROP_ANCHOR, |p| viewport.to_canvas(p))
}

/// File nodes for already-stored paths, stacked downward from `anchor`.
pub fn layout_files(stored: &[PathBuf], anchor: Point) -> Vec<Node> {
    let mut y = anchor.y;
    stored
        .iter()
        .map(|path| {
            let kind = FileKind::of(path);
            let (width, height) = kind.size();
            let node = Node::new(NodeId::generate(), Shape::Process, anchor.x, y)
                .with_size(width, height)
                .with_payload(NodePayload::File { path: path.clone() });
            y += kind.step();
            node
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("import of {path} rejected: {reason}")]
    Rejected { path: PathBuf, reason: String },
}

/// The external pipeline that copies a dropped file into storage.
pub trait AttachmentImporter {
    /// Store `source` on behalf of `owner` (the note or canvas receiving the
    /// drop) and return the stored path.
    fn import_attachment(&mut self, source: &Path, owner: &str) -> Result<PathBuf, ImportError>;
}

/// Import every dropped file and lay out nodes for the ones that succeeded.
/// Failures are logged and skipped; they do not leave gaps in the stack.
pub fn import_drop(
    importer: &mut dyn AttachmentImporter,
    drop: &FileDrop,
    owner: &str,
    viewport: &Viewport,
) -> Vec<Node> {
    let stored: Vec<PathBuf> = drop
        .paths
        .iter()
        .filter_map(|source| match importer.import_attachment(source, owner) {
            Ok(stored) => Some(stored),
            Err(err) => {
                log::warn!("skipping dropped file: {err}");
                None
            }
        })
        .collect();
    layout_files(&stored, drop_anchor(drop.position, viewport))
}

// ─── Drop target coordination ────────────────────────────────────────────

/// Anything that accepts file drops inside a screen-space region.
pub trait DropTarget {
    /// Region in window coordinates.
    fn screen_bounds(&self) -> Rect;

    /// Receive a drop whose position has been made relative to
    /// `screen_bounds()`.
    fn accept(&mut self, drop: FileDrop);
}

/// Handle returned by [`DropCoordinator::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropTargetId(usize);

/// Routes a window-level drop to the registered target under the pointer.
/// Owners register themselves explicitly; there is no global lookup table.
#[derive(Default)]
pub struct DropCoordinator {
    targets: Vec<(DropTargetId, Box<dyn DropTarget>)>,
    next_id: usize,
}

impl DropCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, target: Box<dyn DropTarget>) -> DropTargetId {
        let id = DropTargetId(self.next_id);
        self.next_id += 1;
        self.targets.push((id, target));
        id
    }

    pub fn unregister(&mut self, id: DropTargetId) -> Option<Box<dyn DropTarget>> {
        let pos = self.targets.iter().position(|(tid, _)| *tid == id)?;
        Some(self.targets.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Deliver `drop` to the first registered target containing its position.
    /// A drop without a position goes to the first target. Returns the
    /// receiver, or `None` when nothing accepted it.
    pub fn dispatch(&mut self, mut drop: FileDrop) -> Option<DropTargetId> {
        let (id, target) = match drop.position {
            Some(p) => self
                .targets
                .iter_mut()
                .find(|(_, t)| t.screen_bounds().contains(p))?,
            None => self.targets.first_mut()?,
        };
        let origin = target.screen_bounds();
        drop.position = drop
            .position
            .map(|p| p - Point::new(origin.x, origin.y));
        target.accept(drop);
        Some(*id)
    }
}
