//! Core data model for diagram documents.
//!
//! A document is two flat lists: nodes (boxes of a given shape) and edges
//! (connections between two node sides). Edges refer to nodes by id only,
//! so an edge may outlive its endpoints; such "dangling" edges are tolerated
//! and skipped by every consumer.

use crate::geometry::{Point, Rect, Side};
use crate::id::{EdgeId, NodeId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

/// Smallest width a node may have after any mutation.
pub const MIN_NODE_WIDTH: f32 = 80.0;
/// Smallest height a node may have after any mutation.
pub const MIN_NODE_HEIGHT: f32 = 60.0;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0], exchanged as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let channels: Vec<u8> = match bytes.len() {
            3 | 4 => bytes
                .iter()
                .map(|&c| hex_val(c).map(|v| v * 17))
                .collect::<Option<_>>()?,
            6 | 8 => bytes
                .chunks(2)
                .map(|pair| Some(hex_val(pair[0])? << 4 | hex_val(pair[1])?))
                .collect::<Option<_>>()?,
            _ => return None,
        };

        let unit = |v: u8| v as f32 / 255.0;
        Some(Self::rgba(
            unit(channels[0]),
            unit(channels[1]),
            unit(channels[2]),
            channels.get(3).copied().map_or(1.0, unit),
        ))
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (byte(self.r), byte(self.g), byte(self.b), byte(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("bad color `{s}`")))
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Flowchart shape of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Process,
    Terminal,
    Decision,
    Io,
    Subroutine,
    Database,
}

impl Shape {
    /// Size given to freshly inserted nodes of this shape.
    pub fn default_size(self) -> (f32, f32) {
        match self {
            Shape::Process | Shape::Subroutine | Shape::Io => (200.0, 100.0),
            Shape::Terminal => (180.0, 80.0),
            Shape::Decision | Shape::Database => (160.0, 120.0),
        }
    }
}

/// What a node shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodePayload {
    Text { text: String },
    File { path: PathBuf },
}

impl Default for NodePayload {
    fn default() -> Self {
        NodePayload::Text {
            text: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub shape: Shape,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default)]
    pub payload: NodePayload,
}

impl Node {
    /// A text node with the shape's default size, top-left at `(x, y)`.
    pub fn new(id: NodeId, shape: Shape, x: f32, y: f32) -> Self {
        let (width, height) = shape.default_size();
        Self {
            id,
            shape,
            x,
            y,
            width,
            height,
            color: None,
            payload: NodePayload::default(),
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self.clamp_size();
        self
    }

    pub fn with_payload(mut self, payload: NodePayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Enforce the minimum node size, keeping the top-left corner.
    pub fn clamp_size(&mut self) {
        self.width = self.width.max(MIN_NODE_WIDTH);
        self.height = self.height.max(MIN_NODE_HEIGHT);
    }

    pub fn file_path(&self) -> Option<&std::path::Path> {
        match &self.payload {
            NodePayload::File { path } => Some(path),
            NodePayload::Text { .. } => None,
        }
    }
}

/// Partial node update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePatch {
    pub shape: Option<Shape>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// `Some(None)` clears the color.
    pub color: Option<Option<Color>>,
    pub payload: Option<NodePayload>,
}

impl NodePatch {
    pub fn bounds(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Self::default()
        }
    }

    pub(crate) fn apply(&self, node: &mut Node) {
        if let Some(shape) = self.shape {
            node.shape = shape;
        }
        if let Some(x) = self.x {
            node.x = x;
        }
        if let Some(y) = self.y {
            node.y = y;
        }
        if let Some(width) = self.width {
            node.width = width;
        }
        if let Some(height) = self.height {
            node.height = height;
        }
        if let Some(color) = self.color {
            node.color = color;
        }
        if let Some(payload) = &self.payload {
            node.payload = payload.clone();
        }
        node.clamp_size();
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub from_node: NodeId,
    pub from_side: Side,
    pub to_node: NodeId,
    pub to_side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Edge {
    pub fn new(id: EdgeId, from: (NodeId, Side), to: (NodeId, Side)) -> Self {
        Self {
            id,
            from_node: from.0,
            from_side: from.1,
            to_node: to.0,
            to_side: to.1,
            color: None,
        }
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.from_node == node || self.to_node == node
    }
}

/// Partial edge update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgePatch {
    pub from_side: Option<Side>,
    pub to_side: Option<Side>,
    /// `Some(None)` clears the color.
    pub color: Option<Option<Color>>,
}

impl EdgePatch {
    pub(crate) fn apply(&self, edge: &mut Edge) {
        if let Some(side) = self.from_side {
            edge.from_side = side;
        }
        if let Some(side) = self.to_side {
            edge.to_side = side;
        }
        if let Some(color) = self.color {
            edge.color = color;
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The persisted diagram: owned by the host and passed in and out by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}
