//! Screen ↔ canvas coordinate mapping with pan and zoom.
//!
//! `screen = canvas * scale + offset`, so `canvas = (screen - offset) / scale`.

use crate::geometry::{Point, Rect};
use crate::model::Node;
use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 3.0;
/// Screen pixels of offset per pixel of pointer travel while panning.
pub const PAN_SENSITIVITY: f32 = 0.7;
/// Canvas units of empty space kept around content by `fit_to_content`.
pub const FIT_PADDING: f32 = 50.0;

const ZOOM_OUT_FACTOR: f32 = 0.9;
const ZOOM_IN_FACTOR: f32 = 1.1;

/// On-screen size of the canvas element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Pan/zoom state of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub offset: Point,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Point::ORIGIN,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn to_canvas(&self, screen: Point) -> Point {
        (screen - self.offset) / self.scale
    }

    pub fn to_screen(&self, canvas: Point) -> Point {
        canvas * self.scale + self.offset
    }

    /// Pan by a screen-space pointer delta using the default sensitivity.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_with(dx, dy, PAN_SENSITIVITY);
    }

    /// Pan by a screen-space delta. Not divided by scale, so the perceived
    /// pan speed is the same at every zoom level.
    pub fn pan_with(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.offset = self.offset + Point::new(dx, dy) * sensitivity;
    }

    /// One wheel notch. Positive sign zooms out, negative zooms in; zero is
    /// ignored. Offset is kept, so the zoom is anchored at the viewport origin.
    pub fn zoom(&mut self, sign: f32) {
        let factor = if sign > 0.0 {
            ZOOM_OUT_FACTOR
        } else if sign < 0.0 {
            ZOOM_IN_FACTOR
        } else {
            return;
        };
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn zoom_in(&mut self) {
        self.zoom(-1.0);
    }

    pub fn zoom_out(&mut self) {
        self.zoom(1.0);
    }

    pub fn reset_zoom(&mut self) {
        self.scale = 1.0;
    }

    /// Frame every node: the union bbox padded by [`FIT_PADDING`] is centred
    /// in the viewport, never zooming in past 100%.
    ///
    /// Content too large to fit at [`MIN_SCALE`] stays at [`MIN_SCALE`],
    /// centred, and overflows the viewport.
    ///
    /// Returns `false` and leaves the viewport untouched when there is
    /// nothing to frame.
    pub fn fit_to_content(&mut self, nodes: &[Node], size: ViewportSize) -> bool {
        let Some(content) = content_bounds(nodes) else {
            return false;
        };
        let padded = content.inflate(FIT_PADDING);
        let scale = (size.width / padded.width)
            .min(size.height / padded.height)
            .min(1.0)
            .clamp(MIN_SCALE, MAX_SCALE);

        self.scale = scale;
        self.offset = Point::new(
            (size.width - padded.width * scale) / 2.0 - padded.x * scale,
            (size.height - padded.height * scale) / 2.0 - padded.y * scale,
        );
        log::debug!(
            "fit {} nodes: scale {:.3}, offset ({:.1}, {:.1})",
            nodes.len(),
            self.scale,
            self.offset.x,
            self.offset.y
        );
        true
    }

    /// Visible canvas-space rectangle.
    pub fn visible_rect(&self, size: ViewportSize) -> Rect {
        let top_left = self.to_canvas(Point::ORIGIN);
        Rect::new(
            top_left.x,
            top_left.y,
            size.width / self.scale,
            size.height / self.scale,
        )
    }
}

/// Union of every node's bounding box, or `None` for no nodes.
pub fn content_bounds(nodes: &[Node]) -> Option<Rect> {
    nodes
        .iter()
        .map(Node::bounds)
        .reduce(|acc, b| acc.union(&b))
}
