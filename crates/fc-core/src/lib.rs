pub mod document;
pub mod geometry;
pub mod id;
pub mod model;
pub mod shape;
pub mod viewport;

pub use document::MutationError;
pub use geometry::{Point, Rect, Side};
pub use id::{EdgeId, NodeId};
pub use model::*;
pub use shape::{anchor, visual_bounds};
pub use viewport::{Viewport, ViewportSize};
