pub mod hit;
pub mod path;

pub use hit::{ConnectionTarget, PressContext, PressTarget, ResizeHandle, press_target};
pub use path::{EdgeCurve, edge_path, edge_paths, preview_path};
