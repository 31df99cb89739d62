pub mod commands;
pub mod config;
pub mod drop;
pub mod engine;
pub mod input;
pub mod interaction;
pub mod selection;
pub mod shortcuts;

pub use commands::History;
pub use config::{BoxSelectModifier, EditorConfig};
pub use drop::{AttachmentImporter, DropCoordinator, DropTarget, FileDrop, ImportError};
pub use engine::{EditorEngine, EditorHost, TextSelection};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use interaction::InteractionState;
pub use selection::Selection;
pub use shortcuts::{ShortcutAction, ShortcutMap};
