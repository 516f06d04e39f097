pub mod camera;
pub mod editor;
pub mod import;
pub mod input;
pub mod modes;
pub mod panel;
pub mod selection;
pub mod shortcuts;
pub mod sync;

pub use camera::Camera;
pub use editor::{Editor, Notification, NotificationKind};
pub use import::{ImageSource, ImportError, ImportedImage, MemorySource};
pub use input::InputEvent;
pub use modes::{EditMode, ModeEffect, ModeError, ModeMachine};
pub use panel::{NodeProperties, PropertyEdit};
pub use selection::{Hit, SelectionController};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use sync::{RenderSync, SyncReport};
