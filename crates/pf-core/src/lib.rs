pub mod bitmap;
pub mod config;
pub mod id;
pub mod log_sink;
pub mod model;
pub mod store;
pub mod transform;

pub use bitmap::{Bitmap, BitmapError};
pub use config::{CameraConfig, ConfigError, EditorConfig, HighlightPalette};
pub use id::NodeId;
pub use log_sink::{FacadeSink, LogConsole, LogSink};
pub use model::*;
pub use store::{DepthStep, NodeStore, StoreError, StoreEvent};

// Re-export kurbo so downstream crates agree on one geometry version.
pub use kurbo;
