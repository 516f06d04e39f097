pub mod graph;
pub mod hit;
pub mod paint;

pub use graph::{Placement, RenderGraph, RenderId, RenderKind, RenderNode};
pub use hit::{nodes_at, sample_alpha};
pub use paint::{Presenter, VelloPresenter};
