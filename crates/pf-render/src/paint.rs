//! Render graph → Vello drawing commands.
//!
//! Walks the graph in paint sequence and emits Vello operations: sprites as
//! images, outlines as stroked rounded rectangles, the anchor indicator as a
//! filled dot with a crosshair. Everything is placed through the graph's
//! view transform.

use crate::graph::{RenderGraph, RenderId, RenderKind, RenderNode};
use pf_core::kurbo::{Affine, Circle, Line, Point, Rect, Size, Stroke};
use pf_core::transform::content_rect;
use pf_core::{Bitmap, Color as ModelColor};
use peniko::{Blob, Color, Fill, Image, ImageFormat};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use vello::Scene;

/// Anything that can show a render graph.
pub trait Presenter {
    fn present(&mut self, graph: &RenderGraph);
}

/// Builds a fresh `vello::Scene` per frame. The host renders
/// [`VelloPresenter::scene`] with its own wgpu surface.
#[derive(Default)]
pub struct VelloPresenter {
    scene: Scene,
    /// Uploaded images keyed by bitmap id; pruned to the bitmaps drawn in
    /// the last frame.
    images: HashMap<u64, Image>,
    background: Option<ModelColor>,
}

impl VelloPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(mut self, color: ModelColor) -> Self {
        self.background = Some(color);
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    fn image_for(&mut self, bitmap: &Bitmap) -> Image {
        self.images
            .entry(bitmap.id())
            .or_insert_with(|| {
                let data: Arc<dyn AsRef<[u8]> + Send + Sync> = bitmap.pixels().clone();
                Image::new(Blob::new(data), ImageFormat::Rgba8, bitmap.width(), bitmap.height())
            })
            .clone()
    }
}

impl Presenter for VelloPresenter {
    fn present(&mut self, graph: &RenderGraph) {
        self.scene.reset();
        let view = graph.view();

        if let Some(bg) = self.background {
            // Large enough to cover any viewport the view transform maps to.
            let cover = Rect::new(-1e6, -1e6, 1e6, 1e6);
            self.scene
                .fill(Fill::NonZero, Affine::IDENTITY, to_peniko(bg, 1.0), None, &cover);
        }

        let mut live = HashSet::new();
        for id in graph.paint_sequence() {
            let Some(node) = graph.get(id) else { continue };
            let transform = view * graph.world_transform(id);
            match &node.kind {
                RenderKind::Scene => {}
                RenderKind::Sprite { bitmap } => {
                    live.insert(bitmap.id());
                    let image = self.image_for(bitmap).with_alpha(node.opacity.clamp(0.0, 1.0) as f32);
                    let placement = transform * sprite_transform(bitmap.size(), node.anchor);
                    self.scene.draw_image(&image, placement);
                }
                RenderKind::Outline { color, width } => {
                    if let Some(frame) = outline_frame(graph, id) {
                        let shape = frame.to_rounded_rect(*width);
                        let stroke = Stroke::new(*width);
                        self.scene
                            .stroke(&stroke, transform, to_peniko(*color, node.opacity), None, &shape);
                    }
                }
                RenderKind::AnchorIndicator { color, size } => {
                    paint_indicator(&mut self.scene, transform, *color, *size, node);
                }
            }
        }
        self.images.retain(|id, _| live.contains(id));
        log::trace!("paint: {} nodes, {} images", graph.len(), self.images.len());
    }
}

/// Maps image pixel space (origin top-left, y down) onto a sprite's local
/// space (origin at the anchor, y up).
pub fn sprite_transform(size: Size, anchor: Point) -> Affine {
    Affine::translate((-anchor.x * size.width, (1.0 - anchor.y) * size.height))
        * Affine::scale_non_uniform(1.0, -1.0)
}

/// The content rectangle of an outline's parent sprite, in the outline's
/// (identical) local space.
fn outline_frame(graph: &RenderGraph, outline: RenderId) -> Option<Rect> {
    let parent = graph.get(graph.parent(outline)?)?;
    match parent.kind {
        RenderKind::Sprite { .. } => Some(content_rect(parent.size(), parent.anchor)),
        _ => None,
    }
}

fn paint_indicator(scene: &mut Scene, transform: Affine, color: ModelColor, size: f64, node: &RenderNode) {
    let half = size / 2.0;
    let brush = to_peniko(color, node.opacity);
    scene.fill(
        Fill::NonZero,
        transform,
        brush,
        None,
        &Circle::new(Point::ZERO, size / 8.0),
    );
    let stroke = Stroke::new((size / 15.0).max(1.0));
    scene.stroke(&stroke, transform, brush, None, &Line::new((-half, 0.0), (half, 0.0)));
    scene.stroke(&stroke, transform, brush, None, &Line::new((0.0, -half), (0.0, half)));
}

fn to_peniko(color: ModelColor, opacity: f64) -> Color {
    let [r, g, b, a] = faded_rgba8(color, opacity);
    Color::from_rgba8(r, g, b, a)
}

/// `color` as RGBA8 with its alpha multiplied by `opacity`.
fn faded_rgba8(color: ModelColor, opacity: f64) -> [u8; 4] {
    let [r, g, b, a] = color.to_rgba8();
    let alpha = (a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
    [r, g, b, alpha]
}
