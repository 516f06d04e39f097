//! Selection & highlight controller.
//!
//! Owns the single selection target and the visual feedback attached to it:
//! outlines (child render nodes of the highlighted sprites) and the anchor
//! indicator (a child of the target at its local origin, which is where the
//! anchor sits). All lookups go through [`RenderSync`]; render nodes never
//! point back at the store.

use crate::sync::RenderSync;
use pf_core::kurbo::{Point, Vec2};
use pf_core::{Color, NodeId};
use pf_render::graph::{RenderGraph, RenderId, RenderKind, RenderNode};
use pf_render::hit;
use std::collections::HashMap;

/// What a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// The target's anchor indicator.
    AnchorIndicator,
    /// An editable node, opaque under the pointer.
    Node(NodeId),
}

/// Outline stroke width and anchor handle size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightStyle {
    pub outline_width: f64,
    pub indicator_size: f64,
}

#[derive(Debug)]
pub struct SelectionController {
    target: Option<NodeId>,
    /// Outline render node per highlighted store node.
    outlines: HashMap<NodeId, RenderId>,
    indicator: Option<RenderId>,
    style: HighlightStyle,
}

impl SelectionController {
    pub fn new(style: HighlightStyle) -> Self {
        Self {
            target: None,
            outlines: HashMap::new(),
            indicator: None,
            style,
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn is_highlighted(&self, id: NodeId) -> bool {
        self.outlines.contains_key(&id)
    }

    /// Nodes currently carrying an outline.
    pub fn highlighted(&self) -> Vec<NodeId> {
        self.outlines.keys().copied().collect()
    }

    pub fn indicator(&self) -> Option<RenderId> {
        self.indicator
    }

    // ─── Hit testing ─────────────────────────────────────────────────────

    /// Resolve a scene point, front to back. The target's anchor indicator
    /// wins over anything under it; otherwise the first editable sprite
    /// whose texel under the point has alpha above `alpha_threshold`.
    pub fn pick(&self, graph: &RenderGraph, sync: &RenderSync, point: Point, alpha_threshold: u8) -> Option<Hit> {
        for render in hit::nodes_at(graph, point) {
            if Some(render) == self.indicator {
                return Some(Hit::AnchorIndicator);
            }
            if let Some(node) = self.accept(graph, sync, render, point, alpha_threshold) {
                return Some(Hit::Node(node));
            }
        }
        None
    }

    /// The topmost opaque editable node at `point`, ignoring the indicator.
    pub fn hit_test(&self, graph: &RenderGraph, sync: &RenderSync, point: Point, alpha_threshold: u8) -> Option<NodeId> {
        hit::nodes_at(graph, point)
            .into_iter()
            .find_map(|render| self.accept(graph, sync, render, point, alpha_threshold))
    }

    fn accept(
        &self,
        graph: &RenderGraph,
        sync: &RenderSync,
        render: RenderId,
        point: Point,
        alpha_threshold: u8,
    ) -> Option<NodeId> {
        if !graph.get(render)?.is_editable() {
            return None;
        }
        let alpha = hit::sample_alpha(graph, render, point)?;
        if alpha <= alpha_threshold {
            return None;
        }
        sync.node_id(render)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Make `id` the target: clear the previous target's highlight and
    /// indicator, outline `id` in `color`, and put the indicator on its anchor.
    pub fn select(&mut self, graph: &mut RenderGraph, sync: &RenderSync, id: NodeId, color: Color) {
        if let Some(previous) = self.target {
            self.unhighlight(graph, sync, previous);
        }
        self.remove_indicator(graph, sync);
        self.target = Some(id);
        self.highlight(graph, sync, id, color);
        self.place_indicator(graph, sync, color);
        log::debug!("selection: {id:?}");
    }

    /// Clear the target, every outline and the indicator.
    pub fn deselect(&mut self, graph: &mut RenderGraph, sync: &RenderSync) {
        for id in self.highlighted() {
            self.unhighlight(graph, sync, id);
        }
        self.remove_indicator(graph, sync);
        if self.target.take().is_some() {
            log::debug!("selection: cleared");
        }
    }

    /// Outline `id` in `color`, or recolor its existing outline.
    pub fn highlight(&mut self, graph: &mut RenderGraph, sync: &RenderSync, id: NodeId, color: Color) {
        let Some(sprite) = sync.render_id(id) else {
            return;
        };
        if let Some(&outline) = self.outlines.get(&id)
            && graph.parent(outline) == Some(sprite)
            && let Some(node) = graph.get_mut(outline)
        {
            node.kind = RenderKind::Outline {
                color,
                width: self.style.outline_width,
            };
            return;
        }
        if let Some(outline) = graph.add_child(sprite, RenderNode::outline(color, self.style.outline_width)) {
            self.outlines.insert(id, outline);
        }
    }

    /// Remove the outline of `id`, if any.
    pub fn unhighlight(&mut self, graph: &mut RenderGraph, sync: &RenderSync, id: NodeId) {
        let Some(outline) = self.outlines.remove(&id) else {
            return;
        };
        // The outline went away with its sprite if the sprite was removed,
        // and the index may since have been reused.
        if sync.render_id(id).is_some_and(|sprite| graph.parent(outline) == Some(sprite)) {
            graph.remove(outline);
        }
    }

    /// Recolor the indicator to match the target's outline.
    pub fn recolor_indicator(&mut self, graph: &mut RenderGraph, color: Color) {
        if let Some(indicator) = self.indicator
            && let Some(node) = graph.get_mut(indicator)
            && let RenderKind::AnchorIndicator { size, .. } = node.kind
        {
            node.kind = RenderKind::AnchorIndicator { color, size };
        }
    }

    /// Drop all bookkeeping for a node that left the store. Its render
    /// subtree, outlines and indicator included, is already gone.
    pub fn forget(&mut self, id: NodeId) {
        self.outlines.remove(&id);
        if self.target == Some(id) {
            self.target = None;
            self.indicator = None;
        }
    }

    // ─── Anchor indicator ────────────────────────────────────────────────

    fn place_indicator(&mut self, graph: &mut RenderGraph, sync: &RenderSync, color: Color) {
        let Some(sprite) = self.target.and_then(|t| sync.render_id(t)) else {
            return;
        };
        self.indicator = graph.add_child(sprite, RenderNode::anchor_indicator(color, self.style.indicator_size));
    }

    fn remove_indicator(&mut self, graph: &mut RenderGraph, sync: &RenderSync) {
        let Some(indicator) = self.indicator.take() else {
            return;
        };
        let sprite = self.target.and_then(|t| sync.render_id(t));
        if sprite.is_some() && graph.parent(indicator) == sprite {
            graph.remove(indicator);
        }
    }

    /// Indicator offset from the target's anchor, in the target's local space.
    pub fn indicator_offset(&self, graph: &RenderGraph) -> Option<Vec2> {
        let node = graph.get(self.indicator?)?;
        Some(node.position.to_vec2())
    }

    /// Move the indicator by `delta` (target-local units).
    pub fn nudge_indicator(&mut self, graph: &mut RenderGraph, delta: Vec2) {
        if let Some(indicator) = self.indicator
            && let Some(node) = graph.get_mut(indicator)
        {
            node.position += delta;
        }
    }

    /// Put the indicator back on the anchor.
    pub fn reset_indicator(&mut self, graph: &mut RenderGraph) {
        if let Some(indicator) = self.indicator
            && let Some(node) = graph.get_mut(indicator)
        {
            node.position = Point::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::{Bitmap, NodePatch, NodeStore};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const STYLE: HighlightStyle = HighlightStyle {
        outline_width: 4.0,
        indicator_size: 10.0,
    };

    struct Fixture {
        store: NodeStore,
        graph: RenderGraph,
        sync: RenderSync,
        selection: SelectionController,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: NodeStore::new(),
                graph: RenderGraph::new(),
                sync: RenderSync::new(),
                selection: SelectionController::new(STYLE),
            }
        }

        fn add(&mut self, name: &str, bitmap: Bitmap, at: Point) -> NodeId {
            let id = self.store.insert_image(name, Arc::new(bitmap));
            self.store.set_field(id, NodePatch::position(at)).unwrap();
            self.sync.sync(&self.store, &mut self.graph);
            id
        }

        fn pick(&self, at: Point) -> Option<Hit> {
            self.selection.pick(&self.graph, &self.sync, at, 20)
        }
    }

    fn opaque() -> Bitmap {
        Bitmap::filled(40, 40, [255, 255, 255, 255]).unwrap()
    }

    #[test]
    fn transparent_texels_fall_through() {
        let mut fx = Fixture::new();
        let back = fx.add("back.png", opaque(), Point::ZERO);
        // Front image is opaque except for a faint left half.
        let mut front = Bitmap::filled(40, 40, [0, 0, 0, 10]).unwrap();
        for row in 0..40 {
            for x in 20..40 {
                front.set_pixel(x, row, [0, 0, 0, 255]);
            }
        }
        let front = fx.add("front.png", front, Point::ZERO);

        assert_eq!(fx.pick(Point::new(-10.0, 0.0)), Some(Hit::Node(back)));
        assert_eq!(fx.pick(Point::new(10.0, 0.0)), Some(Hit::Node(front)));
        assert_eq!(fx.pick(Point::new(100.0, 0.0)), None);
    }

    #[test]
    fn non_editable_sprites_are_skipped() {
        let mut fx = Fixture::new();
        let node = fx.add("a.png", opaque(), Point::ZERO);
        let root = fx.graph.root();
        let decoration = fx
            .graph
            .add_child(root, RenderNode::sprite("background", Arc::new(opaque())))
            .unwrap();
        fx.graph.get_mut(decoration).unwrap().paint_order = 99;
        assert_eq!(fx.pick(Point::ZERO), Some(Hit::Node(node)));
    }

    #[test]
    fn select_moves_highlight_and_indicator() {
        let mut fx = Fixture::new();
        let a = fx.add("a.png", opaque(), Point::ZERO);
        let b = fx.add("b.png", opaque(), Point::new(100.0, 0.0));

        fx.selection.select(&mut fx.graph, &fx.sync, a, Color::MAGENTA);
        assert_eq!(fx.selection.target(), Some(a));
        assert!(fx.selection.is_highlighted(a));
        let indicator = fx.selection.indicator().unwrap();
        assert_eq!(fx.graph.parent(indicator), fx.sync.render_id(a));
        assert_eq!(fx.pick(Point::new(1.0, 1.0)), Some(Hit::AnchorIndicator));

        fx.selection.select(&mut fx.graph, &fx.sync, b, Color::MAGENTA);
        assert!(!fx.selection.is_highlighted(a));
        assert!(fx.selection.is_highlighted(b));
        assert!(!fx.graph.contains(indicator) || fx.graph.parent(indicator) == fx.sync.render_id(b));
        assert_eq!(fx.pick(Point::new(1.0, 1.0)), Some(Hit::Node(a)));
        // Only the two sprites, one outline and one indicator remain.
        assert_eq!(fx.graph.len(), 5);
    }

    #[test]
    fn highlight_recolors_in_place() {
        let mut fx = Fixture::new();
        let a = fx.add("a.png", opaque(), Point::ZERO);
        fx.selection.select(&mut fx.graph, &fx.sync, a, Color::MAGENTA);
        let before = fx.graph.len();
        fx.selection.highlight(&mut fx.graph, &fx.sync, a, Color::ORANGE);
        assert_eq!(fx.graph.len(), before);
        let outline = fx.graph.children(fx.sync.render_id(a).unwrap())[0];
        match fx.graph.get(outline).unwrap().kind {
            RenderKind::Outline { color, .. } => assert_eq!(color, Color::ORANGE),
            ref other => panic!("expected outline, got {other:?}"),
        }
    }

    #[test]
    fn deselect_clears_everything() {
        let mut fx = Fixture::new();
        let a = fx.add("a.png", opaque(), Point::ZERO);
        let b = fx.add("b.png", opaque(), Point::new(100.0, 0.0));
        fx.selection.select(&mut fx.graph, &fx.sync, a, Color::CYAN);
        fx.selection.highlight(&mut fx.graph, &fx.sync, b, Color::CYAN);

        fx.selection.deselect(&mut fx.graph, &fx.sync);
        assert_eq!(fx.selection.target(), None);
        assert!(fx.selection.highlighted().is_empty());
        assert!(fx.selection.indicator().is_none());
        assert_eq!(fx.graph.len(), 3);
    }

    #[test]
    fn indicator_nudges_and_resets() {
        let mut fx = Fixture::new();
        let a = fx.add("a.png", opaque(), Point::ZERO);
        fx.selection.select(&mut fx.graph, &fx.sync, a, Color::MAGENTA);
        fx.selection.nudge_indicator(&mut fx.graph, Vec2::new(3.0, -2.0));
        fx.selection.nudge_indicator(&mut fx.graph, Vec2::new(1.0, 0.0));
        assert_eq!(fx.selection.indicator_offset(&fx.graph), Some(Vec2::new(4.0, -2.0)));
        fx.selection.reset_indicator(&mut fx.graph);
        assert_eq!(fx.selection.indicator_offset(&fx.graph), Some(Vec2::ZERO));
    }
}
