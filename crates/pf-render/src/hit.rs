//! Hit queries: scene point → render nodes.
//!
//! Regions are tested in each node's local space, so rotation, scale and
//! parenting are all handled by the inverse world transform. Only sprites and
//! anchor indicators are hittable; outlines and the scene root never are.

use crate::graph::{RenderGraph, RenderId, RenderKind};
use pf_core::kurbo::{Point, Rect, Size};
use pf_core::transform::{checked_inverse, content_rect};

/// Every hittable node whose region contains `point` (scene space), front
/// to back.
pub fn nodes_at(graph: &RenderGraph, point: Point) -> Vec<RenderId> {
    let mut sequence = graph.paint_sequence();
    sequence.reverse();
    sequence.retain(|id| contains(graph, *id, point));
    sequence
}

/// Whether `point` (scene space) lies in the node's hit region.
pub fn contains(graph: &RenderGraph, id: RenderId, point: Point) -> bool {
    let Some(node) = graph.get(id) else {
        return false;
    };
    let region = match &node.kind {
        RenderKind::Sprite { .. } => content_rect(node.size(), node.anchor),
        RenderKind::AnchorIndicator { size, .. } => Rect::from_center_size(Point::ZERO, Size::new(*size, *size)),
        RenderKind::Scene | RenderKind::Outline { .. } => return false,
    };
    local_point(graph, id, point).is_some_and(|local| region.contains(local))
}

/// `point` (scene space) in the node's local space. `None` if the node is
/// missing or collapsed to zero scale.
pub fn local_point(graph: &RenderGraph, id: RenderId, point: Point) -> Option<Point> {
    graph.get(id)?;
    let inverse = checked_inverse(graph.world_transform(id))?;
    Some(inverse * point)
}

/// Alpha of the sprite texel under `point` (scene space). `None` for
/// non-sprites and for points outside the image.
pub fn sample_alpha(graph: &RenderGraph, id: RenderId, point: Point) -> Option<u8> {
    let node = graph.get(id)?;
    let RenderKind::Sprite { bitmap } = &node.kind else {
        return None;
    };
    let size = bitmap.size();
    let local = local_point(graph, id, point)?;
    let uv = Point::new(
        (local.x + size.width * node.anchor.x) / size.width,
        (local.y + size.height * node.anchor.y) / size.height,
    );
    bitmap.alpha_at(uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RenderNode;
    use pf_core::{Bitmap, Color};
    use pretty_assertions::assert_eq;
    use std::f64::consts::FRAC_PI_2;
    use std::sync::Arc;

    /// 4x4 opaque bitmap with a transparent top-left texel.
    fn cornered() -> Arc<Bitmap> {
        let mut bitmap = Bitmap::filled(4, 4, [255, 255, 255, 255]).unwrap();
        bitmap.set_pixel(0, 0, [0, 0, 0, 0]);
        Arc::new(bitmap)
    }

    #[test]
    fn front_to_back() {
        let mut graph = RenderGraph::new();
        let root = graph.root();
        let back = graph.add_child(root, RenderNode::sprite("back-EDT-", cornered())).unwrap();
        let front = graph.add_child(root, RenderNode::sprite("front-EDT-", cornered())).unwrap();
        graph.get_mut(back).unwrap().paint_order = 1;
        graph.get_mut(front).unwrap().paint_order = 2;

        assert_eq!(nodes_at(&graph, Point::new(0.5, 0.5)), vec![front, back]);
        assert!(nodes_at(&graph, Point::new(50.0, 0.0)).is_empty());
    }

    #[test]
    fn outlines_are_not_hit() {
        let mut graph = RenderGraph::new();
        let sprite = graph.add_child(graph.root(), RenderNode::sprite("s-EDT-", cornered())).unwrap();
        graph.add_child(sprite, RenderNode::outline(Color::MAGENTA, 4.0)).unwrap();
        assert_eq!(nodes_at(&graph, Point::ZERO), vec![sprite]);
    }

    #[test]
    fn indicator_is_hit_around_the_anchor() {
        let mut graph = RenderGraph::new();
        let sprite = graph.add_child(graph.root(), RenderNode::sprite("s-EDT-", cornered())).unwrap();
        let indicator = graph
            .add_child(sprite, RenderNode::anchor_indicator(Color::MAGENTA, 10.0))
            .unwrap();
        graph.get_mut(sprite).unwrap().position = Point::new(100.0, 100.0);

        assert_eq!(nodes_at(&graph, Point::new(104.0, 96.0)), vec![indicator]);
        assert_eq!(nodes_at(&graph, Point::new(101.0, 101.0)), vec![indicator, sprite]);
    }

    #[test]
    fn sample_alpha_is_y_up() {
        let mut graph = RenderGraph::new();
        let sprite = graph.add_child(graph.root(), RenderNode::sprite("s-EDT-", cornered())).unwrap();

        // Anchor centered: the image spans [-2, 2] on both axes, top row at y > 0.
        assert_eq!(sample_alpha(&graph, sprite, Point::new(-1.5, 1.5)), Some(0));
        assert_eq!(sample_alpha(&graph, sprite, Point::new(-1.5, -1.5)), Some(255));
        assert_eq!(sample_alpha(&graph, sprite, Point::new(1.5, 1.5)), Some(255));
        assert_eq!(sample_alpha(&graph, sprite, Point::new(9.0, 0.0)), None);
        assert_eq!(sample_alpha(&graph, graph.root(), Point::ZERO), None);
    }

    #[test]
    fn sample_alpha_follows_rotation_and_anchor() {
        let mut graph = RenderGraph::new();
        let sprite = graph.add_child(graph.root(), RenderNode::sprite("s-EDT-", cornered())).unwrap();
        {
            let node = graph.get_mut(sprite).unwrap();
            node.anchor = Point::new(0.0, 0.0);
            node.rotation = FRAC_PI_2;
            node.position = Point::new(10.0, 10.0);
        }
        // Local top-left texel center (0.5, 3.5) lands at (10 - 3.5, 10 + 0.5).
        assert_eq!(sample_alpha(&graph, sprite, Point::new(6.5, 10.5)), Some(0));
        assert_eq!(sample_alpha(&graph, sprite, Point::new(9.5, 10.5)), Some(255));
    }

    #[test]
    fn collapsed_scale_is_never_hit() {
        let mut graph = RenderGraph::new();
        let sprite = graph.add_child(graph.root(), RenderNode::sprite("s-EDT-", cornered())).unwrap();
        graph.get_mut(sprite).unwrap().scale_x = 0.0;
        assert!(nodes_at(&graph, Point::ZERO).is_empty());
        assert_eq!(sample_alpha(&graph, sprite, Point::ZERO), None);
    }
}
