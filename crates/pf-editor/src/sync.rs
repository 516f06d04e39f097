//! Render graph sync: node store → render graph.
//!
//! The store is the only source of truth; the render graph holds a
//! projection of it. `RenderSync` owns the id mapping between the two and
//! reconciles them in one pass:
//!
//! 1. Render nodes whose store node is gone are removed. Their mapped
//!    children are first moved to the scene root so an orphan survives its
//!    parent's deletion.
//! 2. Store nodes without a render node get one. Existing render nodes are
//!    always updated in place, never recreated.
//! 3. Render parents are matched to `parent_id`.
//! 4. Transform, opacity, anchor, tag and bitmap are copied over.
//! 5. Paint order is reassigned from the store's paint order as a dense,
//!    strictly increasing sequence, so gaps or ties in ranks never leak into
//!    draw order.

use pf_core::{Node, NodeId, NodeStore};
use pf_render::{Placement, RenderGraph, RenderId, RenderKind, RenderNode};
use std::collections::HashMap;
use std::sync::Arc;

/// What one sync pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub removed: usize,
    pub reparented: usize,
}

#[derive(Debug, Default)]
pub struct RenderSync {
    to_render: HashMap<NodeId, RenderId>,
    to_node: HashMap<RenderId, NodeId>,
}

impl RenderSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_id(&self, id: NodeId) -> Option<RenderId> {
        self.to_render.get(&id).copied()
    }

    pub fn node_id(&self, render: RenderId) -> Option<NodeId> {
        self.to_node.get(&render).copied()
    }

    pub fn len(&self) -> usize {
        self.to_render.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_render.is_empty()
    }

    /// Reconcile `graph` with `store`.
    pub fn sync(&mut self, store: &NodeStore, graph: &mut RenderGraph) -> SyncReport {
        let mut report = SyncReport::default();
        let root = graph.root();

        // ── 1. Drop render nodes whose store node is gone ──
        let stale: Vec<NodeId> = self
            .to_render
            .keys()
            .filter(|id| !store.contains(**id))
            .copied()
            .collect();
        for id in stale {
            let Some(render) = self.to_render.remove(&id) else { continue };
            self.to_node.remove(&render);
            for child in graph.children(render) {
                if self.to_node.contains_key(&child) {
                    graph.reparent(child, root, Placement::KeepLocal);
                }
            }
            graph.remove(render);
            report.removed += 1;
        }

        // ── 2. Create missing render nodes ──
        for node in store.iter() {
            if self.to_render.contains_key(&node.id()) {
                continue;
            }
            let sprite = RenderNode::sprite(node.display_name.clone(), node.image.clone());
            let Some(render) = graph.add_child(root, sprite) else { continue };
            self.to_render.insert(node.id(), render);
            self.to_node.insert(render, node.id());
            report.created += 1;
        }

        // ── 3. Match hierarchy ──
        // Detach every misplaced node first. What remains attached agrees
        // with the acyclic store, so the second loop cannot form a cycle.
        let mut misplaced = Vec::new();
        for node in store.iter() {
            let Some(render) = self.render_id(node.id()) else { continue };
            let wanted = node.parent_id().and_then(|p| self.render_id(p)).unwrap_or(root);
            if graph.parent(render) != Some(wanted) {
                graph.reparent(render, root, Placement::KeepLocal);
                misplaced.push((render, wanted));
            }
        }
        for (render, wanted) in misplaced {
            if wanted != root && !graph.reparent(render, wanted, Placement::KeepLocal) {
                log::warn!("sync: could not move {render:?} under {wanted:?}");
                continue;
            }
            report.reparented += 1;
        }

        // ── 4. Copy fields ──
        for node in store.iter() {
            if let Some(render) = self.render_id(node.id())
                && let Some(target) = graph.get_mut(render)
            {
                copy_fields(node, target);
            }
        }

        // ── 5. Paint order ──
        for (order, id) in (1..).zip(store.paint_order()) {
            if let Some(render) = self.render_id(id)
                && let Some(target) = graph.get_mut(render)
            {
                target.paint_order = order;
            }
        }

        if report != SyncReport::default() {
            log::debug!(
                "sync: +{} -{} ~{} ({} mapped)",
                report.created,
                report.removed,
                report.reparented,
                self.len()
            );
        }
        report
    }
}

fn copy_fields(node: &Node, target: &mut RenderNode) {
    target.position = node.position;
    target.rotation = node.rotation;
    target.scale_x = node.scale.x;
    target.scale_y = node.scale.y;
    target.opacity = node.opacity;
    target.anchor = node.anchor_point;
    if target.tag != node.display_name {
        target.tag.clone_from(&node.display_name);
    }
    if let RenderKind::Sprite { bitmap } = &mut target.kind
        && !Arc::ptr_eq(bitmap, &node.image)
    {
        *bitmap = node.image.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::kurbo::Point;
    use pf_core::{Bitmap, DepthStep, NodePatch};
    use pretty_assertions::assert_eq;

    fn image() -> Arc<Bitmap> {
        Arc::new(Bitmap::filled(10, 10, [0, 0, 0, 255]).unwrap())
    }

    #[test]
    fn creates_one_render_node_per_store_node() {
        let mut store = NodeStore::new();
        let a = store.insert_image("a.png", image());
        let b = store.insert_image("b.png", image());
        let mut graph = RenderGraph::new();
        let mut sync = RenderSync::new();

        let report = sync.sync(&store, &mut graph);
        assert_eq!(report.created, 2);
        assert_eq!(graph.len(), 3);
        let ra = sync.render_id(a).unwrap();
        assert_eq!(sync.node_id(ra), Some(a));
        assert_eq!(graph.get(ra).unwrap().tag, "a.png-EDT-");
        assert_eq!(graph.get(sync.render_id(b).unwrap()).unwrap().paint_order, 2);

        // A second pass creates nothing.
        assert_eq!(sync.sync(&store, &mut graph), SyncReport::default());
        assert_eq!(sync.render_id(a), Some(ra));
    }

    #[test]
    fn updates_in_place() {
        let mut store = NodeStore::new();
        let a = store.insert_image("a.png", image());
        let mut graph = RenderGraph::new();
        let mut sync = RenderSync::new();
        sync.sync(&store, &mut graph);
        let ra = sync.render_id(a).unwrap();

        store
            .set_field(
                a,
                NodePatch {
                    position: Some(Point::new(5.0, 6.0)),
                    rotation: Some(0.25),
                    opacity: Some(0.5),
                    ..Default::default()
                },
            )
            .unwrap();
        let report = sync.sync(&store, &mut graph);
        assert_eq!(report.created, 0);
        assert_eq!(sync.render_id(a), Some(ra));
        let node = graph.get(ra).unwrap();
        assert_eq!(node.position, Point::new(5.0, 6.0));
        assert_eq!(node.rotation, 0.25);
        assert_eq!(node.opacity, 0.5);
    }

    #[test]
    fn paint_order_is_dense_even_with_rank_gaps() {
        let mut store = NodeStore::new();
        let a = store.insert_image("a.png", image());
        let b = store.insert_image("b.png", image());
        store
            .set_field(a, NodePatch { z_order: Some(50), ..Default::default() })
            .unwrap();
        let mut graph = RenderGraph::new();
        let mut sync = RenderSync::new();
        sync.sync(&store, &mut graph);

        let order = |id| graph.get(sync.render_id(id).unwrap()).unwrap().paint_order;
        assert_eq!((order(b), order(a)), (1, 2));
    }

    #[test]
    fn reorder_swaps_paint_order() {
        let mut store = NodeStore::new();
        let a = store.insert_image("a.png", image());
        let b = store.insert_image("b.png", image());
        let mut graph = RenderGraph::new();
        let mut sync = RenderSync::new();
        sync.sync(&store, &mut graph);

        store.reorder(b, DepthStep::Backward).unwrap();
        sync.sync(&store, &mut graph);
        let sequence = graph.paint_sequence();
        assert_eq!(
            sequence,
            vec![graph.root(), sync.render_id(b).unwrap(), sync.render_id(a).unwrap()]
        );
    }

    #[test]
    fn follows_reparent_and_orphaning() {
        let mut store = NodeStore::new();
        let a = store.insert_image("a.png", image());
        let b = store.insert_image("b.png", image());
        let mut graph = RenderGraph::new();
        let mut sync = RenderSync::new();
        sync.sync(&store, &mut graph);
        let (ra, rb) = (sync.render_id(a).unwrap(), sync.render_id(b).unwrap());

        store.reparent(b, a).unwrap();
        assert_eq!(sync.sync(&store, &mut graph).reparented, 1);
        assert_eq!(graph.parent(rb), Some(ra));

        store.remove(a);
        let report = sync.sync(&store, &mut graph);
        assert_eq!(report.removed, 1);
        assert!(!graph.contains(ra));
        assert_eq!(sync.render_id(b), Some(rb));
        assert_eq!(graph.parent(rb), Some(graph.root()));
        assert_eq!(sync.node_id(ra), None);
    }

    #[test]
    fn keeps_foreign_children_attached() {
        let mut store = NodeStore::new();
        let a = store.insert_image("a.png", image());
        let mut graph = RenderGraph::new();
        let mut sync = RenderSync::new();
        sync.sync(&store, &mut graph);
        let ra = sync.render_id(a).unwrap();
        let outline = graph
            .add_child(ra, RenderNode::outline(pf_core::Color::MAGENTA, 4.0))
            .unwrap();

        sync.sync(&store, &mut graph);
        assert_eq!(graph.parent(outline), Some(ra));
    }
}
