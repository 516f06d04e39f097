//! The live render graph.
//!
//! A renderer-owned hierarchy of visual nodes backed by a petgraph
//! `StableDiGraph`, with a fixed scene root. Each node carries its own local
//! transform (`position`, `rotation`, `scale_x`, `scale_y`) relative to its
//! parent, an `anchor` describing where its content sits around the local
//! origin, and a `paint_order` that sorts it among its siblings.
//!
//! The graph is a projection: it never references the node store. The editor
//! keeps the id mapping between the two.

use pf_core::kurbo::{Affine, Point, Size, Vec2};
use pf_core::transform::{self, WorldPlacement};
use pf_core::{Bitmap, Color, EDITABLE_TAG};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::sync::Arc;

/// Handle to a render node. Stable across removals of other nodes.
pub type RenderId = NodeIndex;

/// Paint order given to selection outlines: behind their sprite.
pub const OUTLINE_PAINT_ORDER: i32 = -1;

/// Paint order given to the anchor indicator: in front of everything
/// under the same sprite.
pub const INDICATOR_PAINT_ORDER: i32 = i32::MAX;

#[derive(Debug, Clone)]
pub enum RenderKind {
    /// The scene root. Exactly one per graph.
    Scene,
    /// A textured quad the size of its bitmap.
    Sprite { bitmap: Arc<Bitmap> },
    /// A stroked frame around the parent sprite's content.
    Outline { color: Color, width: f64 },
    /// The square handle marking the parent sprite's anchor.
    AnchorIndicator { color: Color, size: f64 },
}

#[derive(Debug, Clone)]
pub struct RenderNode {
    /// Lookup tag. Editable sprites end with `-EDT-`.
    pub tag: String,
    pub kind: RenderKind,
    pub position: Point,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub opacity: f64,
    pub anchor: Point,
    pub paint_order: i32,
}

impl RenderNode {
    fn with_kind(tag: impl Into<String>, kind: RenderKind) -> Self {
        Self {
            tag: tag.into(),
            kind,
            position: Point::ZERO,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            anchor: Point::new(0.5, 0.5),
            paint_order: 0,
        }
    }

    pub fn sprite(tag: impl Into<String>, bitmap: Arc<Bitmap>) -> Self {
        Self::with_kind(tag, RenderKind::Sprite { bitmap })
    }

    pub fn outline(color: Color, width: f64) -> Self {
        let mut node = Self::with_kind("outline", RenderKind::Outline { color, width });
        node.paint_order = OUTLINE_PAINT_ORDER;
        node
    }

    pub fn anchor_indicator(color: Color, size: f64) -> Self {
        let mut node = Self::with_kind("anchor", RenderKind::AnchorIndicator { color, size });
        node.paint_order = INDICATOR_PAINT_ORDER;
        node
    }

    /// True for sprites the user may select and edit.
    pub fn is_editable(&self) -> bool {
        matches!(self.kind, RenderKind::Sprite { .. }) && self.tag.contains(EDITABLE_TAG)
    }

    /// Unscaled content size. Zero for nodes without content of their own.
    pub fn size(&self) -> Size {
        match &self.kind {
            RenderKind::Sprite { bitmap } => bitmap.size(),
            RenderKind::AnchorIndicator { size, .. } => Size::new(*size, *size),
            RenderKind::Scene | RenderKind::Outline { .. } => Size::ZERO,
        }
    }

    pub fn scale(&self) -> Vec2 {
        Vec2::new(self.scale_x, self.scale_y)
    }

    /// Local → parent transform.
    pub fn local_transform(&self) -> Affine {
        transform::local_affine(self.position, self.rotation, self.scale())
    }
}

/// How [`RenderGraph::reparent`] treats the moved node's local fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Rewrite position and rotation so the node stays put on screen.
    KeepWorld,
    /// Leave the local fields as they are; the node moves with its new parent.
    KeepLocal,
}

#[derive(Debug)]
pub struct RenderGraph {
    graph: StableDiGraph<RenderNode, ()>,
    root: RenderId,
    /// Scene → view transform applied by presenters.
    view: Affine,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraph {
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(RenderNode::with_kind("scene", RenderKind::Scene));
        Self {
            graph,
            root,
            view: Affine::IDENTITY,
        }
    }

    pub fn root(&self) -> RenderId {
        self.root
    }

    pub fn view(&self) -> Affine {
        self.view
    }

    pub fn set_view(&mut self, view: Affine) {
        self.view = view;
    }

    /// Number of nodes, scene root included.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() <= 1
    }

    pub fn contains(&self, id: RenderId) -> bool {
        self.graph.contains_node(id)
    }

    pub fn get(&self, id: RenderId) -> Option<&RenderNode> {
        self.graph.node_weight(id)
    }

    pub fn get_mut(&mut self, id: RenderId) -> Option<&mut RenderNode> {
        self.graph.node_weight_mut(id)
    }

    /// First node (in index order) whose tag equals `tag`.
    pub fn find_by_tag(&self, tag: &str) -> Option<RenderId> {
        let mut ids: Vec<RenderId> = self.graph.node_indices().collect();
        ids.sort();
        ids.into_iter().find(|id| self.graph[*id].tag == tag)
    }

    // ─── Hierarchy ───────────────────────────────────────────────────────

    /// Attach a new node under `parent`. Returns `None` if `parent` is gone.
    pub fn add_child(&mut self, parent: RenderId, node: RenderNode) -> Option<RenderId> {
        if !self.contains(parent) {
            return None;
        }
        let id = self.graph.add_node(node);
        self.graph.add_edge(parent, id, ());
        Some(id)
    }

    /// Remove a node and everything under it. The scene root cannot be removed.
    pub fn remove(&mut self, id: RenderId) -> Option<RenderNode> {
        if id == self.root || !self.contains(id) {
            return None;
        }
        let subtree = self.descendants(id);
        for d in subtree.into_iter().rev() {
            self.graph.remove_node(d);
        }
        self.graph.remove_node(id)
    }

    pub fn parent(&self, id: RenderId) -> Option<RenderId> {
        self.graph.neighbors_directed(id, Direction::Incoming).next()
    }

    /// Direct children in index order.
    ///
    /// Sorted so iteration does not depend on petgraph's adjacency list
    /// order. Indices of removed nodes are reused, so this is only a
    /// tie-break; draw order comes from `paint_order`.
    pub fn children(&self, id: RenderId) -> Vec<RenderId> {
        let mut children: Vec<RenderId> = self
            .graph
            .neighbors_directed(id, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// Every node below `id`, depth first.
    pub fn descendants(&self, id: RenderId) -> Vec<RenderId> {
        let mut out = Vec::new();
        let mut stack = self.children(id);
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Move `child` under `new_parent`. Refuses to move the root, to move a
    /// node under itself or one of its descendants, and to touch missing
    /// nodes. Returns whether the move happened.
    pub fn reparent(&mut self, child: RenderId, new_parent: RenderId, placement: Placement) -> bool {
        if child == self.root
            || child == new_parent
            || !self.contains(child)
            || !self.contains(new_parent)
            || self.descendants(child).contains(&new_parent)
        {
            return false;
        }
        if self.parent(child) == Some(new_parent) {
            return true;
        }

        if placement == Placement::KeepWorld {
            let world = self.world_placement(child);
            let parent_tf = self.world_transform(new_parent);
            let parent_rotation = self.world_rotation(new_parent);
            let local = transform::adopt(world, parent_tf, parent_rotation);
            let node = &mut self.graph[child];
            node.position = local.position;
            node.rotation = local.rotation;
        }

        if let Some(old) = self.parent(child)
            && let Some(edge) = self.graph.find_edge(old, child)
        {
            self.graph.remove_edge(edge);
        }
        self.graph.add_edge(new_parent, child, ());
        log::trace!("render: {child:?} moved under {new_parent:?} ({placement:?})");
        true
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    /// Root-to-node path, inclusive.
    fn ancestry(&self, id: RenderId) -> Vec<RenderId> {
        let mut path = Vec::new();
        let mut current = Some(id).filter(|c| self.contains(*c));
        while let Some(c) = current {
            path.push(c);
            current = self.parent(c);
        }
        path.reverse();
        path
    }

    /// Local → scene transform. Identity for the root or a missing node.
    pub fn world_transform(&self, id: RenderId) -> Affine {
        self.ancestry(id)
            .into_iter()
            .filter(|a| *a != self.root)
            .fold(Affine::IDENTITY, |tf, a| tf * self.graph[a].local_transform())
    }

    pub fn world_rotation(&self, id: RenderId) -> f64 {
        self.ancestry(id)
            .into_iter()
            .filter(|a| *a != self.root)
            .map(|a| self.graph[a].rotation)
            .sum()
    }

    /// Scene position of the node's origin and its accumulated rotation.
    pub fn world_placement(&self, id: RenderId) -> WorldPlacement {
        let parent_tf = match self.parent(id) {
            Some(p) => self.world_transform(p),
            None => Affine::IDENTITY,
        };
        let position = self.get(id).map_or(Point::ZERO, |n| n.position);
        WorldPlacement {
            position: parent_tf * position,
            rotation: self.world_rotation(id),
        }
    }

    // ─── Paint order ─────────────────────────────────────────────────────

    /// Children sorted by paint order; equal orders keep index order.
    pub fn children_by_paint_order(&self, id: RenderId) -> Vec<RenderId> {
        let mut children = self.children(id);
        children.sort_by_key(|c| self.graph[*c].paint_order);
        children
    }

    /// Every node in draw order, back to front. A node's children with a
    /// negative paint order draw before it, the rest after it.
    pub fn paint_sequence(&self) -> Vec<RenderId> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_paint(self.root, &mut out);
        out
    }

    fn collect_paint(&self, id: RenderId, out: &mut Vec<RenderId>) {
        let children = self.children_by_paint_order(id);
        let split = children.partition_point(|c| self.graph[*c].paint_order < 0);
        for &c in &children[..split] {
            self.collect_paint(c, out);
        }
        out.push(id);
        for &c in &children[split..] {
            self.collect_paint(c, out);
        }
    }
}
