//! The Node Store: the single authoritative list of scene nodes.
//!
//! Nodes live in a flat `Vec` with an id → slot index. Hierarchy is kept in
//! the nodes themselves (`parent_id` and `children_ids`), and every mutator
//! leaves those back-references mutually consistent before returning.
//!
//! Each logical operation queues one [`StoreEvent`]. Consumers (render sync,
//! property panel) drain them with [`NodeStore::take_events`] instead of
//! watching the list for changes.

use crate::bitmap::Bitmap;
use crate::id::NodeId;
use crate::model::{Node, NodePatch};
use crate::transform::{self, WorldPlacement};
use kurbo::Affine;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("node {0} not found")]
    NotFound(NodeId),
    #[error("node {0} already exists")]
    DuplicateId(NodeId),
    #[error("node {child} already has parent {parent}")]
    AlreadyParented { child: NodeId, parent: NodeId },
    #[error("adopting {child} under {parent} would create a cycle")]
    CyclicParent { child: NodeId, parent: NodeId },
}

impl StoreError {
    /// Rejections the user caused and should be told about. Everything else
    /// is stale UI state and is only logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            StoreError::AlreadyParented { .. } | StoreError::CyclicParent { .. }
        )
    }
}

/// One completed logical mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Added { id: NodeId },
    /// `orphans` lost their parent and are roots now.
    Removed { id: NodeId, orphans: Vec<NodeId> },
    Reparented { child: NodeId, parent: NodeId },
    /// Ranks were renumbered among the children of `parent` (roots if `None`).
    Reordered { parent: Option<NodeId> },
    Updated { id: NodeId },
}

/// One rank step among siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthStep {
    /// Toward the viewer (higher rank).
    Forward,
    /// Away from the viewer (lower rank).
    Backward,
}

#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    events: Vec<StoreEvent>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&slot| &self.nodes[slot])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.index.get(&id).copied().map(|slot| &mut self.nodes[slot])
    }

    fn require(&self, id: NodeId) -> Result<&Node, StoreError> {
        self.get(id).ok_or(StoreError::NotFound(id))
    }

    /// Drain the events queued since the last call.
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    // ─── Mutators ────────────────────────────────────────────────────────

    /// Append a node. Hierarchy fields on the incoming node are ignored: it
    /// always enters as a root.
    pub fn add(&mut self, mut node: Node) -> Result<(), StoreError> {
        let id = node.id();
        if self.contains(id) {
            return Err(StoreError::DuplicateId(id));
        }
        node.parent_id = None;
        node.children_ids.clear();
        node.anchor_point = transform::clamp_anchor(node.anchor_point);
        log::debug!("store: add {id:?} `{}` rank {}", node.display_name, node.z_order);
        self.index.insert(id, self.nodes.len());
        self.nodes.push(node);
        self.events.push(StoreEvent::Added { id });
        Ok(())
    }

    /// Create a root node for an imported image, in front of every other root.
    pub fn insert_image(&mut self, name: &str, image: Arc<Bitmap>) -> NodeId {
        let mut node = Node::new(name, image);
        node.z_order = self.next_rank(None);
        let id = node.id();
        if let Err(e) = self.add(node) {
            debug_assert!(false, "fresh node id collided: {e}");
            log::error!("store: {e}");
        }
        id
    }

    /// Remove a node. Its children become roots (their other fields are left
    /// as they are); descendants are not removed.
    ///
    /// Orphans take the removed node's place in the root order, or sit just
    /// in front of its top-level ancestor if it was nested. Both affected
    /// sibling sets are renumbered densely.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let slot = *self.index.get(&id)?;
        let top = self.top_ancestor(id);
        let root_order = self.sibling_ids(None);
        let orphan_order = self.sibling_ids(Some(id));

        let mut node = self.nodes.remove(slot);
        self.rebuild_index();

        let former_parent = node.parent_id.take();
        if let Some(parent_id) = former_parent
            && let Some(parent) = self.get_mut(parent_id)
        {
            parent.children_ids.retain(|c| *c != id);
        }

        let orphans: Vec<NodeId> = node.children_ids.drain(..).collect();
        for &child in &orphans {
            if let Some(c) = self.get_mut(child) {
                c.parent_id = None;
            }
        }

        let mut roots = Vec::with_capacity(root_order.len() + orphans.len());
        for root in root_order {
            if root != id {
                roots.push(root);
            }
            if root == top {
                roots.extend(&orphan_order);
            }
        }
        self.assign_ranks(&roots);
        if let Some(parent_id) = former_parent {
            self.renumber(Some(parent_id));
        }

        log::debug!("store: remove {id:?}, orphaned {}", orphans.len());
        self.events.push(StoreEvent::Removed { id, orphans });
        self.debug_validate();
        Some(node)
    }

    /// Make `child_id` a child of `new_parent_id`, rewriting its position and
    /// rotation in the parent's space so that its world placement does not
    /// change. Adoption is one-shot: a node that already has a parent is
    /// rejected, never reassigned.
    ///
    /// The child is placed in front of its new siblings. The sibling set it
    /// left and the one it joined are both renumbered.
    pub fn reparent(&mut self, child_id: NodeId, new_parent_id: NodeId) -> Result<(), StoreError> {
        let child = self.require(child_id)?;
        self.require(new_parent_id)?;

        if let Some(parent) = child.parent_id {
            return Err(StoreError::AlreadyParented {
                child: child_id,
                parent,
            });
        }
        if child_id == new_parent_id || self.is_ancestor_of(child_id, new_parent_id) {
            return Err(StoreError::CyclicParent {
                child: child_id,
                parent: new_parent_id,
            });
        }

        let world = self
            .world_placement(child_id)
            .ok_or(StoreError::NotFound(child_id))?;
        let parent_tf = self
            .world_transform(new_parent_id)
            .ok_or(StoreError::NotFound(new_parent_id))?;
        let parent_rotation = self.world_rotation(new_parent_id).unwrap_or(0.0);
        let local = transform::adopt(world, parent_tf, parent_rotation);
        let rank = self.next_rank(Some(new_parent_id));

        if let Some(c) = self.get_mut(child_id) {
            c.parent_id = Some(new_parent_id);
            c.position = local.position;
            c.rotation = local.rotation;
            c.z_order = rank;
        }
        if let Some(p) = self.get_mut(new_parent_id) {
            p.children_ids.push(child_id);
        }
        self.renumber(None);
        self.renumber(Some(new_parent_id));

        log::debug!("store: {child_id:?} adopted by {new_parent_id:?}");
        self.events.push(StoreEvent::Reparented {
            child: child_id,
            parent: new_parent_id,
        });
        self.debug_validate();
        Ok(())
    }

    /// Apply a sparse update. Anchors are clamped to [0, 1] and opacity to
    /// [0, 1]. An empty patch still succeeds for an existing node.
    pub fn set_field(&mut self, id: NodeId, patch: NodePatch) -> Result<(), StoreError> {
        let node = self.get_mut(id).ok_or(StoreError::NotFound(id))?;
        if let Some(position) = patch.position {
            node.position = position;
        }
        if let Some(rotation) = patch.rotation {
            node.rotation = rotation;
        }
        if let Some(anchor) = patch.anchor_point {
            node.anchor_point = transform::clamp_anchor(anchor);
        }
        if let Some(scale) = patch.scale {
            node.scale = scale;
        }
        if let Some(opacity) = patch.opacity {
            node.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(z) = patch.z_order {
            node.z_order = z;
        }
        log::trace!("store: set_field {id:?} {patch:?}");
        self.events.push(StoreEvent::Updated { id });
        Ok(())
    }

    /// Move a node one rank step among all of its siblings. Steps past either
    /// end are clamped and report `Ok(false)`. After a move the sibling ranks
    /// are renumbered densely from 1.
    pub fn reorder(&mut self, id: NodeId, step: DepthStep) -> Result<bool, StoreError> {
        let parent = self.require(id)?.parent_id;
        let mut siblings = self.sibling_ids(parent);
        let Some(pos) = siblings.iter().position(|s| *s == id) else {
            return Err(StoreError::NotFound(id));
        };
        let target = match step {
            DepthStep::Forward if pos + 1 < siblings.len() => pos + 1,
            DepthStep::Backward if pos > 0 => pos - 1,
            _ => return Ok(false),
        };
        siblings.swap(pos, target);
        self.assign_ranks(&siblings);
        log::debug!("store: reorder {id:?} {step:?}");
        self.events.push(StoreEvent::Reordered { parent });
        Ok(true)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Nodes without a parent, back to front.
    pub fn roots(&self) -> Vec<&Node> {
        self.sorted(self.nodes.iter().filter(|n| n.parent_id.is_none()).collect())
    }

    /// Direct children of `id`, back to front (ascending rank). Equal ranks
    /// keep insertion order.
    pub fn children_of(&self, id: NodeId) -> Vec<&Node> {
        match self.get(id) {
            Some(node) => self.sorted(
                node.children_ids
                    .iter()
                    .filter_map(|c| self.get(*c))
                    .collect(),
            ),
            None => Vec::new(),
        }
    }

    /// Every node in paint order: each root, then its subtree, siblings back
    /// to front.
    pub fn paint_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for root in self.roots() {
            self.collect_subtree(root.id(), &mut out);
        }
        out
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for child in self.children_of(id) {
            self.collect_subtree(child.id(), out);
        }
    }

    /// True if `ancestor` is a parent, grandparent, ... of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.get(descendant).and_then(|n| n.parent_id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            if !seen.insert(p) {
                break;
            }
            current = self.get(p).and_then(|n| n.parent_id);
        }
        false
    }

    /// Local → world transform of a node.
    pub fn world_transform(&self, id: NodeId) -> Option<Affine> {
        let mut tf = Affine::IDENTITY;
        for node in self.ancestry(id)? {
            tf *= transform::local_affine(node.position, node.rotation, node.scale.as_vec2());
        }
        Some(tf)
    }

    /// Accumulated rotation from the scene down to `id`.
    pub fn world_rotation(&self, id: NodeId) -> Option<f64> {
        Some(self.ancestry(id)?.iter().map(|n| n.rotation).sum())
    }

    /// World position of the node's anchor and its world rotation.
    pub fn world_placement(&self, id: NodeId) -> Option<WorldPlacement> {
        let node = self.get(id)?;
        let parent_tf = match node.parent_id {
            Some(p) => self.world_transform(p)?,
            None => Affine::IDENTITY,
        };
        Some(WorldPlacement {
            position: transform::local_to_world(node.position, parent_tf),
            rotation: self.world_rotation(id)?,
        })
    }

    /// Path from the topmost ancestor down to `id`, inclusive.
    fn ancestry(&self, id: NodeId) -> Option<Vec<&Node>> {
        let mut path = vec![self.get(id)?];
        let mut current = path[0].parent_id;
        while let Some(p) = current {
            let parent = self.get(p)?;
            if path.len() > self.nodes.len() {
                log::error!("store: parent cycle through {p:?}");
                return None;
            }
            path.push(parent);
            current = parent.parent_id;
        }
        path.reverse();
        Some(path)
    }

    /// Check the parent/child back-references. Any violation is a defect.
    pub fn validate(&self) -> Result<(), String> {
        for node in &self.nodes {
            if let Some(p) = node.parent_id {
                let parent = self
                    .get(p)
                    .ok_or_else(|| format!("{:?} points at missing parent {p:?}", node.id()))?;
                if !parent.children_ids.contains(&node.id()) {
                    return Err(format!("{p:?} does not list child {:?}", node.id()));
                }
            }
            for &c in &node.children_ids {
                let child = self
                    .get(c)
                    .ok_or_else(|| format!("{:?} lists missing child {c:?}", node.id()))?;
                if child.parent_id != Some(node.id()) {
                    return Err(format!("{c:?} does not point back at {:?}", node.id()));
                }
            }
        }
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn debug_validate(&self) {
        if let Err(e) = self.validate() {
            debug_assert!(false, "node store invariant broken: {e}");
            log::error!("node store invariant broken: {e}");
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (slot, node) in self.nodes.iter().enumerate() {
            self.index.insert(node.id(), slot);
        }
    }

    fn sorted<'a>(&self, mut nodes: Vec<&'a Node>) -> Vec<&'a Node> {
        // Stable: ties keep insertion order.
        nodes.sort_by_key(|n| n.z_order);
        nodes
    }

    fn sibling_ids(&self, parent: Option<NodeId>) -> Vec<NodeId> {
        let nodes = match parent {
            Some(p) => self.children_of(p),
            None => self.roots(),
        };
        nodes.iter().map(|n| n.id()).collect()
    }

    /// The root `id` hangs under (itself if it is a root).
    fn top_ancestor(&self, id: NodeId) -> NodeId {
        let mut seen = HashSet::new();
        let mut current = id;
        while let Some(parent) = self.get(current).and_then(|n| n.parent_id) {
            if !seen.insert(parent) {
                break;
            }
            current = parent;
        }
        current
    }

    fn next_rank(&self, parent: Option<NodeId>) -> i32 {
        let ids = self.sibling_ids(parent);
        ids.iter()
            .filter_map(|id| self.get(*id))
            .map(|n| n.z_order)
            .max()
            .map_or(1, |max| max + 1)
    }

    fn renumber(&mut self, parent: Option<NodeId>) {
        let ids = self.sibling_ids(parent);
        self.assign_ranks(&ids);
    }

    fn assign_ranks(&mut self, ordered: &[NodeId]) {
        for (rank, id) in (1..).zip(ordered) {
            if let Some(node) = self.get_mut(*id) {
                node.z_order = rank;
            }
        }
    }
}
