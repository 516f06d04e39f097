//! Property panel contract.
//!
//! The panel shows the selected node's placement and writes edits back
//! through the editor, which routes them to `NodeStore::set_field` like any
//! other edit.

use pf_core::kurbo::Point;
use pf_core::{Node, NodeId};

/// Read-only snapshot of the selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProperties {
    pub id: NodeId,
    pub display_name: String,
    pub position: Point,
    /// Radians.
    pub rotation: f64,
    pub anchor_point: Point,
    pub z_order: i32,
    pub parent: Option<NodeId>,
}

impl From<&Node> for NodeProperties {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id(),
            display_name: node.display_name.clone(),
            position: node.position,
            rotation: node.rotation,
            anchor_point: node.anchor_point,
            z_order: node.z_order,
            parent: node.parent_id(),
        }
    }
}

/// A single field edit from the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyEdit {
    Position(Point),
    /// Radians.
    Rotation(f64),
    /// Re-anchors without moving the node on screen.
    Anchor(Point),
}
