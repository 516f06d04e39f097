//! Core data model for ProcFrame scenes.
//!
//! A scene is a flat list of [`Node`]s. Hierarchy is expressed only through
//! `parent_id` / `children_ids` back-references, never by nesting, so a node
//! is always owned by exactly one place: the [`NodeStore`](crate::NodeStore).
//! Positions and rotations are local to the parent (or to the scene for
//! roots). The scene is y-up, rotations are counter-clockwise radians.

use crate::bitmap::Bitmap;
use crate::id::NodeId;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::sync::Arc;

/// Suffix appended to an image name to form a node's display name. Render
/// nodes whose tag carries it are user-editable sprites.
pub const EDITABLE_TAG: &str = "-EDT-";

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn hex_byte(hi: u8, lo: u8) -> Option<f32> {
    Some((hex_val(hi)? << 4 | hex_val(lo)?) as f32 / 255.0)
}

impl Color {
    pub const MAGENTA: Color = Color::rgba(1.0, 0.0, 1.0, 1.0);
    pub const ORANGE: Color = Color::rgba(1.0, 0.5, 0.0, 1.0);
    pub const CYAN: Color = Color::rgba(0.0, 1.0, 1.0, 1.0);
    pub const PURPLE: Color = Color::rgba(0.5, 0.0, 0.5, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let b = hex.as_bytes();

        match b.len() {
            3 => Some(Self::rgba(
                hex_byte(b[0], b[0])?,
                hex_byte(b[1], b[1])?,
                hex_byte(b[2], b[2])?,
                1.0,
            )),
            6 => Some(Self::rgba(
                hex_byte(b[0], b[1])?,
                hex_byte(b[2], b[3])?,
                hex_byte(b[4], b[5])?,
                1.0,
            )),
            8 => Some(Self::rgba(
                hex_byte(b[0], b[1])?,
                hex_byte(b[2], b[3])?,
                hex_byte(b[4], b[5])?,
                hex_byte(b[6], b[7])?,
            )),
            _ => None,
        }
    }

    /// Channels quantized to 8 bits.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color `{s}`")))
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Independent x/y scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub const ONE: Scale = Scale { x: 1.0, y: 1.0 };

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::ONE
    }
}

/// One placed image instance in the scene.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,

    /// `<image name>-EDT-`. A render-graph tag, not a stable identifier.
    pub display_name: String,

    /// Position of the anchor point, in parent space.
    pub position: Point,

    /// Paint rank among siblings. Lower ranks paint first (behind).
    pub z_order: i32,

    /// Radians, counter-clockwise, local to the parent.
    pub rotation: f64,

    /// Normalized pivot for rotation and scale. Each component is in [0, 1].
    pub anchor_point: Point,

    pub scale: Scale,

    /// 0..1.
    pub opacity: f64,

    /// Decoded bitmap owned by the import subsystem.
    pub image: Arc<Bitmap>,

    pub(crate) parent_id: Option<NodeId>,
    pub(crate) children_ids: SmallVec<[NodeId; 4]>,
}

impl Node {
    /// A root node for `image`: centered anchor, unit scale, no rotation.
    pub fn new(name: &str, image: Arc<Bitmap>) -> Self {
        Self::with_id(NodeId::new(), name, image)
    }

    pub fn with_id(id: NodeId, name: &str, image: Arc<Bitmap>) -> Self {
        Self {
            id,
            display_name: format!("{name}{EDITABLE_TAG}"),
            position: Point::ZERO,
            z_order: 0,
            rotation: 0.0,
            anchor_point: Point::new(0.5, 0.5),
            scale: Scale::ONE,
            opacity: 1.0,
            image,
            parent_id: None,
            children_ids: SmallVec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    pub fn children_ids(&self) -> &[NodeId] {
        &self.children_ids
    }

    pub fn is_child_of(&self, parent: NodeId) -> bool {
        self.parent_id == Some(parent)
    }

    /// Unscaled pixel size of the node's image.
    pub fn size(&self) -> Size {
        self.image.size()
    }
}

/// Sparse update for [`NodeStore::set_field`](crate::NodeStore::set_field).
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub position: Option<Point>,
    pub rotation: Option<f64>,
    pub anchor_point: Option<Point>,
    pub scale: Option<Scale>,
    pub opacity: Option<f64>,
    pub z_order: Option<i32>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn rotation(rotation: f64) -> Self {
        Self {
            rotation: Some(rotation),
            ..Default::default()
        }
    }
}
