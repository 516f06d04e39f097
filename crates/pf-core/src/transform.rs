//! Stateless 2D transform math: anchor repositioning and parent/child
//! space conversion.
//!
//! A node's local transform is `translate(position) · rotate(rotation) ·
//! scale(sx, sy)`. The node's local origin sits on its anchor point, so the
//! image occupies [`content_rect`] in local (pre-scale) coordinates.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use std::f64::consts::{PI, TAU};

/// Determinants below this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Local → parent transform of a node.
pub fn local_affine(position: Point, rotation: f64, scale: Vec2) -> Affine {
    Affine::translate(position.to_vec2())
        * Affine::rotate(rotation)
        * Affine::scale_non_uniform(scale.x, scale.y)
}

/// The image rectangle in the node's local space (origin at the anchor).
pub fn content_rect(size: Size, anchor: Point) -> Rect {
    Rect::new(
        -anchor.x * size.width,
        -anchor.y * size.height,
        (1.0 - anchor.x) * size.width,
        (1.0 - anchor.y) * size.height,
    )
}

/// Clamp both anchor components to [0, 1].
pub fn clamp_anchor(anchor: Point) -> Point {
    Point::new(anchor.x.clamp(0.0, 1.0), anchor.y.clamp(0.0, 1.0))
}

/// Move the anchor without moving the silhouette.
///
/// Returns `(new_position, new_anchor)`. `new_anchor` is clamped first and the
/// compensation is computed from the clamped value: the anchor delta, scaled
/// by the image size and the node's own scale, is rotated into parent space
/// and added to the position.
pub fn reanchor(
    node_size: Size,
    old_anchor: Point,
    new_anchor: Point,
    old_position: Point,
    rotation: f64,
    scale: Vec2,
) -> (Point, Point) {
    let new_anchor = clamp_anchor(new_anchor);
    let local = Vec2::new(
        (new_anchor.x - old_anchor.x) * node_size.width * scale.x,
        (new_anchor.y - old_anchor.y) * node_size.height * scale.y,
    );
    let (sin, cos) = rotation.sin_cos();
    let global = Vec2::new(
        local.x * cos - local.y * sin,
        local.x * sin + local.y * cos,
    );
    (old_position + global, new_anchor)
}

/// Anchor reached by dragging the anchor handle by `offset` (node-local,
/// pre-scale units). Clamped to [0, 1].
pub fn anchor_from_offset(old_anchor: Point, offset: Vec2, node_size: Size) -> Point {
    if node_size.width <= 0.0 || node_size.height <= 0.0 {
        return clamp_anchor(old_anchor);
    }
    clamp_anchor(Point::new(
        old_anchor.x + offset.x / node_size.width,
        old_anchor.y + offset.y / node_size.height,
    ))
}

/// Inverse of `affine`, or `None` if it collapses space (zero scale).
pub fn checked_inverse(affine: Affine) -> Option<Affine> {
    if affine.determinant().abs() < SINGULAR_EPSILON {
        None
    } else {
        Some(affine.inverse())
    }
}

/// Express a world-space point in the space described by `parent_transform`
/// (the parent's local → world transform). A singular parent leaves the
/// point unchanged.
pub fn world_to_local(point: Point, parent_transform: Affine) -> Point {
    match checked_inverse(parent_transform) {
        Some(inv) => inv * point,
        None => point,
    }
}

/// Inverse of [`world_to_local`].
pub fn local_to_world(point: Point, parent_transform: Affine) -> Point {
    parent_transform * point
}

/// Where a node sits in world space, independent of its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPlacement {
    pub position: Point,
    pub rotation: f64,
}

/// Rewrite a node's placement in a new parent's space so its world position
/// and world rotation are unchanged at the instant of adoption.
///
/// `parent_transform` is the new parent's local → world transform and
/// `parent_rotation` its accumulated world rotation.
pub fn adopt(child: WorldPlacement, parent_transform: Affine, parent_rotation: f64) -> WorldPlacement {
    WorldPlacement {
        position: world_to_local(child.position, parent_transform),
        rotation: normalize_rotation(child.rotation - parent_rotation),
    }
}

/// Wrap an angle into (-2π, 2π) with a truncating remainder.
pub fn normalize_rotation(angle: f64) -> f64 {
    angle % TAU
}

/// Signed angle swept from `from` to `to` around `pivot`, in (-π, π].
pub fn swept_angle(pivot: Point, from: Point, to: Point) -> f64 {
    let a = from - pivot;
    let b = to - pivot;
    if a.hypot2() == 0.0 || b.hypot2() == 0.0 {
        return 0.0;
    }
    let mut delta = b.atan2() - a.atan2();
    if delta > PI {
        delta -= TAU;
    } else if delta <= -PI {
        delta += TAU;
    }
    delta
}
