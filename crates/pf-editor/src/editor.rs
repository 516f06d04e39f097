//! The editing session.
//!
//! `Editor` wires the node store, the render graph and the controllers
//! together and is the single entry point for host input. Every input
//! callback runs to completion on the caller's thread.
//!
//! Gestures follow a commit-on-release rule: while a drag is in flight only
//! the target's render node moves; the store is written once, on pointer-up.

use crate::camera::Camera;
use crate::import::ImageSource;
use crate::input::InputEvent;
use crate::modes::{EditMode, Effects, ModeEffect, ModeError, ModeMachine};
use crate::panel::{NodeProperties, PropertyEdit};
use crate::selection::{HighlightStyle, Hit, SelectionController};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::sync::RenderSync;
use pf_core::kurbo::{Affine, Point, Size, Vec2};
use pf_core::transform::{anchor_from_offset, normalize_rotation, reanchor, swept_angle, world_to_local};
use pf_core::{
    Bitmap, Color, DepthStep, EDITABLE_TAG, EditorConfig, FacadeSink, LogSink, Node, NodeId, NodePatch,
    NodeStore, StoreError, StoreEvent,
};
use pf_render::{Presenter, RenderGraph, RenderId, hit};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Scene size the canvas opens with.
const DEFAULT_VIEWPORT: Size = Size::new(650.0, 550.0);

/// Wheel notches are scaled down to zoom deltas by this factor.
const WHEEL_ZOOM_SCALE: f64 = 0.01;

// ─── Notifications ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Warning,
    Error,
    Success,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationKind::Warning => "Warning",
            NotificationKind::Error => "Error",
            NotificationKind::Success => "Success",
        })
    }
}

/// A short user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

// ─── Gestures ────────────────────────────────────────────────────────────

/// Pointer gesture in flight between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    /// Translating `node` in its parent's space.
    Move { node: NodeId, last: Point, moved: bool },
    /// Rotating `node` about its anchor.
    Rotate { node: NodeId, last: Point, moved: bool },
    /// Dragging the anchor indicator of `node`.
    Anchor { node: NodeId, last: Point, moved: bool },
}

// ─── Editor ──────────────────────────────────────────────────────────────

pub struct Editor {
    store: NodeStore,
    graph: RenderGraph,
    sync: RenderSync,
    selection: SelectionController,
    modes: ModeMachine,
    camera: Camera,
    config: EditorConfig,
    viewport: Size,
    log: Rc<dyn LogSink>,
    notification: Option<Notification>,
    gesture: Gesture,
    /// Bumped whenever a batch of store changes reaches the render graph.
    revision: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default(), Rc::new(FacadeSink))
    }
}

impl Editor {
    pub fn new(config: EditorConfig, log: Rc<dyn LogSink>) -> Self {
        let style = HighlightStyle {
            outline_width: config.outline_width,
            indicator_size: config.anchor_indicator_size,
        };
        let mut editor = Self {
            store: NodeStore::new(),
            graph: RenderGraph::new(),
            sync: RenderSync::new(),
            selection: SelectionController::new(style),
            modes: ModeMachine::new(),
            camera: Camera::new(config.camera),
            config,
            viewport: DEFAULT_VIEWPORT,
            log,
            notification: None,
            gesture: Gesture::Idle,
            revision: 0,
        };
        editor.refresh_view();
        editor
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    /// Render node currently projecting `id`.
    pub fn render_id(&self, id: NodeId) -> Option<RenderId> {
        self.sync.render_id(id)
    }

    pub fn mode(&self) -> EditMode {
        self.modes.current()
    }

    /// The node the current mode acts on.
    pub fn target(&self) -> Option<NodeId> {
        self.selection.target()
    }

    pub fn is_highlighted(&self, id: NodeId) -> bool {
        self.selection.is_highlighted(id)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The latest notification, until replaced or taken.
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.refresh_view();
    }

    pub fn present(&self, presenter: &mut dyn Presenter) {
        presenter.present(&self.graph);
    }

    // ─── Import ──────────────────────────────────────────────────────────

    /// Add one decoded image as a new root node in front of the others.
    pub fn add_image(&mut self, name: &str, bitmap: Bitmap) -> NodeId {
        let id = self.store.insert_image(name, Arc::new(bitmap));
        self.flush();
        self.log.log(&format!("Added {name}"));
        id
    }

    /// Run a file-selection action and add every image it produced.
    /// Files that failed to load are logged and skipped.
    pub fn import_from(&mut self, source: &mut dyn ImageSource) -> Vec<NodeId> {
        let mut added = Vec::new();
        for result in source.pick() {
            match result {
                Ok(image) => added.push(self.store.insert_image(&image.name, Arc::new(image.bitmap))),
                Err(err) => {
                    log::warn!("import: {err}");
                    self.log.log(&format!("Skipped {err}"));
                }
            }
        }
        self.flush();
        if added.is_empty() {
            self.log.log("No images imported");
        } else {
            self.notify(NotificationKind::Success, format!("Imported {} image(s)", added.len()));
        }
        added
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(Point::new(*x, *y)),
            InputEvent::PointerDrag { x, y } => self.pointer_drag(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y } => self.pointer_up(Point::new(*x, *y)),
            InputEvent::Scroll { dx, dy, precise } => self.scroll(*dx, *dy, *precise),
            InputEvent::Magnify { magnification } => self.magnify(*magnification),
            InputEvent::Key {
                key,
                ctrl,
                shift,
                alt,
                meta,
            } => {
                self.key(key, *ctrl, *shift, *alt, *meta);
            }
        }
    }

    /// Primary button down at `view` (center-relative, y up).
    pub fn pointer_down(&mut self, view: Point) {
        let point = self.camera.view_to_scene(view);
        self.gesture = Gesture::Idle;
        let hit = self
            .selection
            .pick(&self.graph, &self.sync, point, self.config.alpha_threshold);
        match hit {
            Some(Hit::AnchorIndicator) => {
                if let Some(node) = self.target() {
                    self.gesture = Gesture::Anchor {
                        node,
                        last: point,
                        moved: false,
                    };
                }
            }
            Some(Hit::Node(id)) => self.click_node(id, point),
            None => self.deselect(),
        }
    }

    pub fn pointer_drag(&mut self, view: Point) {
        let point = self.camera.view_to_scene(view);
        let gesture = self.gesture;
        self.gesture = match gesture {
            Gesture::Idle => Gesture::Idle,
            Gesture::Move { node, last, .. } => {
                if let Some(render) = self.sync.render_id(node) {
                    let parent_tf = self
                        .graph
                        .parent(render)
                        .map_or(Affine::IDENTITY, |p| self.graph.world_transform(p));
                    let delta = world_to_local(point, parent_tf) - world_to_local(last, parent_tf);
                    if let Some(sprite) = self.graph.get_mut(render) {
                        sprite.position += delta;
                    }
                }
                Gesture::Move {
                    node,
                    last: point,
                    moved: true,
                }
            }
            Gesture::Rotate { node, last, .. } => {
                if let Some(render) = self.sync.render_id(node) {
                    let pivot = self.graph.world_placement(render).position;
                    let angle = swept_angle(pivot, last, point);
                    if let Some(sprite) = self.graph.get_mut(render) {
                        sprite.rotation = normalize_rotation(sprite.rotation + angle);
                    }
                }
                Gesture::Rotate {
                    node,
                    last: point,
                    moved: true,
                }
            }
            Gesture::Anchor { node, last, .. } => {
                if let Some(render) = self.sync.render_id(node)
                    && let Some(from) = hit::local_point(&self.graph, render, last)
                    && let Some(to) = hit::local_point(&self.graph, render, point)
                {
                    self.selection.nudge_indicator(&mut self.graph, to - from);
                }
                Gesture::Anchor {
                    node,
                    last: point,
                    moved: true,
                }
            }
        };
    }

    /// Release: commit whatever the gesture changed.
    pub fn pointer_up(&mut self, view: Point) {
        let point = self.camera.view_to_scene(view);
        let last = match self.gesture {
            Gesture::Idle => return,
            Gesture::Move { last, .. } | Gesture::Rotate { last, .. } | Gesture::Anchor { last, .. } => last,
        };
        if point != last {
            self.pointer_drag(view);
        }

        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Move {
                node, moved: true, ..
            } => {
                if let Some(position) = self.render_field(node, |n| n.position) {
                    self.apply_patch(node, NodePatch::position(position));
                }
            }
            Gesture::Rotate {
                node, moved: true, ..
            } => {
                if let Some(rotation) = self.render_field(node, |n| n.rotation) {
                    self.apply_patch(node, NodePatch::rotation(rotation));
                }
            }
            Gesture::Anchor {
                node, moved: true, ..
            } => self.commit_anchor(node),
            _ => {}
        }
    }

    /// Scroll: rotates the target in Rotation mode, otherwise pans
    /// (trackpad) or zooms (wheel).
    pub fn scroll(&mut self, dx: f64, dy: f64, precise: bool) {
        if self.mode() == EditMode::Rotation {
            self.rotate_target_degrees(dy * self.config.rotation_step_degrees);
            return;
        }
        let changed = if precise {
            self.camera.pan(Vec2::new(dx, dy))
        } else {
            self.camera.zoom_by(dy * WHEEL_ZOOM_SCALE)
        };
        if changed {
            self.refresh_view();
        }
    }

    pub fn magnify(&mut self, magnification: f64) {
        if self.camera.zoom_by(magnification) {
            self.refresh_view();
        }
    }

    /// Returns whether the key was bound.
    pub fn key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return false;
        };
        match action {
            ShortcutAction::SelectionMode => self.switch_mode(EditMode::Selection),
            ShortcutAction::RotationMode => self.switch_mode(EditMode::Rotation),
            ShortcutAction::ParentingMode => self.switch_mode(EditMode::Parenting),
            ShortcutAction::Delete => {
                self.delete_target();
            }
            ShortcutAction::Deselect => self.deselect(),
            ShortcutAction::SendBackward => self.reorder_target(DepthStep::Backward),
            ShortcutAction::BringForward => self.reorder_target(DepthStep::Forward),
        }
        true
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Change edit mode and apply its highlight and camera effects.
    pub fn enter_mode(&mut self, mode: EditMode) -> Result<(), ModeError> {
        let effects = self.modes.transition(mode, &self.config.palette)?;
        self.apply_effects(&effects);
        self.log.log(&format!("Mode: {mode}"));
        Ok(())
    }

    /// Make `id` the target, highlighted for the current mode.
    pub fn select(&mut self, id: NodeId) -> bool {
        if !self.store.contains(id) {
            log::debug!("editor: select of missing {id:?}");
            return false;
        }
        let parenting = self.mode() == EditMode::Parenting;
        if parenting {
            self.clear_child_highlights();
        }
        let color = self.highlight_color();
        self.selection.select(&mut self.graph, &self.sync, id, color);
        if parenting {
            self.highlight_children(color);
        }
        true
    }

    pub fn deselect(&mut self) {
        self.gesture = Gesture::Idle;
        self.selection.deselect(&mut self.graph, &self.sync);
    }

    /// Move the target one rank step among its siblings. Switches to Depth
    /// mode first. Ignored while a drag is in flight.
    pub fn reorder_target(&mut self, step: DepthStep) {
        if self.dragging() {
            log::debug!("editor: reorder ignored during a drag");
            return;
        }
        let Some(target) = self.target() else {
            log::debug!("editor: reorder without a target");
            return;
        };
        if self.mode() != EditMode::Depth {
            self.switch_mode(EditMode::Depth);
        }
        match self.store.reorder(target, step) {
            Ok(true) => self.flush(),
            Ok(false) => log::debug!("editor: {target:?} cannot move {step:?}"),
            Err(err) => self.report(err),
        }
    }

    /// Remove the target from the store and the render graph. Its children
    /// stay, as roots.
    pub fn delete_target(&mut self) -> Option<Node> {
        let target = self.target()?;
        let label = self.label(target);
        self.deselect();
        let removed = self.store.remove(target)?;
        self.flush();
        self.log.log(&format!("Deleted {label}"));
        Some(removed)
    }

    /// Rotate the target by `degrees` and commit immediately. Only acts in
    /// Rotation mode, outside a drag.
    pub fn rotate_target_degrees(&mut self, degrees: f64) {
        if self.mode() != EditMode::Rotation || self.dragging() {
            return;
        }
        let Some(target) = self.target() else { return };
        let Some(node) = self.store.get(target) else { return };
        let rotation = normalize_rotation(node.rotation + degrees.to_radians());
        self.apply_patch(target, NodePatch::rotation(rotation));
    }

    // ─── Property panel ──────────────────────────────────────────────────

    pub fn selected_properties(&self) -> Option<NodeProperties> {
        self.store.get(self.target()?).map(NodeProperties::from)
    }

    /// Write one field of the target. Returns whether it was applied; edits
    /// during a drag are refused.
    pub fn edit_property(&mut self, edit: PropertyEdit) -> bool {
        if self.dragging() {
            return false;
        }
        let Some(target) = self.target() else {
            return false;
        };
        let Some(node) = self.store.get(target) else {
            return false;
        };
        let patch = match edit {
            PropertyEdit::Position(position) => NodePatch::position(position),
            PropertyEdit::Rotation(rotation) => NodePatch::rotation(rotation),
            PropertyEdit::Anchor(anchor) => {
                let (position, anchor) = reanchor(
                    node.size(),
                    node.anchor_point,
                    anchor,
                    node.position,
                    node.rotation,
                    node.scale.as_vec2(),
                );
                NodePatch {
                    position: Some(position),
                    anchor_point: Some(anchor),
                    ..Default::default()
                }
            }
        };
        self.apply_patch(target, patch)
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn click_node(&mut self, id: NodeId, point: Point) {
        if self.target() == Some(id) {
            self.gesture = self.drag_gesture(id, point);
            return;
        }
        if self.mode() == EditMode::Depth {
            self.switch_mode(EditMode::Selection);
        }
        match self.mode() {
            EditMode::Selection | EditMode::Rotation => {
                self.select(id);
                self.gesture = self.drag_gesture(id, point);
            }
            EditMode::Parenting => match self.target() {
                None => {
                    self.select(id);
                }
                Some(parent) => self.adopt(parent, id),
            },
            EditMode::Depth => {}
        }
    }

    fn drag_gesture(&self, node: NodeId, point: Point) -> Gesture {
        if self.mode() == EditMode::Rotation {
            Gesture::Rotate {
                node,
                last: point,
                moved: false,
            }
        } else {
            Gesture::Move {
                node,
                last: point,
                moved: false,
            }
        }
    }

    /// Make `child` a child of `parent`, keeping it in place on screen.
    fn adopt(&mut self, parent: NodeId, child: NodeId) {
        match self.store.reparent(child, parent) {
            Ok(()) => {
                self.flush();
                let color = self.highlight_color();
                self.selection.highlight(&mut self.graph, &self.sync, child, color);
                self.log
                    .log(&format!("{} is now a child of {}", self.label(child), self.label(parent)));
            }
            Err(err) => self.report(err),
        }
    }

    fn commit_anchor(&mut self, node: NodeId) {
        let offset = self.selection.indicator_offset(&self.graph).unwrap_or(Vec2::ZERO);
        self.selection.reset_indicator(&mut self.graph);
        let Some(n) = self.store.get(node) else { return };
        let size = n.size();
        let wanted = anchor_from_offset(n.anchor_point, offset, size);
        let (position, anchor) = reanchor(
            size,
            n.anchor_point,
            wanted,
            n.position,
            n.rotation,
            n.scale.as_vec2(),
        );
        let patch = NodePatch {
            position: Some(position),
            anchor_point: Some(anchor),
            ..Default::default()
        };
        self.apply_patch(node, patch);
    }

    fn render_field<T>(&self, node: NodeId, field: impl Fn(&pf_render::RenderNode) -> T) -> Option<T> {
        self.graph.get(self.sync.render_id(node)?).map(field)
    }

    fn apply_patch(&mut self, id: NodeId, patch: NodePatch) -> bool {
        match self.store.set_field(id, patch) {
            Ok(()) => {
                self.flush();
                true
            }
            Err(err) => {
                self.report(err);
                false
            }
        }
    }

    /// Push pending store changes to the render graph. A node under an
    /// active drag keeps its dragged position and rotation.
    fn flush(&mut self) {
        let events = self.store.take_events();
        if events.is_empty() {
            return;
        }
        let held = self.in_flight();
        self.sync.sync(&self.store, &mut self.graph);
        if let Some((node, position, rotation)) = held
            && let Some(render) = self.sync.render_id(node)
            && let Some(sprite) = self.graph.get_mut(render)
        {
            sprite.position = position;
            sprite.rotation = rotation;
        }
        for event in &events {
            if let StoreEvent::Removed { id, .. } = event {
                self.selection.forget(*id);
            }
        }
        self.revision += 1;
        log::trace!("editor: flushed {} events (rev {})", events.len(), self.revision);
    }

    fn dragging(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Render position and rotation of the node being moved or rotated.
    fn in_flight(&self) -> Option<(NodeId, Point, f64)> {
        let node = match self.gesture {
            Gesture::Move { node, .. } | Gesture::Rotate { node, .. } => node,
            Gesture::Idle | Gesture::Anchor { .. } => return None,
        };
        let sprite = self.graph.get(self.sync.render_id(node)?)?;
        Some((node, sprite.position, sprite.rotation))
    }

    fn apply_effects(&mut self, effects: &Effects) {
        for effect in effects {
            match *effect {
                ModeEffect::HighlightTarget(color) => {
                    if let Some(target) = self.target() {
                        self.selection.highlight(&mut self.graph, &self.sync, target, color);
                        self.selection.recolor_indicator(&mut self.graph, color);
                    }
                }
                ModeEffect::HighlightChildren(color) => self.highlight_children(color),
                ModeEffect::ClearChildHighlights => self.clear_child_highlights(),
                ModeEffect::LockCamera => self.camera.set_locked(true),
                ModeEffect::UnlockCamera => self.camera.set_locked(false),
            }
        }
    }

    fn highlight_children(&mut self, color: Color) {
        for child in self.target_children() {
            self.selection.highlight(&mut self.graph, &self.sync, child, color);
        }
    }

    fn clear_child_highlights(&mut self) {
        for child in self.target_children() {
            self.selection.unhighlight(&mut self.graph, &self.sync, child);
        }
    }

    fn target_children(&self) -> Vec<NodeId> {
        self.target()
            .and_then(|t| self.store.get(t))
            .map(|n| n.children_ids().to_vec())
            .unwrap_or_default()
    }

    fn highlight_color(&self) -> Color {
        self.mode().highlight_color(&self.config.palette)
    }

    fn switch_mode(&mut self, mode: EditMode) {
        if let Err(err) = self.enter_mode(mode) {
            log::debug!("editor: {err}");
        }
    }

    /// Surface a store rejection. Only user-caused ones reach the user;
    /// stale ids are dropped.
    fn report(&mut self, err: StoreError) {
        let message = match err {
            StoreError::AlreadyParented { child, .. } => {
                format!("{} already has a parent", self.label(child))
            }
            StoreError::CyclicParent { child, parent } if child == parent => {
                format!("{} cannot be its own parent", self.label(child))
            }
            StoreError::CyclicParent { child, parent } => {
                format!("{} cannot adopt its ancestor {}", self.label(parent), self.label(child))
            }
            StoreError::NotFound(_) | StoreError::DuplicateId(_) => {
                log::debug!("editor: ignored {err}");
                return;
            }
        };
        self.notify(NotificationKind::Warning, message);
    }

    fn notify(&mut self, kind: NotificationKind, message: String) {
        match kind {
            NotificationKind::Success => log::info!("{message}"),
            NotificationKind::Warning | NotificationKind::Error => log::warn!("{message}"),
        }
        self.log.log(&format!("{kind}: {message}"));
        self.notification = Some(Notification { kind, message });
    }

    /// Display name without the editable suffix.
    fn label(&self, id: NodeId) -> String {
        self.store.get(id).map_or_else(
            || id.to_string(),
            |n| n.display_name.trim_end_matches(EDITABLE_TAG).to_string(),
        )
    }

    fn refresh_view(&mut self) {
        self.graph.set_view(self.camera.view_transform(self.viewport));
    }
}
