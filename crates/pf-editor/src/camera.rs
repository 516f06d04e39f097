//! Scene camera: pan and zoom.
//!
//! `zoom` is the camera scale: scene units per screen unit. Larger values
//! show more of the scene.

use pf_core::CameraConfig;
use pf_core::kurbo::{Affine, Point, Size, Vec2};

#[derive(Debug, Clone)]
pub struct Camera {
    position: Point,
    zoom: f64,
    locked: bool,
    config: CameraConfig,
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            position: Point::ZERO,
            zoom: 1.0,
            locked: false,
            config,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Move by a scroll delta. Horizontal scroll pans the opposite way, so
    /// content follows the fingers. Returns whether the camera moved.
    pub fn pan(&mut self, delta: Vec2) -> bool {
        if self.locked {
            return false;
        }
        let speed = self.config.pan_speed;
        self.position = Point::new(
            self.position.x - delta.x * speed,
            self.position.y + delta.y * speed,
        );
        true
    }

    /// Lower the camera scale by `delta · zoom_factor`, clamped to the
    /// configured range. Positive deltas zoom in.
    pub fn zoom_by(&mut self, delta: f64) -> bool {
        if self.locked {
            return false;
        }
        let next = (self.zoom - delta * self.config.zoom_factor).clamp(self.config.min_zoom, self.config.max_zoom);
        let changed = next != self.zoom;
        self.zoom = next;
        changed
    }

    /// View coordinates (center-relative, y up) → scene.
    pub fn view_to_scene(&self, point: Point) -> Point {
        self.position + point.to_vec2() * self.zoom
    }

    /// Scene → screen pixels (origin top-left, y down) for a viewport.
    pub fn view_transform(&self, viewport: Size) -> Affine {
        Affine::translate((viewport.width / 2.0, viewport.height / 2.0))
            * Affine::scale_non_uniform(1.0 / self.zoom, -1.0 / self.zoom)
            * Affine::translate(-self.position.to_vec2())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}
