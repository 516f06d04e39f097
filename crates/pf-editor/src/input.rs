//! Platform-agnostic input events.
//!
//! The host converts its native pointer, scroll and key events into
//! `InputEvent`s. Pointer positions are in view coordinates: relative to the
//! viewport center, y up, in screen units. The editor maps them into the
//! scene through the camera.

use pf_core::kurbo::Point;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Primary button pressed.
    PointerDown { x: f64, y: f64 },

    /// Pointer moved with the primary button held.
    PointerDrag { x: f64, y: f64 },

    /// Primary button released.
    PointerUp { x: f64, y: f64 },

    /// Scroll wheel or trackpad scroll.
    Scroll {
        dx: f64,
        dy: f64,
        /// Trackpad-style continuous deltas rather than wheel notches.
        precise: bool,
    },

    /// Pinch gesture. Positive when the fingers spread.
    Magnify { magnification: f64 },

    /// Key press.
    Key {
        key: String,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    },
}

impl InputEvent {
    /// A key press without modifiers.
    pub fn key(key: &str) -> Self {
        InputEvent::Key {
            key: key.to_string(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    /// Pointer position, for pointer events.
    pub fn position(&self) -> Option<Point> {
        match *self {
            InputEvent::PointerDown { x, y }
            | InputEvent::PointerDrag { x, y }
            | InputEvent::PointerUp { x, y } => Some(Point::new(x, y)),
            _ => None,
        }
    }
}
