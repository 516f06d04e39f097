//! Editor configuration.
//!
//! Every field has a default matching the stock look and feel, so a JSON
//! config only needs the keys it wants to change.

use crate::model::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Outline color per edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightPalette {
    pub selection: Color,
    pub rotation: Color,
    pub parenting: Color,
    pub depth: Color,
}

impl Default for HighlightPalette {
    fn default() -> Self {
        Self {
            selection: Color::MAGENTA,
            rotation: Color::ORANGE,
            parenting: Color::CYAN,
            depth: Color::PURPLE,
        }
    }
}

/// Camera pan/zoom tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplier on zoom deltas.
    pub zoom_factor: f64,
    /// Multiplier on pan deltas.
    pub pan_speed: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 6.0,
            zoom_factor: 1.5,
            pan_speed: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub palette: HighlightPalette,

    /// Outline stroke width, in the node's local units.
    pub outline_width: f64,

    /// Side of the square anchor handle.
    pub anchor_indicator_size: f64,

    /// A pixel is "solid" for hit testing when its alpha is above this (0..255).
    pub alpha_threshold: u8,

    pub camera: CameraConfig,

    /// Degrees of rotation per unit of scroll delta in Rotation mode.
    pub rotation_step_degrees: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            palette: HighlightPalette::default(),
            outline_width: 4.0,
            anchor_indicator_size: 45.0,
            alpha_threshold: 20,
            camera: CameraConfig::default(),
            rotation_step_degrees: 1.0,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
