//! Editing-mode state machine.
//!
//! Four mutually exclusive modes decide what a pointer gesture means. Mode
//! changes are explicit and produce a list of [`ModeEffect`]s (exit effects
//! of the old mode, then enter effects of the new one) that the editor
//! applies to the selection and camera. The machine itself touches nothing.

use pf_core::{Color, HighlightPalette};
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditMode {
    /// Click selects, drag moves.
    #[default]
    Selection,
    /// Drag and scroll rotate the target; the camera is locked.
    Rotation,
    /// Clicking an unparented node makes it a child of the target.
    Parenting,
    /// Entered by a depth command; the next selection click leaves it.
    Depth,
}

impl EditMode {
    /// Outline color for nodes highlighted in this mode.
    pub fn highlight_color(self, palette: &HighlightPalette) -> Color {
        match self {
            EditMode::Selection => palette.selection,
            EditMode::Rotation => palette.rotation,
            EditMode::Parenting => palette.parenting,
            EditMode::Depth => palette.depth,
        }
    }

    pub fn locks_camera(self) -> bool {
        self == EditMode::Rotation
    }

    /// Side effects of entering this mode.
    pub fn enter(self, palette: &HighlightPalette) -> Effects {
        let color = self.highlight_color(palette);
        let mut effects = Effects::new();
        effects.push(ModeEffect::HighlightTarget(color));
        match self {
            EditMode::Rotation => effects.push(ModeEffect::LockCamera),
            EditMode::Parenting => effects.push(ModeEffect::HighlightChildren(color)),
            EditMode::Selection | EditMode::Depth => {}
        }
        effects
    }

    /// Side effects of leaving this mode.
    pub fn exit(self) -> Effects {
        let mut effects = Effects::new();
        match self {
            EditMode::Rotation => effects.push(ModeEffect::UnlockCamera),
            EditMode::Parenting => effects.push(ModeEffect::ClearChildHighlights),
            EditMode::Selection | EditMode::Depth => {}
        }
        effects
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditMode::Selection => "selection",
            EditMode::Rotation => "rotation",
            EditMode::Parenting => "parenting",
            EditMode::Depth => "depth",
        };
        f.write_str(name)
    }
}

/// A visual or camera change requested by a mode transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeEffect {
    /// Outline the current target (if any) in this color.
    HighlightTarget(Color),
    /// Outline the target's direct children in this color.
    HighlightChildren(Color),
    /// Remove the outlines added by `HighlightChildren`.
    ClearChildHighlights,
    LockCamera,
    UnlockCamera,
}

pub type Effects = SmallVec<[ModeEffect; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("already in {0} mode")]
    AlreadyActive(EditMode),
}

#[derive(Debug, Default)]
pub struct ModeMachine {
    current: EditMode,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> EditMode {
        self.current
    }

    /// Switch to `to`. Any mode may follow any other; re-entering the
    /// current mode is rejected and changes nothing.
    pub fn transition(&mut self, to: EditMode, palette: &HighlightPalette) -> Result<Effects, ModeError> {
        if to == self.current {
            return Err(ModeError::AlreadyActive(to));
        }
        let mut effects = self.current.exit();
        effects.extend(to.enter(palette));
        log::debug!("mode: {} -> {to}", self.current);
        self.current = to;
        Ok(effects)
    }
}
