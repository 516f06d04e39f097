//! Keyboard shortcut mapping.
//!
//! Maps single keys to semantic `ShortcutAction`s. Canvas shortcuts are bare
//! keys; any combination with ⌘/Ctrl is left to the host application.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Modes ──
    SelectionMode,
    RotationMode,
    ParentingMode,

    // ── Edit ──
    Delete,
    Deselect,

    // ── Depth ──
    SendBackward,
    BringForward,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the logical key value (e.g. `"s"`, `"Delete"`). Returns `None`
    /// if the key has no binding.
    pub fn resolve(key: &str, ctrl: bool, _shift: bool, alt: bool, meta: bool) -> Option<ShortcutAction> {
        if ctrl || meta || alt {
            return None;
        }
        match key {
            "s" | "S" => Some(ShortcutAction::SelectionMode),
            "r" | "R" => Some(ShortcutAction::RotationMode),
            "p" | "P" => Some(ShortcutAction::ParentingMode),
            "x" | "X" | "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "[" => Some(ShortcutAction::SendBackward),
            "]" => Some(ShortcutAction::BringForward),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}
