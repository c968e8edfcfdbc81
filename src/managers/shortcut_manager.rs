//! Shortcut Manager for LinkHub.
//!
//! Maps keyboard combos such as `ctrl+k` to page actions, with conflict
//! detection and a global on/off switch.

use std::collections::BTreeMap;

use crate::types::errors::ShortcutError;

/// Page actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShortcutAction {
    FocusSearch,
    ShowHelp,
    CloseOverlays,
    GoHome,
    ToggleTheme,
}

impl ShortcutAction {
    pub fn description(&self) -> &'static str {
        match self {
            ShortcutAction::FocusSearch => "Focus search",
            ShortcutAction::ShowHelp => "Show shortcuts",
            ShortcutAction::CloseOverlays => "Close overlays",
            ShortcutAction::GoHome => "Reset filters",
            ShortcutAction::ToggleTheme => "Toggle dark mode",
        }
    }
}

/// A key press as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPress {
    /// The key's value, e.g. `"k"`, `"Escape"`, `"/"`.
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    /// Focus is in an input, textarea or contenteditable element.
    pub in_text_input: bool,
}

impl KeyPress {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: true,
            ..Self::default()
        }
    }

    /// Builds the lowercase combo string, modifiers first:
    /// `ctrl+alt+shift+meta+key`. A bare modifier press yields only modifiers.
    pub fn combo(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.ctrl {
            parts.push("ctrl".into());
        }
        if self.alt {
            parts.push("alt".into());
        }
        if self.shift {
            parts.push("shift".into());
        }
        if self.meta {
            parts.push("meta".into());
        }
        let key = self.key.to_lowercase();
        if !matches!(key.as_str(), "control" | "alt" | "shift" | "meta") {
            parts.push(key);
        }
        parts.join("+")
    }
}

/// Trait defining shortcut management operations.
pub trait ShortcutManagerTrait {
    fn register_shortcut(&mut self, combo: &str, action: ShortcutAction) -> Result<(), ShortcutError>;
    fn unregister_shortcut(&mut self, combo: &str) -> Result<(), ShortcutError>;
    fn resolve(&self, press: &KeyPress) -> Option<ShortcutAction>;
    fn list_shortcuts(&self) -> &BTreeMap<String, ShortcutAction>;
    fn reset_to_defaults(&mut self);
    fn has_conflict(&self, combo: &str) -> Option<ShortcutAction>;
}

pub struct ShortcutManager {
    shortcuts: BTreeMap<String, ShortcutAction>,
    enabled: bool,
}

impl ShortcutManager {
    pub fn new() -> Self {
        Self {
            shortcuts: Self::default_shortcuts(),
            enabled: true,
        }
    }

    pub fn default_shortcuts() -> BTreeMap<String, ShortcutAction> {
        [
            ("ctrl+k", ShortcutAction::FocusSearch),
            ("ctrl+/", ShortcutAction::ShowHelp),
            ("escape", ShortcutAction::CloseOverlays),
            ("ctrl+h", ShortcutAction::GoHome),
            ("ctrl+d", ShortcutAction::ToggleTheme),
        ]
        .into_iter()
        .map(|(combo, action)| (combo.to_string(), action))
        .collect()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// One `COMBO: description` line per binding.
    pub fn help_text(&self) -> String {
        self.shortcuts
            .iter()
            .map(|(combo, action)| format!("{}: {}", combo.to_uppercase(), action.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalize(combo: &str) -> String {
        combo.trim().to_lowercase()
    }

    /// Rejects empty combos and a dangling `+` ("ctrl+"). `ctrl++` binds the plus key.
    fn is_well_formed(combo: &str) -> bool {
        if combo.is_empty() {
            return false;
        }
        !combo.ends_with('+') || combo == "+" || combo.ends_with("++")
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcutManagerTrait for ShortcutManager {
    fn register_shortcut(&mut self, combo: &str, action: ShortcutAction) -> Result<(), ShortcutError> {
        let combo = Self::normalize(combo);
        if !Self::is_well_formed(&combo) {
            return Err(ShortcutError::InvalidKeys(combo));
        }
        if let Some(existing) = self.has_conflict(&combo) {
            if existing != action {
                return Err(ShortcutError::Conflict(format!(
                    "'{}' is already bound to {:?}",
                    combo, existing
                )));
            }
        }
        self.shortcuts.insert(combo, action);
        Ok(())
    }

    fn unregister_shortcut(&mut self, combo: &str) -> Result<(), ShortcutError> {
        let combo = Self::normalize(combo);
        self.shortcuts
            .remove(&combo)
            .map(|_| ())
            .ok_or(ShortcutError::NotFound(combo))
    }

    /// Finds the action for a key press. While typing in a text input only
    /// `escape` is honoured.
    fn resolve(&self, press: &KeyPress) -> Option<ShortcutAction> {
        if !self.enabled {
            return None;
        }
        let combo = press.combo();
        if press.in_text_input && combo != "escape" {
            return None;
        }
        self.shortcuts.get(&combo).copied()
    }

    fn list_shortcuts(&self) -> &BTreeMap<String, ShortcutAction> {
        &self.shortcuts
    }

    fn reset_to_defaults(&mut self) {
        self.shortcuts = Self::default_shortcuts();
    }

    fn has_conflict(&self, combo: &str) -> Option<ShortcutAction> {
        self.shortcuts.get(&Self::normalize(combo)).copied()
    }
}
