//! Theme Engine: light/dark mode, the persisted theme choice and CSS variables.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::services::local_storage::LocalStorage;
use crate::types::errors::ThemeError;
use crate::types::settings::ThemeMode;

/// Trait defining the theme engine interface.
pub trait ThemeEngineTrait {
    fn initialize(&mut self) -> ThemeMode;
    fn set_theme(&mut self, mode: ThemeMode) -> Result<(), ThemeError>;
    fn toggle(&mut self) -> Result<ThemeMode, ThemeError>;
    fn current(&self) -> ThemeMode;
    fn css_variables(&self) -> HashMap<String, String>;
}

/// Dark palette.
struct DarkPalette;
impl DarkPalette {
    const BG_PRIMARY: &'static str = "#0f172a";
    const BG_SECONDARY: &'static str = "#1e293b";
    const CARD_BG: &'static str = "#1e293b";
    const TEXT_PRIMARY: &'static str = "#f1f5f9";
    const TEXT_SECONDARY: &'static str = "#94a3b8";
    const BORDER: &'static str = "#334155";
    const ACCENT: &'static str = "#818cf8";
    const SHADOW: &'static str = "0 4px 6px rgba(0, 0, 0, 0.4)";
}

/// Light palette.
struct LightPalette;
impl LightPalette {
    const BG_PRIMARY: &'static str = "#f8fafc";
    const BG_SECONDARY: &'static str = "#ffffff";
    const CARD_BG: &'static str = "#ffffff";
    const TEXT_PRIMARY: &'static str = "#0f172a";
    const TEXT_SECONDARY: &'static str = "#64748b";
    const BORDER: &'static str = "#e2e8f0";
    const ACCENT: &'static str = "#6366f1";
    const SHADOW: &'static str = "0 4px 6px rgba(15, 23, 42, 0.08)";
}

/// The theme engine implementation.
pub struct ThemeEngine {
    current: ThemeMode,
    default_mode: ThemeMode,
    storage: LocalStorage,
    storage_key: String,
}

impl ThemeEngine {
    /// Creates an engine showing `default_mode` until `initialize` reads storage.
    pub fn new(storage: LocalStorage, storage_key: &str, default_mode: ThemeMode) -> Self {
        Self {
            current: default_mode,
            default_mode,
            storage,
            storage_key: storage_key.to_string(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn is_dark(&self) -> bool {
        self.current == ThemeMode::Dark
    }

    /// Icon class for the toggle button: a sun while dark, a moon while light.
    pub fn toggle_icon(&self) -> &'static str {
        match self.current {
            ThemeMode::Dark => "fas fa-sun",
            ThemeMode::Light => "fas fa-moon",
        }
    }

    /// Tooltip and aria-label for the toggle button.
    pub fn toggle_label(&self) -> &'static str {
        match self.current {
            ThemeMode::Dark => "Switch to light mode",
            ThemeMode::Light => "Switch to dark mode",
        }
    }

    /// Parses a stored value: a JSON string (`"dark"`) or a bare name (`dark`).
    fn parse_stored(raw: &str) -> Result<ThemeMode, ThemeError> {
        match serde_json::from_str::<String>(raw) {
            Ok(name) => name.parse(),
            Err(_) => raw.parse(),
        }
    }

    fn persist(&self) -> Result<(), ThemeError> {
        self.storage
            .set_json(&self.storage_key, self.current.as_str())
            .map_err(ThemeError::from)
    }

    fn build_variables(
        bg_primary: &str,
        bg_secondary: &str,
        card_bg: &str,
        text_primary: &str,
        text_secondary: &str,
        border: &str,
        accent: &str,
        shadow: &str,
    ) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("--bg-primary".into(), bg_primary.into());
        vars.insert("--bg-secondary".into(), bg_secondary.into());
        vars.insert("--card-bg".into(), card_bg.into());
        vars.insert("--text-primary".into(), text_primary.into());
        vars.insert("--text-secondary".into(), text_secondary.into());
        vars.insert("--border-color".into(), border.into());
        vars.insert("--accent-color".into(), accent.into());
        vars.insert("--card-shadow".into(), shadow.into());
        vars.insert("--transition-normal".into(), "300ms".into());
        vars
    }
}

impl ThemeEngineTrait for ThemeEngine {
    /// Reads the stored theme. A missing or unknown value gives the default.
    fn initialize(&mut self) -> ThemeMode {
        self.current = match self.storage.get_item(&self.storage_key) {
            Ok(Some(raw)) => match Self::parse_stored(&raw) {
                Ok(mode) => mode,
                Err(e) => {
                    warn!(error = %e, "ignoring stored theme");
                    self.default_mode
                }
            },
            Ok(None) => self.default_mode,
            Err(e) => {
                warn!(error = %e, "failed to read stored theme");
                self.default_mode
            }
        };
        debug!(theme = self.current.as_str(), "theme initialized");
        self.current
    }

    /// Applies `mode` and saves it. The mode stays applied even if saving fails.
    fn set_theme(&mut self, mode: ThemeMode) -> Result<(), ThemeError> {
        self.current = mode;
        self.persist()
    }

    fn toggle(&mut self) -> Result<ThemeMode, ThemeError> {
        let next = self.current.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    fn current(&self) -> ThemeMode {
        self.current
    }

    fn css_variables(&self) -> HashMap<String, String> {
        match self.current {
            ThemeMode::Dark => Self::build_variables(
                DarkPalette::BG_PRIMARY,
                DarkPalette::BG_SECONDARY,
                DarkPalette::CARD_BG,
                DarkPalette::TEXT_PRIMARY,
                DarkPalette::TEXT_SECONDARY,
                DarkPalette::BORDER,
                DarkPalette::ACCENT,
                DarkPalette::SHADOW,
            ),
            ThemeMode::Light => Self::build_variables(
                LightPalette::BG_PRIMARY,
                LightPalette::BG_SECONDARY,
                LightPalette::CARD_BG,
                LightPalette::TEXT_PRIMARY,
                LightPalette::TEXT_SECONDARY,
                LightPalette::BORDER,
                LightPalette::ACCENT,
                LightPalette::SHADOW,
            ),
        }
    }
}
