use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::errors::ThemeError;

/// Top-level link hub configuration container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HubConfig {
    #[serde(default)]
    pub storage: StorageKeys,
    #[serde(default)]
    pub defaults: DefaultSettings,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub interaction: InteractionSettings,
    #[serde(default)]
    pub features: FeatureFlags,
}

/// Keys used in the web storage area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageKeys {
    pub theme: String,
    pub favorites: String,
    pub recent: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            theme: "theme".to_string(),
            favorites: "linkHubFavorites".to_string(),
            recent: "linkHubRecent".to_string(),
        }
    }
}

/// Default values and timings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefaultSettings {
    pub theme: ThemeMode,
    pub search_debounce_ms: u64,
    pub toast_duration_ms: u64,
    pub loading_delay_ms: u64,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Light,
            search_debounce_ms: 300,
            toast_duration_ms: 3000,
            loading_delay_ms: 1000,
        }
    }
}

/// Size limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitSettings {
    pub recent_max: usize,
    pub storage_quota_bytes: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            recent_max: 10,
            storage_quota_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Pointer and page interaction settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionSettings {
    /// Minimum touch movement in pixels before a touch becomes a drag.
    pub touch_drag_threshold_px: f64,
    /// Origin used to absolutize same-origin icon paths.
    pub page_origin: String,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            touch_drag_threshold_px: 10.0,
            page_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// Feature switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureFlags {
    pub multi_tab_sync: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            multi_tab_sync: true,
        }
    }
}

/// Theme mode selection. Persisted as `"light"` or `"dark"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl FromStr for ThemeMode {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(ThemeError::UnknownTheme(other.to_string())),
        }
    }
}
