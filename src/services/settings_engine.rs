//! Settings Engine for LinkHub.
//!
//! Loads [`HubConfig`] from `config.json` in the platform config directory
//! (or an explicit path), applies dot-path updates such as
//! `defaults.search_debounce_ms`, and writes every change straight back.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::HubConfig;

/// File name of the config inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<HubConfig, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &HubConfig;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

pub struct SettingsEngine {
    config_path: PathBuf,
    config: HubConfig,
}

impl SettingsEngine {
    /// Uses `path_override` when given, else `config.json` under the
    /// platform config directory.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_config_dir().join(CONFIG_FILE_NAME));
        Self {
            config_path,
            config: HubConfig::default(),
        }
    }

    /// Replaces the in-memory config without touching disk.
    pub fn with_config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }
}

/// Replaces the value at `path` inside `root`. Every segment must already
/// exist so typos are reported instead of silently adding fields.
fn set_path(root: &mut Value, path: &[&str], value: Value) -> Result<(), String> {
    let Some((last, parents)) = path.split_last() else {
        return Err("key cannot be empty".to_string());
    };
    let mut node = root;
    for segment in parents {
        node = node
            .get_mut(*segment)
            .ok_or_else(|| format!("unknown section '{}'", segment))?;
    }
    match node {
        Value::Object(map) if map.contains_key(*last) => {
            map.insert((*last).to_string(), value);
            Ok(())
        }
        Value::Object(_) => Err(format!("unknown field '{}'", last)),
        _ => Err(format!("'{}' is not a section", parents.join("."))),
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// A missing file yields defaults. A malformed file is an error and
    /// leaves the in-memory config unchanged.
    fn load(&mut self) -> Result<HubConfig, SettingsError> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "no config file, using defaults");
            self.config = HubConfig::default();
            return Ok(self.config.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;
        self.config = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        info!(path = %self.config_path.display(), "config loaded");
        Ok(self.config.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }
        let json = serde_json::to_string_pretty(&self.config).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize config: {}", e))
        })?;
        fs::write(&self.config_path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &HubConfig {
        &self.config
    }

    /// Updates one field by dot path, e.g. `limits.recent_max`. The result
    /// must still deserialize as a [`HubConfig`]; it is then saved.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }
        let path: Vec<&str> = key.split('.').collect();
        if path.iter().any(|segment| segment.is_empty()) {
            return Err(SettingsError::InvalidKey(format!("Malformed key '{}'", key)));
        }

        let mut tree = serde_json::to_value(&self.config).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize config: {}", e))
        })?;
        set_path(&mut tree, &path, value)
            .map_err(|reason| SettingsError::InvalidKey(format!("{}: {}", key, reason)))?;

        self.config = serde_json::from_value(tree).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        debug!(key, "config value updated");
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.config = HubConfig::default();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
