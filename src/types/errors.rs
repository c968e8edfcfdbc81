use thiserror::Error;

// === StorageError ===

/// Errors raised by the web storage area and its backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would push the storage area past its quota.
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    /// A stored value could not be decoded.
    #[error("Corrupted value under key '{key}': {message}")]
    Corrupted { key: String, message: String },
    /// A value could not be encoded for storage.
    #[error("Storage serialization error: {0}")]
    Serialization(String),
    /// The backing database failed.
    #[error("Storage database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

// === FavoritesError ===

/// Errors related to favorites store mutations.
#[derive(Debug, Error)]
pub enum FavoritesError {
    /// A favorite with the same URL is already stored.
    #[error("Duplicate favorite URL: {0}")]
    DuplicateUrl(String),
    /// The record is missing a URL or title.
    #[error("Invalid favorite: {0}")]
    InvalidRecord(String),
    /// Reorder indices are out of range or equal.
    #[error("Invalid reorder: {from} -> {to} (length {len})")]
    InvalidIndices { from: usize, to: usize, len: usize },
    /// Persisting the list failed.
    #[error("Favorites storage error: {0}")]
    Storage(#[from] StorageError),
}

// === CardError ===

/// Errors related to reading bookmark cards from page markup.
#[derive(Debug, Error)]
pub enum CardError {
    /// The markup contains no bookmark cards.
    #[error("No bookmark cards found in page markup")]
    NoCards,
    /// The markup could not be tokenized.
    #[error("Failed to parse page markup: {0}")]
    Parse(String),
}

// === SettingsError ===

/// Errors related to configuration management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing the config file.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize the config.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === ThemeError ===

/// Errors related to theme selection.
#[derive(Debug, Error)]
pub enum ThemeError {
    /// The theme name is neither `light` nor `dark`.
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
    /// Persisting the theme failed.
    #[error("Theme storage error: {0}")]
    Storage(#[from] StorageError),
}

// === ShortcutError ===

/// Errors related to keyboard shortcut management.
#[derive(Debug, Error)]
pub enum ShortcutError {
    /// No shortcut is registered for the combo.
    #[error("Shortcut not found: {0}")]
    NotFound(String),
    /// The combo is already bound to another action.
    #[error("Shortcut conflict: {0}")]
    Conflict(String),
    /// The combo string is empty or malformed.
    #[error("Invalid shortcut keys: {0}")]
    InvalidKeys(String),
}

// === ImportError ===

/// Errors related to favorites import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The input is not valid JSON.
    #[error("Import parse error: {0}")]
    Parse(String),
    /// The JSON document is not an array.
    #[error("Invalid format: expected array")]
    NotAnArray,
    /// Persisting the imported list failed.
    #[error("Import storage error: {0}")]
    Storage(#[from] StorageError),
}

// === OpenError ===

/// Errors raised when a link cannot be opened.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpenError {
    /// The host refused to open a new browsing context.
    #[error("Popup blocked: {0}")]
    Blocked(String),
    /// The URL is empty.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
