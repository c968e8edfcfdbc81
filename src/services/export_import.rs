//! Favorites export (JSON, CSV) and import (replace, merge).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::managers::favorites_store::{clean_entries, FavoritesStore, FavoritesStoreTrait};
use crate::types::bookmark::BookmarkRecord;
use crate::types::errors::{FavoritesError, ImportError};

pub const CSV_HEADERS: [&str; 5] = ["Title", "URL", "Description", "Category", "Added At"];

/// Export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv;charset=utf-8;",
        }
    }
}

/// Summary shown before exporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub total: usize,
    /// Count per category; an empty category counts as `uncategorized`.
    pub categories: BTreeMap<String, usize>,
    #[serde(rename = "exportDate")]
    pub export_date: String,
}

pub fn export_json(favorites: &[BookmarkRecord]) -> String {
    serde_json::to_string_pretty(favorites).unwrap_or_else(|_| "[]".to_string())
}

/// One header row then one row per favorite. Every cell is quoted and
/// embedded quotes are doubled.
pub fn export_csv(favorites: &[BookmarkRecord]) -> String {
    let mut lines = Vec::with_capacity(favorites.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for fav in favorites {
        let cells = [
            &fav.title,
            &fav.url,
            &fav.description,
            &fav.category,
            &fav.added_at,
        ];
        let row: Vec<String> = cells.iter().map(|cell| csv_cell(cell)).collect();
        lines.push(row.join(","));
    }
    lines.join("\n")
}

fn csv_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// `favorites-YYYY-MM-DD.<ext>` for the given day.
pub fn export_filename(format: ExportFormat, date: NaiveDate) -> String {
    format!("favorites-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

pub fn export_filename_today(format: ExportFormat) -> String {
    export_filename(format, Utc::now().date_naive())
}

pub fn export_stats(favorites: &[BookmarkRecord], now: DateTime<Utc>) -> ExportStats {
    let mut categories = BTreeMap::new();
    for fav in favorites {
        let category = if fav.category.is_empty() {
            "uncategorized"
        } else {
            fav.category.as_str()
        };
        *categories.entry(category.to_string()).or_insert(0) += 1;
    }
    ExportStats {
        total: favorites.len(),
        categories,
        export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Parses an import document into cleaned records.
pub fn parse_import(json: &str) -> Result<Vec<BookmarkRecord>, ImportError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ImportError::Parse(e.to_string()))?;
    let Value::Array(entries) = value else {
        return Err(ImportError::NotAnArray);
    };
    Ok(clean_entries(&entries).records)
}

/// Replaces the store's contents with the document's valid entries and saves.
/// Returns the number of favorites now stored.
pub fn import_json(store: &mut FavoritesStore, json: &str) -> Result<usize, ImportError> {
    let records = parse_import(json)?;
    store.replace_all(records);
    store.persist().map_err(storage_error)?;
    info!(count = store.len(), "favorites imported");
    Ok(store.len())
}

/// Appends entries whose URL is not stored yet and saves. Returns how many
/// were added.
pub fn merge_import(store: &mut FavoritesStore, json: &str) -> Result<usize, ImportError> {
    let records = parse_import(json)?;
    let added = store.merge(records);
    store.persist().map_err(storage_error)?;
    info!(added, "favorites merged");
    Ok(added)
}

fn storage_error(err: FavoritesError) -> ImportError {
    match err {
        FavoritesError::Storage(e) => ImportError::Storage(e),
        other => ImportError::Parse(other.to_string()),
    }
}
