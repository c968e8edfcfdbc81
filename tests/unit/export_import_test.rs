//! Unit tests for favorites export (JSON, CSV, statistics) and import
//! (replace and merge).

use chrono::{TimeZone, Utc};
use linkhub::managers::favorites_store::{FavoritesStore, FavoritesStoreTrait};
use linkhub::services::export_import::{
    export_csv, export_filename_today, export_json, export_stats, import_json, merge_import,
    parse_import, ExportFormat, CSV_HEADERS,
};
use linkhub::services::local_storage::LocalStorage;
use linkhub::types::bookmark::BookmarkRecord;
use linkhub::types::errors::ImportError;

const KEY: &str = "linkHubFavorites";

fn record(url: &str, title: &str, category: &str) -> BookmarkRecord {
    BookmarkRecord {
        url: url.to_string(),
        title: title.to_string(),
        description: String::new(),
        icon: String::new(),
        category: category.to_string(),
        id: format!("id-{}", title),
        added_at: "2024-03-07T10:00:00.000Z".to_string(),
    }
}

fn store() -> (FavoritesStore, LocalStorage) {
    let storage = LocalStorage::in_memory(64 * 1024);
    (FavoritesStore::new(storage.clone(), KEY), storage)
}

#[test]
fn test_export_json_round_trips_through_import() {
    let favorites = vec![record("https://a.com", "A", "dev"), record("https://b.com", "B", "")];
    let json = export_json(&favorites);
    assert!(json.contains("\"addedAt\""));
    assert_eq!(parse_import(&json).unwrap(), favorites);
}

#[test]
fn test_export_csv_quotes_every_cell() {
    let mut fav = record("https://a.com", "Say \"hi\"", "dev");
    fav.description = "one, two".into();
    let csv = export_csv(&[fav]);
    let lines: Vec<&str> = csv.split('\n').collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], CSV_HEADERS.join(","));
    assert_eq!(
        lines[1],
        r#""Say ""hi""","https://a.com","one, two","dev","2024-03-07T10:00:00.000Z""#
    );
}

#[test]
fn test_export_csv_empty_list_has_header_only() {
    assert_eq!(export_csv(&[]), "Title,URL,Description,Category,Added At");
}

#[test]
fn test_export_formats() {
    assert_eq!(ExportFormat::Json.mime_type(), "application/json");
    assert!(ExportFormat::Csv.mime_type().starts_with("text/csv"));
    let name = export_filename_today(ExportFormat::Csv);
    assert!(name.starts_with("favorites-"));
    assert!(name.ends_with(".csv"));
    assert_eq!(name.len(), "favorites-YYYY-MM-DD.csv".len());
}

#[test]
fn test_export_stats_counts_categories() {
    let favorites = vec![
        record("https://a.com", "A", "dev"),
        record("https://b.com", "B", "dev"),
        record("https://c.com", "C", ""),
    ];
    let now = Utc.with_ymd_and_hms(2024, 3, 7, 12, 30, 0).unwrap();
    let stats = export_stats(&favorites, now);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.categories["dev"], 2);
    assert_eq!(stats.categories["uncategorized"], 1);
    assert_eq!(stats.export_date, "2024-03-07T12:30:00.000Z");

    let json = serde_json::to_value(&stats).unwrap();
    assert!(json.get("exportDate").is_some());
}

#[test]
fn test_parse_import_rejects_non_arrays() {
    assert!(matches!(parse_import("{\"url\": 1}"), Err(ImportError::NotAnArray)));
    assert!(matches!(parse_import("nope"), Err(ImportError::Parse(_))));
}

#[test]
fn test_parse_import_cleans_entries() {
    let records = parse_import(
        r#"[{"url":"https://a.com","title":"A"},{"title":"no url"},{"url":"https://a.com","title":"dup"}]"#,
    )
    .unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].id.is_empty());
}

#[test]
fn test_import_replaces_and_persists() {
    let (mut store, storage) = store();
    store.add(record("https://old.com", "Old", "")).unwrap();
    store.persist().unwrap();

    let json = export_json(&[record("https://a.com", "A", ""), record("https://b.com", "B", "")]);
    assert_eq!(import_json(&mut store, &json).unwrap(), 2);
    assert!(!store.is_favorite("https://old.com"));

    let mut reloaded = FavoritesStore::new(storage, KEY);
    reloaded.load();
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn test_failed_import_leaves_store_alone() {
    let (mut store, _) = store();
    store.add(record("https://a.com", "A", "")).unwrap();
    assert!(import_json(&mut store, "[broken").is_err());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_merge_adds_only_new_urls() {
    let (mut store, storage) = store();
    store.add(record("https://a.com", "A", "")).unwrap();
    let json = export_json(&[record("https://a.com", "A2", ""), record("https://b.com", "B", "")]);
    assert_eq!(merge_import(&mut store, &json).unwrap(), 1);
    assert_eq!(store.get_all()[0].title, "A");
    assert_eq!(store.len(), 2);
    assert!(storage.get_item(KEY).unwrap().is_some());
}

#[test]
fn test_import_over_quota_reports_storage_error() {
    let storage = LocalStorage::in_memory(64);
    let mut store = FavoritesStore::new(storage, KEY);
    let json = export_json(&[record("https://a.com", "A", "")]);
    assert!(matches!(
        import_json(&mut store, &json),
        Err(ImportError::Storage(_))
    ));
}
