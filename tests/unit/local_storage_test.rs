//! Unit tests for the web storage area: backends, quota enforcement and
//! cross-tab change events.

use linkhub::database::Database;
use linkhub::services::local_storage::{LocalStorage, MemoryBackend, SqliteBackend, StorageBackend};
use linkhub::types::errors::StorageError;
use rstest::rstest;
use tempfile::TempDir;

fn sqlite_storage(quota: usize) -> LocalStorage {
    let db = Database::open_in_memory().unwrap();
    LocalStorage::new(SqliteBackend::new(db, "http://localhost:3000"), quota)
}

#[rstest]
#[case::memory(LocalStorage::in_memory(1024))]
#[case::sqlite(sqlite_storage(1024))]
fn test_set_get_remove(#[case] storage: LocalStorage) {
    assert_eq!(storage.get_item("theme").unwrap(), None);
    storage.set_item("theme", "\"dark\"").unwrap();
    assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("\"dark\""));

    storage.set_item("theme", "\"light\"").unwrap();
    assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("\"light\""));
    assert_eq!(storage.keys().unwrap(), vec!["theme".to_string()]);

    assert!(storage.remove_item("theme").unwrap());
    assert!(!storage.remove_item("theme").unwrap());
    assert_eq!(storage.get_item("theme").unwrap(), None);
}

#[rstest]
#[case::memory(LocalStorage::in_memory(20))]
#[case::sqlite(sqlite_storage(20))]
fn test_quota_exceeded_leaves_previous_value(#[case] storage: LocalStorage) {
    storage.set_item("k", "small").unwrap();
    let err = storage.set_item("k", "this value is far too large").unwrap_err();
    assert!(matches!(err, StorageError::QuotaExceeded { quota: 20, .. }));
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("small"));
}

#[test]
fn test_overwrite_counts_only_new_size() {
    // key (1) + value (9) fits a quota of 10 even though old + new would not.
    let storage = LocalStorage::in_memory(10);
    storage.set_item("k", "123456789").unwrap();
    storage.set_item("k", "987654321").unwrap();
    assert_eq!(storage.usage_bytes().unwrap(), 10);
}

#[test]
fn test_json_helpers() {
    let storage = LocalStorage::in_memory(1024);
    storage.set_json("list", &vec![1, 2, 3]).unwrap();
    assert_eq!(storage.get_json::<Vec<i32>>("list").unwrap(), Some(vec![1, 2, 3]));

    storage.set_item("list", "{not json").unwrap();
    let err = storage.get_json::<Vec<i32>>("list").unwrap_err();
    assert!(matches!(err, StorageError::Corrupted { .. }));
    // The unreadable value is left for the caller to deal with.
    assert!(storage.get_item("list").unwrap().is_some());
}

#[test]
fn test_events_reach_other_tabs_only() {
    let tab_a = LocalStorage::in_memory(1024);
    let tab_b = tab_a.open_tab();
    let mut listener_a = tab_a.subscribe();
    let mut listener_b = tab_b.subscribe();

    tab_a.set_item("linkHubFavorites", "[]").unwrap();
    tab_b.remove_item("linkHubFavorites").unwrap();

    let seen_by_a = listener_a.poll();
    assert_eq!(seen_by_a.len(), 1);
    assert_eq!(seen_by_a[0].key, "linkHubFavorites");
    assert_eq!(seen_by_a[0].old_value.as_deref(), Some("[]"));
    assert_eq!(seen_by_a[0].new_value, None);

    let seen_by_b = listener_b.poll();
    assert_eq!(seen_by_b.len(), 1);
    assert_eq!(seen_by_b[0].new_value.as_deref(), Some("[]"));

    assert!(listener_a.poll().is_empty(), "events are delivered once");
}

#[test]
fn test_tabs_share_one_area() {
    let tab_a = LocalStorage::in_memory(1024);
    let tab_b = tab_a.open_tab();
    assert_ne!(tab_a.tab_id(), tab_b.tab_id());
    tab_a.set_item("k", "v").unwrap();
    assert_eq!(tab_b.get_item("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn test_sqlite_backend_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.db");
    {
        let db = Database::open(&path).unwrap();
        let storage = LocalStorage::new(SqliteBackend::new(db, "http://a"), 1024);
        storage.set_item("theme", "\"dark\"").unwrap();
    }
    let db = Database::open(&path).unwrap();
    let storage = LocalStorage::new(SqliteBackend::new(db, "http://a"), 1024);
    assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("\"dark\""));
}

#[test]
fn test_sqlite_backend_isolates_origins() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.db");
    let mut a = SqliteBackend::new(Database::open(&path).unwrap(), "http://a");
    let b = SqliteBackend::new(Database::open(&path).unwrap(), "http://b");
    a.write("k", "v").unwrap();
    assert_eq!(b.read("k").unwrap(), None);
    assert_eq!(a.usage_bytes().unwrap(), 2);
    assert_eq!(b.usage_bytes().unwrap(), 0);
}

#[test]
fn test_memory_backend_usage() {
    let mut backend = MemoryBackend::new();
    backend.write("ab", "cde").unwrap();
    assert_eq!(backend.usage_bytes().unwrap(), 5);
    backend.delete("ab").unwrap();
    assert_eq!(backend.usage_bytes().unwrap(), 0);
}
