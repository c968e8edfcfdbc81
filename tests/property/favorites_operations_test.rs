//! Property-based tests for FavoritesStore invariants.
//!
//! - URLs stay unique under any sequence of adds.
//! - persist followed by load reproduces the list exactly.
//! - reorder behaves as remove-then-insert and rejects bad indices.
//! - loading twice in a row yields the same list.

use linkhub::managers::favorites_store::{FavoritesStore, FavoritesStoreTrait};
use linkhub::services::local_storage::LocalStorage;
use linkhub::types::bookmark::{BookmarkRecord, CardDescriptor};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;

const KEY: &str = "linkHubFavorites";

fn new_store() -> (FavoritesStore, LocalStorage) {
    let storage = LocalStorage::in_memory(1 << 20);
    (FavoritesStore::new(storage.clone(), KEY), storage)
}

fn arb_card() -> impl Strategy<Value = CardDescriptor> {
    (
        "https://[a-e]{1,2}\\.com",
        "[A-Za-z ]{0,8}",
        "[a-z ]{0,12}",
        prop_oneof![Just(String::new()), Just("dev".to_string()), Just("news".to_string())],
    )
        .prop_map(|(url, title, description, category)| CardDescriptor {
            url,
            title,
            description,
            icon: String::new(),
            category,
        })
}

fn arb_stored_entry() -> impl Strategy<Value = Value> {
    prop_oneof![
        ("https://[a-d]\\.com", "[A-Z]{1,4}").prop_map(|(url, title)| json!({"url": url, "title": title})),
        ("https://[a-d]\\.com", " [A-Z]{1,4} ", any::<u32>()).prop_map(|(url, title, id)| {
            json!({"url": url, "title": title, "id": id})
        }),
        "[A-Z]{1,4}".prop_map(|title| json!({"title": title})),
        Just(json!({"url": "https://z.com", "title": "   "})),
        Just(json!(42)),
    ]
}

fn filled_store(cards: &[CardDescriptor]) -> FavoritesStore {
    let (mut store, _) = new_store();
    for card in cards {
        let _ = store.add(BookmarkRecord::from_card(card));
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_urls_stay_unique(cards in prop::collection::vec(arb_card(), 0..20)) {
        let (mut store, _) = new_store();
        for card in &cards {
            let url = card.url.clone();
            let was_favorite = store.is_favorite(&url);
            let result = store.add(BookmarkRecord::from_card(card));
            if was_favorite {
                prop_assert!(result.is_err());
            }
        }
        let all = store.get_all();
        let unique: HashSet<&str> = all.iter().map(|r| r.url.as_str()).collect();
        prop_assert_eq!(unique.len(), all.len());
        prop_assert!(all.iter().all(BookmarkRecord::is_valid));
    }

    #[test]
    fn prop_persist_then_load_round_trips(cards in prop::collection::vec(arb_card(), 0..15)) {
        let (mut store, storage) = new_store();
        for card in &cards {
            let _ = store.add(BookmarkRecord::from_card(card));
        }
        store.persist().unwrap();

        let mut reloaded = FavoritesStore::new(storage, KEY);
        let outcome = reloaded.load();
        prop_assert!(!outcome.repaired);
        prop_assert_eq!(reloaded.get_all(), store.get_all());
    }

    #[test]
    fn prop_reorder_is_remove_then_insert(
        cards in prop::collection::vec(arb_card(), 1..12),
        from in 0usize..12,
        to in 0usize..12,
    ) {
        let mut store = filled_store(&cards);
        let before = store.get_all();
        let len = before.len();

        let result = store.reorder(from, to);
        if from < len && to < len && from != to {
            prop_assert!(result.is_ok());
            let mut expected = before.clone();
            let moved = expected.remove(from);
            expected.insert(to, moved);
            prop_assert_eq!(store.get_all(), expected);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(store.get_all(), before);
        }
    }

    #[test]
    fn prop_load_is_idempotent(entries in prop::collection::vec(arb_stored_entry(), 0..12)) {
        let (mut store, storage) = new_store();
        storage.set_item(KEY, &Value::Array(entries).to_string()).unwrap();

        store.load();
        let first = store.get_all();
        let second = store.load();
        prop_assert_eq!(store.get_all(), first.clone());
        prop_assert!(!second.repaired);
        prop_assert_eq!(second.dropped, 0);

        let unique: HashSet<&str> = first.iter().map(|r| r.url.as_str()).collect();
        prop_assert_eq!(unique.len(), first.len());
    }
}
