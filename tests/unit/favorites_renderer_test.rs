//! Unit tests for the FavoritesRenderer: grid projection, escaping, icon
//! fallback, click gestures and the drag/touch state machine.

use linkhub::managers::favorites_store::{FavoritesStore, FavoritesStoreTrait};
use linkhub::services::card_registry::CardRegistry;
use linkhub::services::favorites_renderer::{
    is_safe_icon, placeholder_icon, DragState, FavoritesRenderer, HtmlSurface, RenderOutcome,
};
use linkhub::services::link_opener::{LinkOpener, LogOpener, OpenPolicy};
use linkhub::services::local_storage::{LocalStorage, MemoryBackend, StorageBackend};
use linkhub::services::notifier::Notifier;
use linkhub::types::bookmark::{BookmarkRecord, CardDescriptor};
use linkhub::types::errors::{OpenError, StorageError};
use linkhub::types::toast::ToastKind;
use rstest::rstest;

const KEY: &str = "linkHubFavorites";
const ORIGIN: &str = "http://localhost:3000";

fn card(url: &str, title: &str) -> CardDescriptor {
    CardDescriptor {
        url: url.to_string(),
        title: title.to_string(),
        ..CardDescriptor::default()
    }
}

fn store_with(urls: &[&str]) -> (FavoritesStore, LocalStorage) {
    let storage = LocalStorage::in_memory(64 * 1024);
    let mut store = FavoritesStore::new(storage.clone(), KEY);
    for url in urls {
        let title = url.trim_start_matches("https://").to_uppercase();
        store.add(BookmarkRecord::from_card(&card(url, &title))).unwrap();
    }
    (store, storage)
}

fn renderer() -> FavoritesRenderer<HtmlSurface> {
    FavoritesRenderer::new(HtmlSurface::new(), ORIGIN, 10.0)
}

fn rendered_urls(renderer: &FavoritesRenderer<HtmlSurface>) -> Vec<String> {
    renderer
        .surface()
        .cards
        .iter()
        .map(|c| c.url.clone())
        .collect()
}

fn stored_urls(storage: &LocalStorage) -> Vec<String> {
    let raw = storage.get_item(KEY).unwrap().unwrap_or_else(|| "[]".into());
    let records: Vec<BookmarkRecord> = serde_json::from_str(&raw).unwrap();
    records.into_iter().map(|r| r.url).collect()
}

struct BlockingOpener;

impl LinkOpener for BlockingOpener {
    fn open(&mut self, url: &str, _policy: OpenPolicy) -> Result<(), OpenError> {
        Err(OpenError::Blocked(url.to_string()))
    }
}

#[test]
fn test_empty_list_hides_section() {
    let renderer = renderer();
    assert_eq!(renderer.render(&[]), RenderOutcome::Hidden);
    let surface = renderer.surface();
    assert!(!surface.section_visible);
    assert!(surface.cards.is_empty());
    assert!(surface.to_html().contains("display: none"));
}

#[test]
fn test_render_rebuilds_from_scratch() {
    let (store, _) = store_with(&["https://a.com", "https://b.com"]);
    let renderer = renderer();
    assert_eq!(renderer.render(store.as_slice()), RenderOutcome::Rendered(2));
    assert_eq!(renderer.render(store.as_slice()), RenderOutcome::Rendered(2));

    let surface = renderer.surface();
    assert!(surface.section_visible);
    assert_eq!(surface.cards.len(), 2);
    assert_eq!(surface.rebuilds, 2);
    assert_eq!(surface.cards[1].index, 1);
}

#[test]
fn test_text_is_escaped() {
    let storage = LocalStorage::in_memory(64 * 1024);
    let mut store = FavoritesStore::new(storage, KEY);
    let mut evil = card("https://a.com", "<script>alert(1)</script>");
    evil.description = "\"><img src=x onerror=alert(1)>".into();
    store.add(BookmarkRecord::from_card(&evil)).unwrap();

    let renderer = renderer();
    renderer.render(store.as_slice());
    let html = renderer.surface().to_html();
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains("<img src=x"));
}

#[test]
fn test_unsafe_icon_replaced_and_failure_falls_back() {
    let storage = LocalStorage::in_memory(64 * 1024);
    let mut store = FavoritesStore::new(storage, KEY);
    let mut bad = card("https://a.com", "Alpha");
    bad.icon = "javascript:alert(1)".into();
    let mut good = card("https://b.com", "Beta");
    good.icon = "/icons/b.png".into();
    store.add(BookmarkRecord::from_card(&bad)).unwrap();
    store.add(BookmarkRecord::from_card(&good)).unwrap();

    let renderer = renderer();
    renderer.render(store.as_slice());
    {
        let surface = renderer.surface();
        assert_eq!(surface.cards[0].icon_src, placeholder_icon("Alpha"));
        assert_eq!(surface.cards[1].icon_src, "http://localhost:3000/icons/b.png");
    }

    assert!(renderer.icon_failed(1));
    assert_eq!(renderer.surface().cards[1].icon_src, placeholder_icon("Beta"));
    assert!(!renderer.icon_failed(7));
}

#[rstest]
#[case("data:image/png;base64,AAAA", true)]
#[case("https://a.com/x.png", true)]
#[case("http://a.com/x.png", true)]
#[case("/static/x.png", true)]
#[case("//cdn.com/x.png", false)]
#[case("javascript:alert(1)", false)]
#[case("ftp://a.com/x.png", false)]
#[case("x.png", false)]
fn test_icon_whitelist(#[case] icon: &str, #[case] safe: bool) {
    assert_eq!(is_safe_icon(icon), safe);
}

#[test]
fn test_click_card_opens_isolated() {
    let (store, _) = store_with(&["https://a.com"]);
    let mut renderer = renderer();
    let mut opener = LogOpener::default();
    let mut notifier = Notifier::default();

    assert!(renderer.click_card(0, &store, &mut opener, &mut notifier));
    assert_eq!(opener.opened.len(), 1);
    assert_eq!(opener.opened[0].0, "https://a.com");
    assert_eq!(opener.opened[0].1, OpenPolicy::isolated());
    assert!(opener.opened[0].1.no_opener);
    assert!(notifier.is_empty());

    assert!(!renderer.click_card(5, &store, &mut opener, &mut notifier));
}

#[test]
fn test_blocked_popup_shows_toast() {
    let (store, _) = store_with(&["https://a.com"]);
    let mut renderer = renderer();
    let mut notifier = Notifier::default();

    assert!(!renderer.click_card(0, &store, &mut BlockingOpener, &mut notifier));
    let toasts = notifier.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);
}

#[test]
fn test_click_remove_persists_and_confirms() {
    let (mut store, storage) = store_with(&["https://a.com", "https://b.com"]);
    let mut renderer = renderer();
    let mut opener = LogOpener::default();
    let mut notifier = Notifier::default();

    assert!(renderer.click_remove(0, &mut store, &mut notifier));
    assert_eq!(stored_urls(&storage), vec!["https://b.com"]);
    assert_eq!(rendered_urls(&renderer), vec!["https://b.com"]);
    assert!(opener.opened.is_empty());
    let toasts = notifier.drain();
    assert_eq!(toasts[0].kind, ToastKind::Info);
    assert_eq!(toasts[0].message, "Removed from favorites");

    assert!(renderer.click_remove(0, &mut store, &mut notifier));
    assert!(!renderer.surface().section_visible);
    assert!(!renderer.click_card(0, &store, &mut opener, &mut notifier));
}

/// Accepts the first `writes_left` writes, then fails every save.
struct FillingBackend {
    inner: MemoryBackend,
    writes_left: usize,
}

impl StorageBackend for FillingBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.writes_left == 0 {
            return Err(StorageError::Database("disk full".into()));
        }
        self.writes_left -= 1;
        self.inner.write(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys()
    }

    fn usage_bytes(&self) -> Result<usize, StorageError> {
        self.inner.usage_bytes()
    }
}

#[test]
fn test_click_remove_failed_save_restores_card() {
    let backend = FillingBackend {
        inner: MemoryBackend::new(),
        writes_left: 1,
    };
    let storage = LocalStorage::new(backend, 64 * 1024);
    let mut store = FavoritesStore::new(storage.clone(), KEY);
    for url in ["https://a.com", "https://b.com", "https://c.com"] {
        store.add(BookmarkRecord::from_card(&card(url, "X"))).unwrap();
    }
    store.persist().unwrap();
    let mut renderer = renderer();
    renderer.render(store.as_slice());
    let mut notifier = Notifier::default();

    assert!(!renderer.click_remove(1, &mut store, &mut notifier));
    let urls: Vec<String> = store.get_all().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
    assert_eq!(stored_urls(&storage), urls);
    assert_eq!(rendered_urls(&renderer), urls);

    let toasts = notifier.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);
    assert_eq!(toasts[0].message, "Failed to save favorites");
}

#[test]
fn test_drag_reorders_live_and_persists_on_drop() {
    let (mut store, storage) = store_with(&["https://a.com", "https://b.com", "https://c.com"]);
    store.persist().unwrap();
    let mut renderer = renderer();
    let mut notifier = Notifier::default();

    assert!(renderer.drag_start(0, &store));
    assert!(renderer.surface().cards[0].dragging);

    assert!(renderer.drag_over(1, &mut store));
    assert_eq!(rendered_urls(&renderer), vec!["https://b.com", "https://a.com", "https://c.com"]);
    assert!(renderer.drag_over(2, &mut store));
    assert_eq!(rendered_urls(&renderer), vec!["https://b.com", "https://c.com", "https://a.com"]);
    assert!(renderer.surface().cards[2].dragging);
    // Nothing is saved until the drop.
    assert_eq!(stored_urls(&storage), vec!["https://a.com", "https://b.com", "https://c.com"]);

    assert!(renderer.drop_card(&store, &mut notifier));
    assert_eq!(stored_urls(&storage), vec!["https://b.com", "https://c.com", "https://a.com"]);
    assert_eq!(notifier.drain()[0].message, "Favorites reordered");

    renderer.drag_end(&store);
    assert_eq!(renderer.drag_state(), DragState::Idle);
    assert!(renderer.surface().cards.iter().all(|c| !c.dragging && !c.drag_over));
}

#[test]
fn test_drag_over_self_does_nothing() {
    let (mut store, _) = store_with(&["https://a.com", "https://b.com"]);
    let mut renderer = renderer();
    renderer.drag_start(1, &store);
    assert!(!renderer.drag_over(1, &mut store));
    assert!(!renderer.drag_over(9, &mut store));
    assert_eq!(rendered_urls(&renderer), vec!["https://a.com", "https://b.com"]);
}

#[test]
fn test_drag_over_without_drag_start_is_ignored() {
    let (mut store, _) = store_with(&["https://a.com", "https://b.com"]);
    let mut renderer = renderer();
    assert!(!renderer.drag_over(1, &mut store));
    let mut notifier = Notifier::default();
    assert!(!renderer.drop_card(&store, &mut notifier));
    assert!(notifier.is_empty());
}

#[test]
fn test_drag_enter_and_leave_toggle_marker() {
    let (store, _) = store_with(&["https://a.com", "https://b.com"]);
    let mut renderer = renderer();
    renderer.drag_start(0, &store);
    renderer.drag_enter(1, &store);
    assert!(renderer.surface().cards[1].drag_over);
    renderer.drag_leave(1, &store);
    assert!(!renderer.surface().cards[1].drag_over);
}

#[test]
fn test_drag_end_without_drop_clears_state() {
    let (mut store, storage) = store_with(&["https://a.com", "https://b.com"]);
    store.persist().unwrap();
    let mut renderer = renderer();
    renderer.drag_start(0, &store);
    renderer.drag_enter(1, &store);
    renderer.drag_end(&store);
    assert_eq!(renderer.drag_state(), DragState::Idle);
    assert!(!renderer.surface().cards[1].drag_over);
    assert_eq!(stored_urls(&storage), vec!["https://a.com", "https://b.com"]);
}

#[test]
fn test_touch_below_threshold_is_a_tap() {
    let (mut store, _) = store_with(&["https://a.com", "https://b.com"]);
    let mut renderer = renderer();
    let mut notifier = Notifier::default();

    assert!(renderer.touch_start(0, (100.0, 100.0), &store));
    assert!(!renderer.touch_move(Some(1), (103.0, 104.0), &mut store));
    assert!(matches!(renderer.drag_state(), DragState::Pending { index: 0, .. }));
    assert!(!renderer.touch_end(&store, &mut notifier));
    assert_eq!(renderer.drag_state(), DragState::Idle);
    assert_eq!(rendered_urls(&renderer), Vec::<String>::new());
}

#[test]
fn test_touch_drag_reorders_and_saves() {
    let (mut store, storage) = store_with(&["https://a.com", "https://b.com"]);
    let mut renderer = renderer();
    let mut notifier = Notifier::default();

    renderer.touch_start(0, (0.0, 0.0), &store);
    assert!(renderer.touch_move(Some(1), (0.0, 40.0), &mut store));
    assert!(renderer.touch_end(&store, &mut notifier));
    assert_eq!(stored_urls(&storage), vec!["https://b.com", "https://a.com"]);
    assert_eq!(renderer.drag_state(), DragState::Idle);
}

#[test]
fn test_touch_cancel_returns_to_idle() {
    let (mut store, _) = store_with(&["https://a.com", "https://b.com"]);
    let mut renderer = renderer();
    renderer.touch_start(0, (0.0, 0.0), &store);
    renderer.touch_move(None, (0.0, 50.0), &mut store);
    assert!(matches!(renderer.drag_state(), DragState::Dragging { from: 0, .. }));
    renderer.touch_cancel(&store);
    assert_eq!(renderer.drag_state(), DragState::Idle);
}

#[test]
fn test_refresh_indicators_marks_registry_cards() {
    let (store, _) = store_with(&["https://a.com"]);
    let registry = CardRegistry::from_descriptors(vec![
        card("https://a.com", "A"),
        card("https://b.com", "B"),
    ]);
    let renderer = renderer();
    renderer.refresh_indicators(&registry, &store);
    let surface = renderer.surface();
    assert_eq!(surface.favorited.get("https://a.com"), Some(&true));
    assert_eq!(surface.favorited.get("https://b.com"), Some(&false));
}
