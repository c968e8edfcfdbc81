//! Search/Filter Controller for LinkHub.
//!
//! Computes which registry cards are visible for the current free-text
//! query and category. Text input is debounced against caller-supplied
//! instants so the controller never owns a timer.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::managers::favorites_store::{FavoritesStore, FavoritesStoreTrait};
use crate::services::card_registry::{card_matches, CardRegistry, CardRegistryTrait};

/// Counter key for the total card count.
pub const ALL_COUNTER: &str = "all";
/// Counter key for the favorites count.
pub const FAVORITES_COUNTER: &str = "favorites";

/// The selected category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Cards whose URL is in the favorites store.
    Favorites,
    Tag(String),
}

impl CategoryFilter {
    /// Parses a filter button's `data-category` value.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "all" => CategoryFilter::All,
            "favorites" => CategoryFilter::Favorites,
            tag => CategoryFilter::Tag(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_COUNTER,
            CategoryFilter::Favorites => FAVORITES_COUNTER,
            CategoryFilter::Tag(tag) => tag,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trailing-edge debouncer. A new value replaces the pending one and
/// pushes the deadline back.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: impl Into<String>, now: Instant) {
        self.pending = Some((value.into(), now + self.delay));
    }

    /// Returns the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Visible subset of the registry, as indices into [`CardRegistryTrait::all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    pub visible: Vec<usize>,
    pub hidden: Vec<usize>,
    /// No card matched; the page shows its empty state.
    pub empty: bool,
}

impl FilterResult {
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.contains(&index)
    }
}

/// Trait defining search/filter operations.
pub trait SearchFilterTrait {
    fn input(&mut self, text: &str, now: Instant);
    fn poll(&mut self, now: Instant) -> bool;
    fn set_filter(&mut self, filter: CategoryFilter);
    fn apply(&self, registry: &CardRegistry, store: &FavoritesStore) -> FilterResult;
    fn counters(&self, registry: &CardRegistry, store: &FavoritesStore) -> BTreeMap<String, usize>;
}

#[derive(Debug, Clone)]
pub struct SearchFilterController {
    /// Lowercased and trimmed.
    query: String,
    filter: CategoryFilter,
    debouncer: Debouncer,
}

impl SearchFilterController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            query: String::new(),
            filter: CategoryFilter::All,
            debouncer: Debouncer::new(debounce),
        }
    }

    pub fn current_query(&self) -> &str {
        &self.query
    }

    pub fn current_filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// Whether the clear-search button is shown.
    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn has_pending_input(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Empties the query immediately, dropping any pending input.
    pub fn clear_search(&mut self) {
        self.debouncer.cancel();
        self.query.clear();
    }

    /// Clears the query and selects `all`.
    pub fn reset(&mut self) {
        self.clear_search();
        self.filter = CategoryFilter::All;
    }

    /// Applies `text` as the query right away, skipping the debounce.
    pub fn set_query(&mut self, text: &str) {
        self.debouncer.cancel();
        self.query = text.trim().to_lowercase();
    }
}

impl Default for SearchFilterController {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

impl SearchFilterTrait for SearchFilterController {
    /// Records a keystroke. The query takes effect on a later `poll`.
    fn input(&mut self, text: &str, now: Instant) {
        self.debouncer.schedule(text, now);
    }

    /// Returns `true` when debounced input was applied and visibility
    /// must be recomputed.
    fn poll(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(text) => {
                self.query = text.trim().to_lowercase();
                debug!(query = %self.query, "search query applied");
                true
            }
            None => false,
        }
    }

    fn set_filter(&mut self, filter: CategoryFilter) {
        debug!(filter = %filter, "category filter changed");
        self.filter = filter;
    }

    fn apply(&self, registry: &CardRegistry, store: &FavoritesStore) -> FilterResult {
        let mut result = FilterResult::default();
        for (index, card) in registry.all().iter().enumerate() {
            let text_ok = self.query.is_empty() || card_matches(card, &self.query);
            let category_ok = match &self.filter {
                CategoryFilter::All => true,
                CategoryFilter::Favorites => store.is_favorite(&card.url),
                CategoryFilter::Tag(tag) => &card.category == tag,
            };
            if text_ok && category_ok {
                result.visible.push(index);
            } else {
                result.hidden.push(index);
            }
        }
        result.empty = result.visible.is_empty();
        result
    }

    /// Badge counts: every card under `all`, the store length under
    /// `favorites`, and cards per category. Independent of the query.
    fn counters(&self, registry: &CardRegistry, store: &FavoritesStore) -> BTreeMap<String, usize> {
        let mut counters = BTreeMap::new();
        counters.insert(ALL_COUNTER.to_string(), registry.len());
        counters.insert(FAVORITES_COUNTER.to_string(), store.len());
        for category in registry.categories() {
            let count = registry.by_category(&category).len();
            counters.insert(category, count);
        }
        counters
    }
}
