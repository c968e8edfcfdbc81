//! App Core for LinkHub.
//!
//! [`LinkHub`] owns one instance of every component and wires them
//! together: page initialization, gestures, keyboard shortcuts, and
//! reconciliation with changes other tabs make to the storage area.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::managers::favorites_store::{FavoritesStore, FavoritesStoreTrait, LoadOutcome};
use crate::managers::recent_manager::{RecentManager, RecentManagerTrait};
use crate::managers::shortcut_manager::{
    KeyPress, ShortcutAction, ShortcutManager, ShortcutManagerTrait,
};
use crate::services::card_registry::{CardRegistry, CardRegistryTrait};
use crate::services::export_import::{self, ExportFormat};
use crate::services::favorites_renderer::{resolve_icon, FavoritesRenderer, FavoritesSurface};
use crate::services::link_opener::{LinkOpener, OpenPolicy};
use crate::services::local_storage::{LocalStorage, StorageListener};
use crate::services::notifier::Notifier;
use crate::services::search_filter::{
    CategoryFilter, FilterResult, SearchFilterController, SearchFilterTrait,
};
use crate::services::theme_engine::{ThemeEngine, ThemeEngineTrait};
use crate::types::bookmark::BookmarkRecord;
use crate::types::errors::{FavoritesError, ImportError, OpenError};
use crate::types::settings::HubConfig;
use crate::types::toast::Toast;

/// Page modules in initialization order.
pub const INIT_ORDER: [&str; 6] = ["theme", "cards", "favorites", "search", "shortcuts", "recent"];

/// Which modules came up during [`LinkHub::initialize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub completed: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
    pub favorites: LoadOutcome,
}

impl InitReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_modules(&self) -> Vec<&'static str> {
        self.failed.iter().map(|(name, _)| *name).collect()
    }
}

/// Storage keys reconciled by one [`LinkHub::sync_from_storage`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub favorites: bool,
    pub theme: bool,
    pub recent: bool,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        !(self.favorites || self.theme || self.recent)
    }
}

/// Central struct holding every component of the page.
pub struct LinkHub<S: FavoritesSurface, O: LinkOpener> {
    config: HubConfig,
    listener: StorageListener,
    registry: CardRegistry,
    store: FavoritesStore,
    renderer: FavoritesRenderer<S>,
    search: SearchFilterController,
    theme: ThemeEngine,
    recent: RecentManager,
    shortcuts: ShortcutManager,
    notifier: Notifier,
    opener: O,
    visible: FilterResult,
    help_visible: bool,
    search_focused: bool,
}

impl<S: FavoritesSurface, O: LinkOpener> LinkHub<S, O> {
    /// Wires the components to `storage`, a handle opened from this page's tab.
    pub fn new(config: HubConfig, storage: LocalStorage, surface: S, opener: O) -> Self {
        let keys = &config.storage;
        let listener = storage.subscribe();
        let store = FavoritesStore::new(storage.clone(), &keys.favorites);
        let theme = ThemeEngine::new(storage.clone(), &keys.theme, config.defaults.theme);
        let recent = RecentManager::new(storage, &keys.recent, config.limits.recent_max);
        let renderer = FavoritesRenderer::new(
            surface,
            &config.interaction.page_origin,
            config.interaction.touch_drag_threshold_px,
        );
        let search = SearchFilterController::new(std::time::Duration::from_millis(
            config.defaults.search_debounce_ms,
        ));
        let notifier = Notifier::new(config.defaults.toast_duration_ms);

        Self {
            config,
            listener,
            registry: CardRegistry::default(),
            store,
            renderer,
            search,
            theme,
            recent,
            shortcuts: ShortcutManager::new(),
            notifier,
            opener,
            visible: FilterResult::default(),
            help_visible: false,
            search_focused: false,
        }
    }

    /// Brings every page module up in [`INIT_ORDER`]. A module that fails is
    /// reported and toasted; the remaining modules still initialize.
    pub fn initialize(&mut self, page_html: &str) -> InitReport {
        let mut report = InitReport::default();

        for module in INIT_ORDER {
            let result = match module {
                "theme" => {
                    self.theme.initialize();
                    Ok(())
                }
                "cards" => CardRegistry::from_html(page_html)
                    .map(|registry| self.registry = registry)
                    .map_err(|e| e.to_string()),
                "favorites" => {
                    report.favorites = self.store.load();
                    self.refresh_views();
                    Ok(())
                }
                "search" => {
                    self.search.reset();
                    self.refresh_visibility();
                    Ok(())
                }
                "shortcuts" => {
                    self.shortcuts.enable();
                    Ok(())
                }
                "recent" => {
                    self.recent.load();
                    Ok(())
                }
                _ => Ok(()),
            };

            match result {
                Ok(()) => {
                    debug!(module, "module initialized");
                    report.completed.push(module);
                }
                Err(message) => {
                    error!(module, error = %message, "module failed to initialize");
                    self.notifier
                        .error(format!("Failed to initialize {}", module));
                    report.failed.push((module, message));
                }
            }
        }

        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            "link hub initialized"
        );
        report
    }

    /// Applies changes other tabs made to the storage area since the last call.
    pub fn sync_from_storage(&mut self) -> SyncReport {
        let events = self.listener.poll();
        let lagged = self.listener.take_lagged();
        let mut report = SyncReport::default();
        if !self.config.features.multi_tab_sync {
            if !events.is_empty() || lagged {
                debug!(count = events.len(), "multi-tab sync disabled, ignoring changes");
            }
            return report;
        }

        if lagged {
            // Dropped changes may have touched any key.
            warn!("missed storage changes from other tabs, reloading everything");
            report = SyncReport {
                favorites: true,
                theme: true,
                recent: true,
            };
        }

        let keys = &self.config.storage;
        for event in &events {
            if event.key == keys.favorites {
                report.favorites = true;
            } else if event.key == keys.theme {
                report.theme = true;
            } else if event.key == keys.recent {
                report.recent = true;
            }
        }

        if report.favorites {
            info!("favorites changed in another tab, reloading");
            self.store.load();
            self.refresh_views();
        }
        if report.theme {
            self.theme.initialize();
        }
        if report.recent {
            self.recent.load();
        }
        report
    }

    /// Adds or removes the registry card `url`. Returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, url: &str) -> Result<bool, FavoritesError> {
        let Some(card) = self.registry.get(url).cloned() else {
            self.notifier.error("Bookmark not found");
            return Err(FavoritesError::InvalidRecord(format!("unknown card {}", url)));
        };

        if let Some(index) = self.store.position(url) {
            let removed = self.store.as_slice()[index].clone();
            self.store.remove(url);
            if let Err(e) = self.store.persist() {
                self.store.insert_at(index, removed);
                self.notifier.error("Failed to save favorites");
                return Err(e);
            }
            self.refresh_views();
            self.notifier.info("Removed from favorites");
            return Ok(false);
        }

        let mut record = BookmarkRecord::from_card(&card);
        record.icon = resolve_icon(&record.icon, &record.title, &self.config.interaction.page_origin);
        if let Err(e) = self.store.add(record) {
            warn!(error = %e, "favorite rejected");
            self.notifier.error("Could not add favorite");
            return Err(e);
        }
        if let Err(e) = self.store.persist() {
            // Keep memory consistent with what is stored.
            self.store.remove(url);
            self.notifier.error("Failed to save favorites");
            return Err(e);
        }
        self.refresh_views();
        self.notifier.success("Added to favorites");
        Ok(true)
    }

    /// Opens a main-grid card and records it as recently opened.
    pub fn open_card(&mut self, url: &str) -> Result<(), OpenError> {
        let Some(card) = self.registry.get(url).cloned() else {
            return Err(OpenError::InvalidUrl(url.to_string()));
        };
        if let Err(e) = self.opener.open(&card.url, OpenPolicy::isolated()) {
            warn!(error = %e, "failed to open card");
            self.notifier.error("Could not open link");
            return Err(e);
        }
        if let Err(e) = self.recent.add(RecentManager::link_for(&card)) {
            warn!(error = %e, "failed to record recent link");
        }
        Ok(())
    }

    pub fn search_input(&mut self, text: &str, now: Instant) {
        self.search.input(text, now);
    }

    /// Advances timers. Returns `true` when debounced search input was applied.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.search.poll(now) {
            self.refresh_visibility();
            return true;
        }
        false
    }

    pub fn set_filter(&mut self, category: &str) {
        self.search.set_filter(CategoryFilter::parse(category));
        self.refresh_visibility();
    }

    pub fn clear_search(&mut self) {
        self.search.clear_search();
        self.refresh_visibility();
    }

    /// Runs the shortcut bound to `press`, if any.
    pub fn handle_key(&mut self, press: &KeyPress) -> Option<ShortcutAction> {
        let action = self.shortcuts.resolve(press)?;
        match action {
            ShortcutAction::FocusSearch => self.search_focused = true,
            ShortcutAction::ShowHelp => self.help_visible = true,
            ShortcutAction::CloseOverlays => {
                if self.help_visible {
                    self.help_visible = false;
                } else if self.search.has_query() || self.search.has_pending_input() {
                    self.clear_search();
                }
                self.search_focused = false;
            }
            ShortcutAction::GoHome => {
                self.search.reset();
                self.refresh_visibility();
                self.notifier.info("Filters reset");
            }
            ShortcutAction::ToggleTheme => {
                if let Err(e) = self.theme.toggle() {
                    warn!(error = %e, "theme not saved");
                    self.notifier.error("Failed to save theme");
                }
            }
        }
        debug!(?action, "shortcut handled");
        Some(action)
    }

    /// Empties the favorites. On a failed save the list is left as it was.
    pub fn clear_favorites(&mut self) -> Result<(), FavoritesError> {
        let previous = self.store.get_all();
        self.store.clear();
        if let Err(e) = self.store.persist() {
            self.store.replace_all(previous);
            self.notifier.error("Failed to save favorites");
            return Err(e);
        }
        self.refresh_views();
        self.notifier.info("All favorites cleared");
        Ok(())
    }

    /// Replaces the favorites with an imported JSON document.
    pub fn import_favorites(&mut self, json: &str) -> Result<usize, ImportError> {
        let result = export_import::import_json(&mut self.store, json);
        self.refresh_views();
        match &result {
            Ok(_) => self.notifier.success("Favorites imported"),
            Err(e) => self.notifier.error(format!("Failed to import favorites: {}", e)),
        }
        result
    }

    /// Merges an imported JSON document into the favorites.
    pub fn merge_favorites(&mut self, json: &str) -> Result<usize, ImportError> {
        let result = export_import::merge_import(&mut self.store, json);
        self.refresh_views();
        match &result {
            Ok(added) => self
                .notifier
                .success(format!("Merged {} new favorites", added)),
            Err(_) => self.notifier.error("Failed to merge favorites"),
        }
        result
    }

    /// File name and contents for a download of the favorites.
    pub fn export_favorites(&self, format: ExportFormat) -> (String, String) {
        let content = match format {
            ExportFormat::Json => export_import::export_json(self.store.as_slice()),
            ExportFormat::Csv => export_import::export_csv(self.store.as_slice()),
        };
        (export_import::export_filename_today(format), content)
    }

    // --- favorites grid gestures ---

    pub fn open_favorite_at(&mut self, index: usize) -> bool {
        self.renderer
            .click_card(index, &self.store, &mut self.opener, &mut self.notifier)
    }

    pub fn remove_favorite_at(&mut self, index: usize) -> bool {
        let removed = self
            .renderer
            .click_remove(index, &mut self.store, &mut self.notifier);
        if removed {
            self.refresh_indicators();
        }
        removed
    }

    pub fn drag_start(&mut self, index: usize) -> bool {
        self.renderer.drag_start(index, &self.store)
    }

    pub fn drag_over(&mut self, index: usize) -> bool {
        self.renderer.drag_over(index, &mut self.store)
    }

    pub fn drag_enter(&mut self, index: usize) {
        self.renderer.drag_enter(index, &self.store);
    }

    pub fn drag_leave(&mut self, index: usize) {
        self.renderer.drag_leave(index, &self.store);
    }

    pub fn drop_favorite(&mut self) -> bool {
        self.renderer.drop_card(&self.store, &mut self.notifier)
    }

    pub fn drag_end(&mut self) {
        self.renderer.drag_end(&self.store);
    }

    pub fn touch_start(&mut self, index: usize, point: (f64, f64)) -> bool {
        self.renderer.touch_start(index, point, &self.store)
    }

    /// `target` is the favorite under the finger, if any.
    pub fn touch_move(&mut self, target: Option<usize>, point: (f64, f64)) -> bool {
        self.renderer.touch_move(target, point, &mut self.store)
    }

    pub fn touch_end(&mut self) -> bool {
        self.renderer.touch_end(&self.store, &mut self.notifier)
    }

    pub fn touch_cancel(&mut self) {
        self.renderer.touch_cancel(&self.store);
    }

    pub fn icon_failed(&self, index: usize) -> bool {
        self.renderer.icon_failed(index)
    }

    // --- accessors ---

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    pub fn store(&self) -> &FavoritesStore {
        &self.store
    }

    pub fn renderer(&self) -> &FavoritesRenderer<S> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut FavoritesRenderer<S> {
        &mut self.renderer
    }

    pub fn search(&self) -> &SearchFilterController {
        &self.search
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.theme
    }

    pub fn recent(&self) -> &RecentManager {
        &self.recent
    }

    pub fn shortcuts(&self) -> &ShortcutManager {
        &self.shortcuts
    }

    pub fn shortcuts_mut(&mut self) -> &mut ShortcutManager {
        &mut self.shortcuts
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    pub fn visible(&self) -> &FilterResult {
        &self.visible
    }

    pub fn help_visible(&self) -> bool {
        self.help_visible
    }

    pub fn search_focused(&self) -> bool {
        self.search_focused
    }

    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        self.notifier.drain()
    }

    /// Re-renders favorites and refreshes indicators, counters and visibility.
    fn refresh_views(&mut self) {
        self.renderer.render(self.store.as_slice());
        self.refresh_indicators();
    }

    fn refresh_indicators(&mut self) {
        self.renderer.refresh_indicators(&self.registry, &self.store);
        self.refresh_visibility();
    }

    fn refresh_visibility(&mut self) {
        self.visible = self.search.apply(&self.registry, &self.store);
        let counters = self.search.counters(&self.registry, &self.store);
        self.renderer.update_counters(&counters);
    }
}
