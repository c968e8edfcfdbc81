//! Favorites Renderer for LinkHub.
//!
//! Projects the favorites list onto a [`FavoritesSurface`] and turns user
//! gestures (open, remove, drag, touch drag) back into store calls.
//!
//! Every render clears the grid and rebuilds it. Renders are guarded
//! against re-entry: a render requested while one is in progress returns
//! [`RenderOutcome::Skipped`] without touching the surface.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, warn};

use crate::managers::favorites_store::{FavoritesStore, FavoritesStoreTrait};
use crate::services::card_registry::{CardRegistry, CardRegistryTrait};
use crate::services::link_opener::{LinkOpener, OpenPolicy};
use crate::services::notifier::Notifier;
use crate::types::bookmark::BookmarkRecord;
use crate::types::errors::OpenError;
use crate::types::view::FavoriteCardView;

/// The page region favorites are drawn into.
pub trait FavoritesSurface {
    fn set_section_visible(&mut self, visible: bool);
    fn clear_grid(&mut self);
    fn append_card(&mut self, card: &FavoriteCardView);
    /// Replaces the image source of the card at `index`.
    fn set_icon(&mut self, index: usize, src: &str);
    /// Updates a badge such as `all`, `favorites` or a category.
    fn set_counter(&mut self, name: &str, count: usize);
    /// Star indicator on a main-grid card.
    fn set_card_favorited(&mut self, url: &str, favorited: bool);
}

/// Surface that keeps the region in memory and renders it as HTML.
#[derive(Debug, Default, Clone)]
pub struct HtmlSurface {
    pub section_visible: bool,
    pub cards: Vec<FavoriteCardView>,
    pub counters: BTreeMap<String, usize>,
    pub favorited: BTreeMap<String, bool>,
    /// Number of times the grid was cleared.
    pub rebuilds: usize,
}

impl HtmlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_html(&self) -> String {
        if !self.section_visible {
            return "<section id=\"favoritesSection\" style=\"display: none\"></section>"
                .to_string();
        }
        let cards: String = self.cards.iter().map(FavoriteCardView::to_html).collect();
        format!(
            "<section id=\"favoritesSection\"><div id=\"favoritesGrid\" class=\"links-grid\">{}</div></section>",
            cards
        )
    }
}

impl FavoritesSurface for HtmlSurface {
    fn set_section_visible(&mut self, visible: bool) {
        self.section_visible = visible;
    }

    fn clear_grid(&mut self) {
        self.cards.clear();
        self.rebuilds += 1;
    }

    fn append_card(&mut self, card: &FavoriteCardView) {
        self.cards.push(card.clone());
    }

    fn set_icon(&mut self, index: usize, src: &str) {
        if let Some(card) = self.cards.get_mut(index) {
            card.icon_src = src.to_string();
        }
    }

    fn set_counter(&mut self, name: &str, count: usize) {
        self.counters.insert(name.to_string(), count);
    }

    fn set_card_favorited(&mut self, url: &str, favorited: bool) {
        self.favorited.insert(url.to_string(), favorited);
    }
}

/// Result of a [`FavoritesRenderer::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The grid was rebuilt with this many cards.
    Rendered(usize),
    /// The list is empty and the section is hidden.
    Hidden,
    /// Another render was in progress.
    Skipped,
}

/// Drag-and-drop state shared by pointer and touch gestures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// A touch is down but has not moved far enough to count as a drag.
    Pending { index: usize, start: (f64, f64) },
    Dragging { from: usize, over: Option<usize> },
}

/// Returns `true` for icon sources that may be used as-is: `data:`,
/// `http:`, `https:` and same-origin absolute paths.
pub fn is_safe_icon(icon: &str) -> bool {
    let icon = icon.trim();
    icon.starts_with("data:")
        || icon.starts_with("http://")
        || icon.starts_with("https://")
        || (icon.starts_with('/') && !icon.starts_with("//"))
}

/// Returns `true` for a non-empty relative reference such as `icons/a.svg`
/// or `./a.png`: no scheme and not protocol-relative.
fn is_relative_path(icon: &str) -> bool {
    if icon.is_empty() || icon.starts_with('/') {
        return false;
    }
    let head_end = icon.find(['/', '?', '#']).unwrap_or(icon.len());
    !icon[..head_end].contains(':')
}

/// Resolves the icon to display. Same-origin and relative paths are made
/// absolute with `origin`; anything unsafe becomes the placeholder for `title`.
pub fn resolve_icon(icon: &str, title: &str, origin: &str) -> String {
    let trimmed = icon.trim();
    let base = origin.trim_end_matches('/');
    if is_relative_path(trimmed) {
        return format!("{}/{}", base, trimmed.trim_start_matches("./"));
    }
    if !is_safe_icon(trimmed) {
        return placeholder_icon(title);
    }
    if trimmed.starts_with('/') {
        return format!("{}{}", base, trimmed);
    }
    trimmed.to_string()
}

/// A generated SVG showing the title's uppercased first letter, or `?`.
pub fn placeholder_icon(title: &str) -> String {
    let initial: String = title
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string());
    let svg = format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"32\" height=\"32\" viewBox=\"0 0 32 32\">",
            "<rect width=\"32\" height=\"32\" rx=\"6\" fill=\"#6366f1\"/>",
            "<text x=\"16\" y=\"21\" text-anchor=\"middle\" font-family=\"sans-serif\" ",
            "font-size=\"16\" fill=\"#ffffff\">{}</text></svg>"
        ),
        crate::types::view::escape_html(&initial)
    );
    format!("data:image/svg+xml;base64,{}", BASE64.encode(svg))
}

/// Clears the in-progress flag when a render ends, on every exit path.
struct RenderGuard<'a>(&'a Cell<bool>);

impl<'a> RenderGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(flag))
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct FavoritesRenderer<S: FavoritesSurface> {
    surface: RefCell<S>,
    rendering: Cell<bool>,
    /// Placeholder per rendered card, used when its icon fails to load.
    fallbacks: RefCell<Vec<String>>,
    origin: String,
    touch_threshold_px: f64,
    drag: DragState,
}

impl<S: FavoritesSurface> FavoritesRenderer<S> {
    pub fn new(surface: S, origin: &str, touch_threshold_px: f64) -> Self {
        Self {
            surface: RefCell::new(surface),
            rendering: Cell::new(false),
            fallbacks: RefCell::new(Vec::new()),
            origin: origin.to_string(),
            touch_threshold_px,
            drag: DragState::Idle,
        }
    }

    pub fn surface(&self) -> Ref<'_, S> {
        self.surface.borrow()
    }

    pub fn surface_mut(&self) -> RefMut<'_, S> {
        self.surface.borrow_mut()
    }

    pub fn into_surface(self) -> S {
        self.surface.into_inner()
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.get()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Rebuilds the favorites region from `favorites`.
    pub fn render(&self, favorites: &[BookmarkRecord]) -> RenderOutcome {
        let Some(_guard) = RenderGuard::acquire(&self.rendering) else {
            debug!("render already in progress, skipping");
            return RenderOutcome::Skipped;
        };

        let mut surface = self.surface.borrow_mut();
        if favorites.is_empty() {
            surface.clear_grid();
            surface.set_section_visible(false);
            self.fallbacks.borrow_mut().clear();
            return RenderOutcome::Hidden;
        }

        surface.set_section_visible(true);
        surface.clear_grid();
        let (dragging, over) = match self.drag {
            DragState::Dragging { from, over } => (Some(from), over),
            _ => (None, None),
        };

        let mut fallbacks = Vec::with_capacity(favorites.len());
        for (index, record) in favorites.iter().enumerate() {
            let fallback = placeholder_icon(&record.title);
            let view = FavoriteCardView {
                index,
                url: record.url.clone(),
                title: record.title.clone(),
                description: record.description.clone(),
                category: record.category.clone(),
                icon_src: resolve_icon(&record.icon, &record.title, &self.origin),
                fallback_icon: fallback.clone(),
                dragging: dragging == Some(index),
                drag_over: over == Some(index),
            };
            surface.append_card(&view);
            fallbacks.push(fallback);
        }
        *self.fallbacks.borrow_mut() = fallbacks;
        RenderOutcome::Rendered(favorites.len())
    }

    /// The image of card `index` failed to load: show its placeholder.
    pub fn icon_failed(&self, index: usize) -> bool {
        let fallbacks = self.fallbacks.borrow();
        match fallbacks.get(index) {
            Some(fallback) => {
                self.surface.borrow_mut().set_icon(index, fallback);
                true
            }
            None => false,
        }
    }

    /// Syncs the star indicator on every registry card with the store.
    pub fn refresh_indicators(&self, registry: &CardRegistry, store: &FavoritesStore) {
        let mut surface = self.surface.borrow_mut();
        for card in registry.all() {
            surface.set_card_favorited(&card.url, store.is_favorite(&card.url));
        }
    }

    pub fn update_counters(&self, counters: &BTreeMap<String, usize>) {
        let mut surface = self.surface.borrow_mut();
        for (name, count) in counters {
            surface.set_counter(name, *count);
        }
    }

    /// Click on a card body: open its URL in an isolated context.
    pub fn click_card<O: LinkOpener>(
        &mut self,
        index: usize,
        store: &FavoritesStore,
        opener: &mut O,
        notifier: &mut Notifier,
    ) -> bool {
        let Some(record) = store.as_slice().get(index) else {
            return false;
        };
        match opener.open(&record.url, OpenPolicy::isolated()) {
            Ok(()) => true,
            Err(OpenError::Blocked(_)) => {
                notifier.error("Popup blocked. Allow popups to open links.");
                false
            }
            Err(e) => {
                warn!(error = %e, "failed to open favorite");
                notifier.error("Could not open link");
                false
            }
        }
    }

    /// Click on a card's remove button. Never opens the link.
    pub fn click_remove(
        &mut self,
        index: usize,
        store: &mut FavoritesStore,
        notifier: &mut Notifier,
    ) -> bool {
        let Some(removed) = store.as_slice().get(index).cloned() else {
            return false;
        };
        if !store.remove(&removed.url) {
            return false;
        }
        if let Err(e) = store.persist() {
            warn!(error = %e, "failed to save favorites after removal");
            store.insert_at(index, removed);
            notifier.error("Failed to save favorites");
            return false;
        }
        self.render(store.as_slice());
        notifier.info("Removed from favorites");
        true
    }

    pub fn drag_start(&mut self, index: usize, store: &FavoritesStore) -> bool {
        if index >= store.len() {
            return false;
        }
        self.drag = DragState::Dragging {
            from: index,
            over: None,
        };
        self.render(store.as_slice());
        true
    }

    /// Dragging over `target` moves the dragged card there immediately.
    /// Returns `true` when the list was reordered.
    pub fn drag_over(&mut self, target: usize, store: &mut FavoritesStore) -> bool {
        let DragState::Dragging { from, .. } = self.drag else {
            return false;
        };
        if from == target || target >= store.len() {
            return false;
        }
        match store.reorder(from, target) {
            Ok(()) => {
                self.drag = DragState::Dragging {
                    from: target,
                    over: None,
                };
                self.render(store.as_slice());
                true
            }
            Err(e) => {
                debug!(error = %e, "ignoring drag over");
                false
            }
        }
    }

    /// Pointer entered `target` without reordering (e.g. over itself).
    pub fn drag_enter(&mut self, target: usize, store: &FavoritesStore) {
        if let DragState::Dragging { from, .. } = self.drag {
            if target != from && target < store.len() {
                self.drag = DragState::Dragging {
                    from,
                    over: Some(target),
                };
                self.render(store.as_slice());
            }
        }
    }

    pub fn drag_leave(&mut self, target: usize, store: &FavoritesStore) {
        if let DragState::Dragging { from, over } = self.drag {
            if over == Some(target) {
                self.drag = DragState::Dragging { from, over: None };
                self.render(store.as_slice());
            }
        }
    }

    /// Drop commits the already reordered list. No reordering happens here.
    pub fn drop_card(&mut self, store: &FavoritesStore, notifier: &mut Notifier) -> bool {
        if !matches!(self.drag, DragState::Dragging { .. }) {
            return false;
        }
        match store.persist() {
            Ok(()) => {
                notifier.success("Favorites reordered");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to save reordered favorites");
                notifier.error("Failed to reorder favorites");
                false
            }
        }
    }

    /// Ends any drag, dropped or not, and clears every marker.
    pub fn drag_end(&mut self, store: &FavoritesStore) {
        let was_idle = self.drag == DragState::Idle;
        self.drag = DragState::Idle;
        if !was_idle {
            self.render(store.as_slice());
        }
    }

    pub fn touch_start(&mut self, index: usize, point: (f64, f64), store: &FavoritesStore) -> bool {
        if index >= store.len() {
            return false;
        }
        self.drag = DragState::Pending {
            index,
            start: point,
        };
        true
    }

    /// The finger moved to `point` over card `target`. The drag engages
    /// only once the movement passes the threshold.
    pub fn touch_move(
        &mut self,
        target: Option<usize>,
        point: (f64, f64),
        store: &mut FavoritesStore,
    ) -> bool {
        if let DragState::Pending { index, start } = self.drag {
            let (dx, dy) = (point.0 - start.0, point.1 - start.1);
            if (dx * dx + dy * dy).sqrt() < self.touch_threshold_px {
                return false;
            }
            self.drag_start(index, store);
        }
        match target {
            Some(target) => self.drag_over(target, store),
            None => false,
        }
    }

    /// Finger lifted. Returns `true` if this ended a drag rather than a tap.
    pub fn touch_end(&mut self, store: &FavoritesStore, notifier: &mut Notifier) -> bool {
        match self.drag {
            DragState::Dragging { .. } => {
                self.drop_card(store, notifier);
                self.drag_end(store);
                true
            }
            DragState::Pending { .. } => {
                self.drag = DragState::Idle;
                false
            }
            DragState::Idle => false,
        }
    }

    pub fn touch_cancel(&mut self, store: &FavoritesStore) {
        self.drag_end(store);
    }
}
