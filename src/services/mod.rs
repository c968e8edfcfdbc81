// LinkHub services
// Services hold the page's engines and controllers: storage, cards, search,
// rendering, theme, settings, export/import and the host-facing notifier.

pub mod card_registry;
pub mod export_import;
pub mod favorites_renderer;
pub mod link_opener;
pub mod local_storage;
pub mod notifier;
pub mod search_filter;
pub mod settings_engine;
pub mod theme_engine;
