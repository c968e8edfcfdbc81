//! LinkHub, a personal link hub page: bookmark cards with search and
//! category filters, a persisted and reorderable favorites list kept in sync
//! across tabs, light/dark theming and keyboard shortcuts.
//!
//! The browser is modelled by traits (storage area, favorites surface, link
//! opener) so every component runs and tests without one.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;
