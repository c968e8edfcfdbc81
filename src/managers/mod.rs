// LinkHub state managers
// Managers own persisted collections: favorites, recently opened links, shortcuts.

pub mod favorites_store;
pub mod recent_manager;
pub mod shortcut_manager;
