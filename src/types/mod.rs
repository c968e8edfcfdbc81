// LinkHub shared type definitions
// Each submodule defines types used across the application.

pub mod bookmark;
pub mod errors;
pub mod recent;
pub mod settings;
pub mod toast;
pub mod view;
