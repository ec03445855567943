//! Modules bundled with the host. Each exports one factory for the catalog.

pub mod settings;
pub mod todo;
