//! Plugin host for keystone.
//!
//! Activates an explicit, ordered set of independently authored modules in
//! two phases:
//!
//! 1. `configure_services`: every enabled plugin registers what it offers
//!    into a shared [`ServiceRegistry`], in registration order.
//! 2. `activate`: every enabled plugin is activated against the frozen
//!    registry, in the same order. A plugin may rely on any other plugin's
//!    services here, whichever order they activate in.
//!
//! Any failure in either phase aborts startup and names the plugin.
//! Disabled plugins are skipped but stay listed.

mod descriptor;
mod error;
mod manager;
mod plugin;
mod policy;
mod services;

pub use descriptor::{PluginDescriptor, PluginState};
pub use error::PluginHostError;
pub use manager::{ActivationReport, PluginHost};
pub use plugin::{Plugin, PluginCatalog, PluginFactory, PluginMetadata};
pub use policy::{PluginPolicy, PolicyMode};
pub use services::{ApplicationContext, ServiceRegistry};
