use crate::plugin::PluginMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle position of one plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    Registered,
    ServicesConfigured,
    Activated,
    Failed,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PluginState::Registered => "registered",
            PluginState::ServicesConfigured => "services_configured",
            PluginState::Activated => "activated",
            PluginState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Host-owned view of a plugin: identity, enabled flag and state.
///
/// Created at discovery, mutated only by the host, and kept for the
/// lifetime of the process even when the plugin is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
    pub description: String,
    pub enabled: bool,
    pub state: PluginState,
}

impl PluginDescriptor {
    pub(crate) fn new(metadata: PluginMetadata, enabled: bool) -> Self {
        Self {
            name: metadata.name,
            version: metadata.version,
            description: metadata.description,
            enabled,
            state: PluginState::Registered,
        }
    }
}
