//! Which discovered plugins start enabled.

use serde::{Deserialize, Serialize};

/// How `PluginPolicy::names` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Every plugin is enabled; `names` is ignored.
    #[default]
    Unrestricted,
    /// Only the listed plugins are enabled.
    Allowlist,
    /// All plugins except the listed ones are enabled.
    Denylist,
}

/// Plugin enablement policy (the `[plugins]` section of the host config).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginPolicy {
    #[serde(default)]
    pub mode: PolicyMode,
    #[serde(default)]
    pub names: Vec<String>,
}

impl PluginPolicy {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn allow(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            mode: PolicyMode::Allowlist,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn deny(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            mode: PolicyMode::Denylist,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a plugin starts enabled.
    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        let listed = self.names.iter().any(|n| n == name);
        match self.mode {
            PolicyMode::Unrestricted => true,
            PolicyMode::Allowlist => listed,
            PolicyMode::Denylist => !listed,
        }
    }
}
