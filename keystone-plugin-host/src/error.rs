//! Error types for the plugin host.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginHostError {
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("plugin already registered: {0}")]
    PluginAlreadyRegistered(String),

    #[error("plugin '{plugin}' failed to configure services: {source:#}")]
    ConfigureFailed {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("plugin '{plugin}' failed to activate (already activated: {activated:?}): {source:#}")]
    ActivationFailed {
        plugin: String,
        activated: Vec<String>,
        #[source]
        source: anyhow::Error,
    },

    #[error("startup phase order violated: cannot {operation} while host is {phase}")]
    PhaseOrder {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("activation cancelled (already activated: {activated:?})")]
    Cancelled { activated: Vec<String> },

    #[error("service not registered: {0}")]
    ServiceNotRegistered(&'static str),
}

impl PluginHostError {
    /// The plugin that caused a startup-fatal failure, if any.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            PluginHostError::ConfigureFailed { plugin, .. }
            | PluginHostError::ActivationFailed { plugin, .. } => Some(plugin),
            _ => None,
        }
    }
}
