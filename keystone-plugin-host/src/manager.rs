//! Central plugin lifecycle manager.
//!
//! Owns every discovered plugin and drives them through the two startup
//! phases strictly in registration order. Nothing here runs concurrently:
//! later plugins may depend on what earlier phases registered.

use crate::descriptor::{PluginDescriptor, PluginState};
use crate::error::PluginHostError;
use crate::plugin::{Plugin, PluginCatalog};
use crate::policy::PluginPolicy;
use crate::services::{ApplicationContext, ServiceRegistry};
use serde::Serialize;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostPhase {
    Registering,
    ServicesConfigured,
    Activated,
    Failed,
}

impl HostPhase {
    fn as_str(self) -> &'static str {
        match self {
            HostPhase::Registering => "registering",
            HostPhase::ServicesConfigured => "services_configured",
            HostPhase::Activated => "activated",
            HostPhase::Failed => "failed",
        }
    }
}

/// Outcome of a successful activation phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub activated: Vec<String>,
    pub skipped: Vec<String>,
}

struct PluginEntry {
    descriptor: PluginDescriptor,
    plugin: Box<dyn Plugin>,
}

/// Manages the lifecycle of all registered plugins.
pub struct PluginHost {
    entries: Vec<PluginEntry>,
    policy: PluginPolicy,
    phase: HostPhase,
}

impl PluginHost {
    pub fn new(policy: PluginPolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
            phase: HostPhase::Registering,
        }
    }

    /// Instantiates every factory in `catalog`, in catalog order.
    pub fn discover(catalog: &PluginCatalog, policy: PluginPolicy) -> Result<Self, PluginHostError> {
        let mut host = Self::new(policy);
        for plugin in catalog.instantiate() {
            host.register(plugin)?;
        }
        info!(plugins = host.entries.len(), "Plugin discovery complete");
        Ok(host)
    }

    // ================================================================
    // Registration
    // ================================================================

    /// Adds a plugin. Its enabled flag comes from the host policy.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<(), PluginHostError> {
        self.expect_phase(HostPhase::Registering, "register plugins")?;

        let metadata = plugin.metadata();
        if self.entries.iter().any(|e| e.descriptor.name == metadata.name) {
            return Err(PluginHostError::PluginAlreadyRegistered(metadata.name));
        }

        let enabled = self.policy.is_plugin_enabled(&metadata.name);
        info!(
            plugin = %metadata.name,
            version = %metadata.version,
            enabled,
            "Plugin registered"
        );
        self.entries.push(PluginEntry {
            descriptor: PluginDescriptor::new(metadata, enabled),
            plugin,
        });
        Ok(())
    }

    /// Overrides a plugin's enabled flag. Only allowed before startup.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), PluginHostError> {
        self.expect_phase(HostPhase::Registering, "change enabled flags")?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.descriptor.name == name)
            .ok_or_else(|| PluginHostError::PluginNotFound(name.to_string()))?;
        entry.descriptor.enabled = enabled;
        Ok(())
    }

    // ================================================================
    // Introspection
    // ================================================================

    /// Every registered plugin, enabled or not, in registration order.
    pub fn list_plugins(&self) -> Vec<PluginDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    pub fn get_plugin(&self, name: &str) -> Result<&PluginDescriptor, PluginHostError> {
        self.entries
            .iter()
            .map(|e| &e.descriptor)
            .find(|d| d.name == name)
            .ok_or_else(|| PluginHostError::PluginNotFound(name.to_string()))
    }

    // ================================================================
    // Startup phases
    // ================================================================

    /// Phase one. Runs `configure_services` for every enabled plugin; the
    /// first failure aborts startup.
    pub fn configure_services(&mut self, services: &mut ServiceRegistry) -> Result<(), PluginHostError> {
        self.expect_phase(HostPhase::Registering, "configure services")?;

        for entry in &mut self.entries {
            let name = entry.descriptor.name.clone();
            if !entry.descriptor.enabled {
                debug!(plugin = %name, "Skipping disabled plugin");
                continue;
            }

            if let Err(source) = entry.plugin.configure_services(services) {
                entry.descriptor.state = PluginState::Failed;
                self.phase = HostPhase::Failed;
                error!(plugin = %name, "configure_services failed: {:#}", source);
                return Err(PluginHostError::ConfigureFailed { plugin: name, source });
            }

            entry.descriptor.state = PluginState::ServicesConfigured;
            debug!(plugin = %name, "Services configured");
        }

        self.phase = HostPhase::ServicesConfigured;
        info!(services = ?services.service_names(), "Service configuration complete");
        Ok(())
    }

    /// Phase two. Activates every enabled plugin in registration order.
    ///
    /// On failure, the error lists the plugins that had already activated.
    pub async fn activate(&mut self, context: &ApplicationContext) -> Result<ActivationReport, PluginHostError> {
        self.expect_phase(HostPhase::ServicesConfigured, "activate plugins")?;

        let mut report = ActivationReport::default();
        for entry in &mut self.entries {
            let name = entry.descriptor.name.clone();
            if !entry.descriptor.enabled {
                report.skipped.push(name);
                continue;
            }

            if context.cancellation().is_cancelled() {
                self.phase = HostPhase::Failed;
                info!(plugin = %name, "Activation cancelled");
                return Err(PluginHostError::Cancelled {
                    activated: report.activated,
                });
            }

            if let Err(source) = entry.plugin.activate(context).await {
                entry.descriptor.state = PluginState::Failed;
                self.phase = HostPhase::Failed;
                error!(
                    plugin = %name,
                    activated = ?report.activated,
                    "activate failed: {:#}",
                    source
                );
                return Err(PluginHostError::ActivationFailed {
                    plugin: name,
                    activated: report.activated,
                    source,
                });
            }

            entry.descriptor.state = PluginState::Activated;
            info!(plugin = %name, "Plugin activated");
            report.activated.push(name);
        }

        self.phase = HostPhase::Activated;
        Ok(report)
    }

    fn expect_phase(&self, expected: HostPhase, operation: &'static str) -> Result<(), PluginHostError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(PluginHostError::PhaseOrder {
                operation,
                phase: self.phase.as_str(),
            })
        }
    }
}
