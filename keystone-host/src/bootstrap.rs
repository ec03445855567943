//! The host startup sequence.
//!
//! config → shared services → discover → configure_services → activate →
//! seal the bus → seeding. Every step runs on the calling task, one after
//! the other; the first failure aborts startup.

use crate::config::HostConfig;
use crate::modules::{settings::CorePlugin, todo::TodoPlugin};
use keystone_audit::AuditPlugin;
use keystone_events::{CancellationToken, EventBus};
use keystone_plugin_host::{
    ActivationReport, ApplicationContext, PluginCatalog, PluginDescriptor, PluginHost, PluginHostError,
    ServiceRegistry,
};
use keystone_seeding::{SeedingError, SeedingOrchestrator, SeedingReport};
use keystone_storage::{InMemoryCatalog, StoreHandle};
use keystone_types::{ExecutionContext, ExecutionContextAccessor, SharedExecutionContext};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("plugin startup failed: {0}")]
    Plugin(#[from] PluginHostError),

    #[error("seeding failed: {0}")]
    Seeding(#[from] SeedingError),
}

/// Modules compiled into the host, in activation order.
///
/// `todo` is listed before `audit` and still finds the audit registrar
/// during activation.
pub fn default_catalog() -> PluginCatalog {
    PluginCatalog::new()
        .with(CorePlugin::create)
        .with(TodoPlugin::create)
        .with(AuditPlugin::create)
}

/// A started host.
pub struct Host {
    pub config: HostConfig,
    pub bus: Arc<EventBus>,
    pub store: Arc<InMemoryCatalog>,
    /// Set by the request layer for each request it serves.
    pub execution: SharedExecutionContext,
    pub context: ApplicationContext,
    pub activation: ActivationReport,
    /// `None` when seeding is disabled in config.
    pub seeding: Option<SeedingReport>,
    plugins: PluginHost,
}

impl Host {
    pub fn plugins(&self) -> Vec<PluginDescriptor> {
        self.plugins.list_plugins()
    }
}

pub async fn bootstrap(
    config: HostConfig,
    catalog: &PluginCatalog,
    cancel: CancellationToken,
) -> Result<Host, BootstrapError> {
    bootstrap_with_store(config, catalog, Arc::new(InMemoryCatalog::new()), cancel).await
}

/// As [`bootstrap`], against an existing store.
pub async fn bootstrap_with_store(
    config: HostConfig,
    catalog: &PluginCatalog,
    store: Arc<InMemoryCatalog>,
    cancel: CancellationToken,
) -> Result<Host, BootstrapError> {
    let bus = Arc::new(EventBus::new(config.events.clone()));
    let execution = SharedExecutionContext::new(ExecutionContext::anonymous());

    let mut services = ServiceRegistry::new();
    services.insert(bus.clone());
    let store_handle: Arc<dyn StoreHandle> = store.clone();
    services.insert(store_handle.clone());
    let accessor: Arc<dyn ExecutionContextAccessor> = Arc::new(execution.clone());
    services.insert(accessor);
    services.insert(Arc::new(config.settings.clone()));

    let mut plugins = PluginHost::discover(catalog, config.plugins.clone())?;
    plugins.configure_services(&mut services).inspect_err(|e| error!("Startup aborted: {}", e))?;

    let mut orchestrator = SeedingOrchestrator::from_services(&services, store_handle);
    for condition in config.seeding_conditions() {
        orchestrator = orchestrator.with_condition(condition);
    }

    let context = ApplicationContext::new(services, cancel.clone());
    let activation = plugins
        .activate(&context)
        .await
        .inspect_err(|e| error!("Startup aborted: {}", e))?;
    bus.seal();
    info!(
        activated = activation.activated.len(),
        skipped = activation.skipped.len(),
        "Plugins activated, event subscriptions sealed"
    );

    let seeding = if config.seeding.enabled {
        let report = orchestrator
            .run(&cancel)
            .await
            .inspect_err(|e| error!("Startup aborted: {}", e))?;
        Some(report)
    } else {
        info!("Seeding disabled by config");
        None
    };

    for plugin in plugins.list_plugins() {
        info!(
            plugin = %plugin.name,
            version = %plugin.version,
            enabled = plugin.enabled,
            state = %plugin.state,
            "Plugin"
        );
    }

    Ok(Host {
        config,
        bus,
        store,
        execution,
        context,
        activation,
        seeding,
        plugins,
    })
}
