use crate::services::{ApplicationContext, ServiceRegistry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity a plugin reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl PluginMetadata {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
        }
    }
}

/// Contract implemented by every module.
///
/// Both phases have no-op defaults; most plugins only need one of them.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn metadata(&self) -> PluginMetadata;

    /// Phase one: register services, repositories and seeders.
    /// Other plugins' services may not exist yet.
    fn configure_services(&self, services: &mut ServiceRegistry) -> anyhow::Result<()> {
        let _ = services;
        Ok(())
    }

    /// Phase two: wire up behaviour (event subscriptions, background work).
    /// Every enabled plugin's services are registered by now.
    async fn activate(&self, context: &ApplicationContext) -> anyhow::Result<()> {
        let _ = context;
        Ok(())
    }
}

/// Constructor exported by each module.
pub type PluginFactory = fn() -> Box<dyn Plugin>;

/// Explicit, ordered list of the modules compiled into a host.
#[derive(Debug, Clone, Default)]
pub struct PluginCatalog {
    factories: Vec<PluginFactory>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, factory: PluginFactory) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn push(&mut self, factory: PluginFactory) {
        self.factories.push(factory);
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub(crate) fn instantiate(&self) -> impl Iterator<Item = Box<dyn Plugin>> + '_ {
        self.factories.iter().map(|factory| factory())
    }
}
