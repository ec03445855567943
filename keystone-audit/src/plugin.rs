use crate::record::AuditRecord;
use crate::trail::{AuditTrail, AuditTrailRegistrar};
use anyhow::Context;
use async_trait::async_trait;
use keystone_events::EventBus;
use keystone_plugin_host::{Plugin, PluginMetadata, ServiceRegistry};
use keystone_seeding::Seeder;
use keystone_storage::{InMemoryRepository, Repository, StoreHandle};
use keystone_types::ExecutionContextAccessor;
use std::sync::Arc;

/// Table holding audit records.
pub const AUDIT_TABLE: &str = "audit_records";

/// Registers the audit repository, [`AuditTrail`] and [`AuditTrailRegistrar`].
///
/// Needs `Arc<EventBus>`, `Arc<dyn ExecutionContextAccessor>` and
/// `Arc<dyn StoreHandle>` to be registered by the host beforehand.
#[derive(Debug, Default)]
pub struct AuditPlugin;

impl AuditPlugin {
    pub fn create() -> Box<dyn Plugin> {
        Box::new(Self)
    }
}

#[async_trait]
impl Plugin for AuditPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("audit", env!("CARGO_PKG_VERSION"), "Entity audit trail")
    }

    fn configure_services(&self, services: &mut ServiceRegistry) -> anyhow::Result<()> {
        let bus = services.require::<Arc<EventBus>>()?;
        let context = services
            .require::<Arc<dyn ExecutionContextAccessor>>()
            .context("audit trail needs the execution context")?;
        let store = services.require::<Arc<dyn StoreHandle>>()?;

        // Not wired to the bus: storing a record publishes nothing.
        let records: Arc<dyn Repository<AuditRecord>> = Arc::new(InMemoryRepository::<AuditRecord>::new());

        services.insert(records.clone());
        services.insert(Arc::new(AuditTrail::new(records.clone())));
        services.insert(Arc::new(AuditTrailRegistrar::new(bus, records, context)));

        let seeder: Arc<dyn Seeder> = Arc::new(AuditSchemaSeeder::new(store));
        services.add(seeder);
        Ok(())
    }
}

/// Creates the audit table. Records are never seeded.
pub struct AuditSchemaSeeder {
    store: Arc<dyn StoreHandle>,
}

impl AuditSchemaSeeder {
    pub fn new(store: Arc<dyn StoreHandle>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Seeder for AuditSchemaSeeder {
    fn name(&self) -> &str {
        "audit"
    }

    fn order(&self) -> i32 {
        20
    }

    async fn should_create_schema(&self) -> anyhow::Result<bool> {
        Ok(!self.store.table_exists(AUDIT_TABLE).await?)
    }

    async fn create_schema(&self) -> anyhow::Result<()> {
        self.store.create_table(AUDIT_TABLE).await?;
        Ok(())
    }

    async fn should_seed(&self) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn seed_data(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
