//! Sample feature module: todos, audited through the trail.

use async_trait::async_trait;
use keystone_audit::AuditTrailRegistrar;
use keystone_events::EventBus;
use keystone_model::{Auditable, Entity};
use keystone_plugin_host::{ApplicationContext, Plugin, PluginMetadata, ServiceRegistry};
use keystone_seeding::Seeder;
use keystone_storage::{InMemoryRepository, PublishPolicy, Repository, StoreHandle};
use keystone_types::EntityId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const TODO_TABLE: &str = "todos";

const STARTER_TODOS: [&str; 2] = ["Explore the plugin catalog", "Write your first module"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: EntityId,
    pub title: String,
    pub done: bool,
    pub version: u64,
}

impl Todo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            title: title.into(),
            done: false,
            version: 1,
        }
    }

    /// Marks the todo done and bumps its version.
    pub fn complete(&mut self) {
        self.done = true;
        self.version += 1;
    }
}

impl Entity for Todo {
    const TYPE_NAME: &'static str = "Todo";

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Auditable for Todo {
    fn version(&self) -> u64 {
        self.version
    }
}

pub struct TodoPlugin;

impl TodoPlugin {
    pub fn create() -> Box<dyn Plugin> {
        Box::new(Self)
    }
}

#[async_trait]
impl Plugin for TodoPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("todo", env!("CARGO_PKG_VERSION"), "Todo list with audit history")
    }

    fn configure_services(&self, services: &mut ServiceRegistry) -> anyhow::Result<()> {
        let bus = services.require::<Arc<EventBus>>()?;
        let store = services.require::<Arc<dyn StoreHandle>>()?;

        let repository: Arc<dyn Repository<Todo>> = Arc::new(InMemoryRepository::<Todo>::with_events(
            bus,
            PublishPolicy::Propagate,
        ));
        services.insert(repository.clone());

        let seeder: Arc<dyn Seeder> = Arc::new(TodoSeeder { store, repository });
        services.add(seeder);
        Ok(())
    }

    async fn activate(&self, context: &ApplicationContext) -> anyhow::Result<()> {
        // The audit module may be disabled by policy.
        match context.get::<Arc<AuditTrailRegistrar>>() {
            Some(registrar) => {
                registrar.track::<Todo>()?;
            }
            None => info!("Audit trail unavailable, todo changes are not audited"),
        }
        Ok(())
    }
}

pub struct TodoSeeder {
    store: Arc<dyn StoreHandle>,
    repository: Arc<dyn Repository<Todo>>,
}

#[async_trait]
impl Seeder for TodoSeeder {
    fn name(&self) -> &str {
        "todo"
    }

    fn order(&self) -> i32 {
        1000
    }

    async fn should_create_schema(&self) -> anyhow::Result<bool> {
        Ok(!self.store.table_exists(TODO_TABLE).await?)
    }

    async fn create_schema(&self) -> anyhow::Result<()> {
        self.store.create_table(TODO_TABLE).await?;
        Ok(())
    }

    async fn should_seed(&self) -> anyhow::Result<bool> {
        Ok(self.repository.count().await? == 0)
    }

    async fn seed_data(&self) -> anyhow::Result<()> {
        for title in STARTER_TODOS {
            self.repository.add(Todo::new(title)).await?;
        }
        Ok(())
    }
}
