//! Foundation module: the `settings` table other modules build on.

use crate::config::HostSettings;
use async_trait::async_trait;
use keystone_model::Entity;
use keystone_plugin_host::{Plugin, PluginMetadata, ServiceRegistry};
use keystone_seeding::Seeder;
use keystone_storage::{InMemoryRepository, Repository, StoreHandle};
use keystone_types::EntityId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SETTINGS_TABLE: &str = "settings";

/// Rows every installation starts with; `[settings]` entries override them.
const DEFAULT_SETTINGS: [(&str, &str); 2] = [("app.name", "keystone"), ("app.locale", "en")];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub id: EntityId,
    pub key: String,
    pub value: String,
}

impl Entity for Setting {
    const TYPE_NAME: &'static str = "Setting";

    fn id(&self) -> EntityId {
        self.id
    }
}

pub struct CorePlugin;

impl CorePlugin {
    pub fn create() -> Box<dyn Plugin> {
        Box::new(Self)
    }
}

#[async_trait]
impl Plugin for CorePlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("core", env!("CARGO_PKG_VERSION"), "Settings table and defaults")
    }

    fn configure_services(&self, services: &mut ServiceRegistry) -> anyhow::Result<()> {
        let store = services.require::<Arc<dyn StoreHandle>>()?;
        let settings = services.get::<Arc<HostSettings>>().unwrap_or_default();

        let repository: Arc<dyn Repository<Setting>> = Arc::new(InMemoryRepository::<Setting>::new());
        services.insert(repository.clone());

        let seeder: Arc<dyn Seeder> = Arc::new(SettingsSeeder {
            store,
            repository,
            settings,
        });
        services.add(seeder);
        Ok(())
    }
}

pub struct SettingsSeeder {
    store: Arc<dyn StoreHandle>,
    repository: Arc<dyn Repository<Setting>>,
    settings: Arc<HostSettings>,
}

impl SettingsSeeder {
    fn rows(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = DEFAULT_SETTINGS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (key, value) in self.settings.iter() {
            match rows.iter_mut().find(|(k, _)| k == key) {
                Some(row) => row.1 = value.to_string(),
                None => rows.push((key.to_string(), value.to_string())),
            }
        }
        rows
    }
}

#[async_trait]
impl Seeder for SettingsSeeder {
    fn name(&self) -> &str {
        "core"
    }

    fn order(&self) -> i32 {
        10
    }

    async fn should_create_schema(&self) -> anyhow::Result<bool> {
        Ok(!self.store.table_exists(SETTINGS_TABLE).await?)
    }

    async fn create_schema(&self) -> anyhow::Result<()> {
        self.store.create_table(SETTINGS_TABLE).await?;
        Ok(())
    }

    async fn should_seed(&self) -> anyhow::Result<bool> {
        Ok(self.repository.count().await? == 0)
    }

    async fn seed_data(&self) -> anyhow::Result<()> {
        for (key, value) in self.rows() {
            self.repository
                .add(Setting {
                    id: EntityId::new(),
                    key,
                    value,
                })
                .await?;
        }
        Ok(())
    }
}
