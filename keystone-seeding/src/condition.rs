//! Seeding gates and their AND/OR composition.

use async_trait::async_trait;
use keystone_storage::StoreHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Boolean gate over the current store state.
///
/// Must be pure; it may be evaluated any number of times.
#[async_trait]
pub trait SeedingCondition: Send + Sync {
    fn name(&self) -> &str;

    async fn should_seed(&self, store: &dyn StoreHandle) -> anyhow::Result<bool>;
}

/// Evaluates a condition, treating an error as "not met".
pub(crate) async fn is_met(condition: &dyn SeedingCondition, store: &dyn StoreHandle) -> bool {
    match condition.should_seed(store).await {
        Ok(met) => {
            debug!(condition = %condition.name(), met, "Seeding condition evaluated");
            met
        }
        Err(e) => {
            warn!(condition = %condition.name(), "Seeding condition failed, treating as not met: {:#}", e);
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeMode {
    /// Every sub-condition must hold; stops at the first false.
    All,
    /// One sub-condition must hold; stops at the first true.
    Any,
}

/// AND/OR tree of conditions. An empty set holds in either mode.
pub struct CompositeCondition {
    name: String,
    mode: CompositeMode,
    conditions: Vec<Arc<dyn SeedingCondition>>,
}

impl CompositeCondition {
    pub fn all(name: impl Into<String>, conditions: Vec<Arc<dyn SeedingCondition>>) -> Self {
        Self {
            name: name.into(),
            mode: CompositeMode::All,
            conditions,
        }
    }

    pub fn any(name: impl Into<String>, conditions: Vec<Arc<dyn SeedingCondition>>) -> Self {
        Self {
            name: name.into(),
            mode: CompositeMode::Any,
            conditions,
        }
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[async_trait]
impl SeedingCondition for CompositeCondition {
    fn name(&self) -> &str {
        &self.name
    }

    async fn should_seed(&self, store: &dyn StoreHandle) -> anyhow::Result<bool> {
        if self.conditions.is_empty() {
            return Ok(true);
        }
        for condition in &self.conditions {
            let met = is_met(condition.as_ref(), store).await;
            match (self.mode, met) {
                (CompositeMode::All, false) => return Ok(false),
                (CompositeMode::Any, true) => return Ok(true),
                _ => {}
            }
        }
        Ok(self.mode == CompositeMode::All)
    }
}

/// Holds when the store's database has been provisioned.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseExists;

#[async_trait]
impl SeedingCondition for DatabaseExists {
    fn name(&self) -> &str {
        "database_exists"
    }

    async fn should_seed(&self, store: &dyn StoreHandle) -> anyhow::Result<bool> {
        Ok(store.database_exists().await?)
    }
}

/// Holds when a host setting has the expected value.
#[derive(Debug, Clone)]
pub struct SettingEquals {
    name: String,
    key: String,
    expected: String,
    settings: Arc<BTreeMap<String, String>>,
}

impl SettingEquals {
    pub fn new(
        key: impl Into<String>,
        expected: impl Into<String>,
        settings: Arc<BTreeMap<String, String>>,
    ) -> Self {
        let key = key.into();
        let expected = expected.into();
        Self {
            name: format!("setting {key} = {expected}"),
            key,
            expected,
            settings,
        }
    }
}

#[async_trait]
impl SeedingCondition for SettingEquals {
    fn name(&self) -> &str {
        &self.name
    }

    async fn should_seed(&self, _store: &dyn StoreHandle) -> anyhow::Result<bool> {
        Ok(self.settings.get(&self.key).is_some_and(|v| *v == self.expected))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSeed;

#[async_trait]
impl SeedingCondition for AlwaysSeed {
    fn name(&self) -> &str {
        "always"
    }

    async fn should_seed(&self, _store: &dyn StoreHandle) -> anyhow::Result<bool> {
        Ok(true)
    }
}
