//! Host configuration (`keystone.toml`).
//!
//! ```toml
//! [plugins]
//! mode = "denylist"
//! names = ["todo"]
//!
//! [seeding]
//! enabled = true
//! require_database = true
//! required_flags = { "seed.demo" = "true" }
//!
//! [events]
//! dispatch = "concurrent"
//!
//! [logging]
//! level = "debug"
//!
//! [settings]
//! "seed.demo" = "true"
//! ```

use keystone_events::EventBusConfig;
use keystone_plugin_host::PluginPolicy;
use keystone_seeding::{DatabaseExists, SeedingCondition, SettingEquals};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "keystone.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub plugins: PluginPolicy,
    pub seeding: SeedingConfig,
    pub events: EventBusConfig,
    pub logging: LoggingConfig,
    pub settings: HostSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    /// When false the host skips seeding entirely.
    pub enabled: bool,
    /// Gate seeding on the store's database existing.
    pub require_database: bool,
    /// Gate seeding on each `[settings]` key having the given value.
    pub required_flags: BTreeMap<String, String>,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_database: false,
            required_flags: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

/// Free-form string settings from `[settings]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostSettings(pub BTreeMap<String, String>);

impl HostSettings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl HostConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Reads and parses `path` without falling back.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`, using defaults if it is missing or broken.
    pub fn load_from(path: &Path) -> Self {
        Self::or_default(path, Self::load(path))
    }

    /// Logs the outcome of [`HostConfig::load`] and falls back to defaults.
    ///
    /// Split from `load` so the binary can install logging from the loaded
    /// level before reporting.
    pub fn or_default(path: &Path, loaded: Result<Self, ConfigError>) -> Self {
        match loaded {
            Ok(config) => {
                info!("Loaded host config from {:?}", path);
                config
            }
            Err(ConfigError::NotFound(_)) => {
                info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                warn!("{}. Falling back to defaults.", e);
                Self::default()
            }
        }
    }

    /// Global seeding gates derived from `[seeding]`.
    pub fn seeding_conditions(&self) -> Vec<Arc<dyn SeedingCondition>> {
        let mut conditions: Vec<Arc<dyn SeedingCondition>> = Vec::new();
        if self.seeding.require_database {
            conditions.push(Arc::new(DatabaseExists));
        }
        if !self.seeding.required_flags.is_empty() {
            let settings = Arc::new(self.settings.0.clone());
            for (key, expected) in &self.seeding.required_flags {
                conditions.push(Arc::new(SettingEquals::new(key.clone(), expected.clone(), settings.clone())));
            }
        }
        conditions
    }
}
