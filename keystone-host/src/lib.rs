//! Keystone application host.
//!
//! Wires the core crates together: loads [`HostConfig`], builds the shared
//! services, runs the plugin lifecycle and then seeding. The bundled
//! modules live under [`modules`].

pub mod bootstrap;
pub mod config;
pub mod modules;
pub mod telemetry;

pub use bootstrap::{bootstrap, bootstrap_with_store, default_catalog, BootstrapError, Host};
pub use config::{ConfigError, HostConfig, HostSettings, LoggingConfig, SeedingConfig};
