//! Schema catalog: which database and tables exist.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::info;

/// Read/inspect access to the persistent store's schema.
///
/// Existence checks must be side-effect-free; seeders rely on them to make
/// schema creation idempotent.
#[async_trait]
pub trait StoreHandle: Send + Sync {
    async fn database_exists(&self) -> StorageResult<bool>;

    async fn table_exists(&self, table: &str) -> StorageResult<bool>;

    /// Creates a table. Fails with [`StorageError::Duplicate`] if it exists.
    async fn create_table(&self, table: &str) -> StorageResult<()>;
}

/// In-memory catalog backing tests and the sample host.
pub struct InMemoryCatalog {
    database_exists: AtomicBool,
    unavailable: AtomicBool,
    tables: RwLock<BTreeSet<String>>,
}

impl InMemoryCatalog {
    /// A catalog whose database exists but has no tables.
    pub fn new() -> Self {
        Self {
            database_exists: AtomicBool::new(true),
            unavailable: AtomicBool::new(false),
            tables: RwLock::new(BTreeSet::new()),
        }
    }

    /// A catalog whose database has not been provisioned yet.
    pub fn without_database() -> Self {
        let catalog = Self::new();
        catalog.database_exists.store(false, Ordering::Release);
        catalog
    }

    pub fn create_database(&self) {
        self.database_exists.store(true, Ordering::Release);
    }

    /// Simulates losing the connection: every call fails until restored.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    pub async fn tables(&self) -> Vec<String> {
        self.tables.read().await.iter().cloned().collect()
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::Acquire) {
            Err(StorageError::Unavailable("in-memory catalog offline".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreHandle for InMemoryCatalog {
    async fn database_exists(&self) -> StorageResult<bool> {
        self.check_available()?;
        Ok(self.database_exists.load(Ordering::Acquire))
    }

    async fn table_exists(&self, table: &str) -> StorageResult<bool> {
        self.check_available()?;
        Ok(self.tables.read().await.contains(table))
    }

    async fn create_table(&self, table: &str) -> StorageResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if !tables.insert(table.to_string()) {
            return Err(StorageError::Duplicate(format!("table {table}")));
        }
        self.database_exists.store(true, Ordering::Release);
        info!(table = %table, "Table created");
        Ok(())
    }
}
