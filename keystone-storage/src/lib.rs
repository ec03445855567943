//! Storage layer contracts for keystone.
//!
//! The core never talks to a database engine directly. Modules and the
//! audit trail persist through a [`Repository`]; seeders and seeding
//! conditions inspect the store through a [`StoreHandle`].
//!
//! # Architecture
//!
//! - [`InMemoryRepository`] keeps entities in insertion order and, when wired
//!   to an [`keystone_events::EventBus`], publishes a domain event after every
//!   mutation (the data-access side of the event contract)
//! - [`InMemoryCatalog`] tracks which tables exist, which is all schema
//!   creation needs to be idempotent

mod catalog;
mod error;
mod repository;

pub use catalog::{InMemoryCatalog, StoreHandle};
pub use error::{StorageError, StorageResult};
pub use repository::{InMemoryRepository, PublishPolicy, Repository};
