//! Generic entity repositories.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use keystone_events::{CancellationToken, DomainEvent, EventBus};
use keystone_model::{Entity, EventKind};
use keystone_types::EntityId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Async add/query access to one entity type.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn add(&self, item: T) -> StorageResult<()>;

    async fn update(&self, item: T) -> StorageResult<()>;

    /// Removes an entity, returning the removed snapshot.
    async fn remove(&self, id: EntityId) -> StorageResult<T>;

    async fn get(&self, id: EntityId) -> StorageResult<Option<T>>;

    /// Returns every entity matching `filter`, in insertion order.
    async fn query(&self, filter: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> StorageResult<Vec<T>>;

    async fn count(&self) -> StorageResult<usize>;
}

/// What a repository does when the event published after a write fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishPolicy {
    /// Return [`StorageError::Publish`]. The write itself is kept.
    #[default]
    Propagate,
    /// Log the failure and report the write as successful.
    LogAndContinue,
}

struct Publisher {
    bus: Arc<EventBus>,
    policy: PublishPolicy,
    cancel: CancellationToken,
}

/// In-memory repository preserving insertion order.
pub struct InMemoryRepository<T: Entity> {
    items: RwLock<Vec<T>>,
    publisher: Option<Publisher>,
}

impl<T: Entity> InMemoryRepository<T> {
    /// Creates a repository that does not publish events.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            publisher: None,
        }
    }

    /// Creates a repository that publishes `{Type}.Added|Updated|Removed`
    /// to `bus` after each successful mutation.
    pub fn with_events(bus: Arc<EventBus>, policy: PublishPolicy) -> Self {
        Self::with_events_and_cancellation(bus, policy, CancellationToken::new())
    }

    /// As [`InMemoryRepository::with_events`], aborting publishes when
    /// `cancel` fires (host shutdown).
    pub fn with_events_and_cancellation(
        bus: Arc<EventBus>,
        policy: PublishPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            publisher: Some(Publisher { bus, policy, cancel }),
        }
    }

    async fn publish(&self, item: T, kind: EventKind) -> StorageResult<()> {
        let Some(publisher) = &self.publisher else {
            return Ok(());
        };
        let event = DomainEvent::new(item, kind);
        match publisher.bus.publish(&event, &publisher.cancel).await {
            Ok(()) => Ok(()),
            Err(e) => match publisher.policy {
                PublishPolicy::Propagate => Err(StorageError::Publish(e)),
                PublishPolicy::LogAndContinue => {
                    warn!(event_type = %event.event_type(), "Ignoring publish failure: {}", e);
                    Ok(())
                }
            },
        }
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn add(&self, item: T) -> StorageResult<()> {
        {
            let mut items = self.items.write().await;
            if items.iter().any(|existing| existing.id() == item.id()) {
                return Err(StorageError::Duplicate(format!("{} {}", T::TYPE_NAME, item.id())));
            }
            items.push(item.clone());
        }
        debug!(entity_type = T::TYPE_NAME, id = %item.id(), "Entity added");
        self.publish(item, EventKind::Added).await
    }

    async fn update(&self, item: T) -> StorageResult<()> {
        {
            let mut items = self.items.write().await;
            let slot = items
                .iter_mut()
                .find(|existing| existing.id() == item.id())
                .ok_or_else(|| StorageError::NotFound(format!("{} {}", T::TYPE_NAME, item.id())))?;
            *slot = item.clone();
        }
        debug!(entity_type = T::TYPE_NAME, id = %item.id(), "Entity updated");
        self.publish(item, EventKind::Updated).await
    }

    async fn remove(&self, id: EntityId) -> StorageResult<T> {
        let removed = {
            let mut items = self.items.write().await;
            let index = items
                .iter()
                .position(|existing| existing.id() == id)
                .ok_or_else(|| StorageError::NotFound(format!("{} {}", T::TYPE_NAME, id)))?;
            items.remove(index)
        };
        debug!(entity_type = T::TYPE_NAME, id = %id, "Entity removed");
        self.publish(removed.clone(), EventKind::Removed).await?;
        Ok(removed)
    }

    async fn get(&self, id: EntityId) -> StorageResult<Option<T>> {
        let items = self.items.read().await;
        Ok(items.iter().find(|existing| existing.id() == id).cloned())
    }

    async fn query(&self, filter: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> StorageResult<Vec<T>> {
        let items = self.items.read().await;
        Ok(items.iter().filter(|&item| filter(item)).cloned().collect())
    }

    async fn count(&self) -> StorageResult<usize> {
        Ok(self.items.read().await.len())
    }
}
