use crate::DomainEvent;
use async_trait::async_trait;
use keystone_model::Entity;
use std::any::Any;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Reacts to lifecycle events of one entity type.
///
/// Handlers for the same event run in no particular order and must not
/// depend on each other's side effects.
#[async_trait]
pub trait EventHandler<T: Entity>: Send + Sync {
    /// Name used in logs and in [`crate::HandlerFailure`].
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, event: &DomainEvent<T>, cancel: &CancellationToken) -> anyhow::Result<()>;
}

/// Type-erased handler stored in the bus's dispatch table.
#[async_trait]
pub(crate) trait ErasedHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle_any(
        &self,
        event: &(dyn Any + Send + Sync),
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;
}

/// Wraps a typed handler; downcasts the event back to `DomainEvent<T>`.
pub(crate) struct TypedHandler<T: Entity> {
    inner: Arc<dyn EventHandler<T>>,
}

impl<T: Entity> TypedHandler<T> {
    pub(crate) fn new(inner: Arc<dyn EventHandler<T>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Entity> ErasedHandler for TypedHandler<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn handle_any(
        &self,
        event: &(dyn Any + Send + Sync),
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let event = event.downcast_ref::<DomainEvent<T>>().ok_or_else(|| {
            anyhow::anyhow!("event routed to handler for '{}' has a different type", T::TYPE_NAME)
        })?;
        self.inner.handle(event, cancel).await
    }
}
