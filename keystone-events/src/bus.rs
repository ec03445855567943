use crate::error::{HandlerFailure, PublishError, SubscribeError};
use crate::handler::{ErasedHandler, EventHandler, TypedHandler};
use crate::DomainEvent;
use futures::stream::{FuturesUnordered, StreamExt};
use keystone_model::Entity;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How the handlers of a single publish are driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// One handler at a time, in subscription order.
    #[default]
    Sequential,
    /// All handlers polled together on the publishing task.
    Concurrent,
}

/// Event bus configuration (the `[events]` section of the host config).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBusConfig {
    #[serde(default)]
    pub dispatch: DispatchMode,
}

/// Identifies one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscription {
    id: SubscriptionId,
    handler: Arc<dyn ErasedHandler>,
}

/// Process-wide publish/subscribe fabric keyed by entity type.
///
/// Subscriptions are accepted until [`EventBus::seal`] is called, which the
/// host does once every plugin has activated. Publishing takes a snapshot of
/// the handler list and never holds the table lock across an await.
pub struct EventBus {
    config: EventBusConfig,
    table: RwLock<HashMap<TypeId, Vec<Subscription>>>,
    sealed: AtomicBool,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            config,
            table: RwLock::new(HashMap::new()),
            sealed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Registers a handler for events of entity type `T`.
    pub fn subscribe<T, H>(&self, handler: H) -> Result<SubscriptionId, SubscribeError>
    where
        T: Entity,
        H: EventHandler<T> + 'static,
    {
        self.subscribe_arc::<T>(Arc::new(handler))
    }

    /// Registers a shared handler for events of entity type `T`.
    pub fn subscribe_arc<T: Entity>(
        &self,
        handler: Arc<dyn EventHandler<T>>,
    ) -> Result<SubscriptionId, SubscribeError> {
        if self.is_sealed() {
            return Err(SubscribeError::Sealed {
                entity_type: T::TYPE_NAME,
            });
        }

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handler: Arc<dyn ErasedHandler> = Arc::new(TypedHandler::new(handler));
        debug!(
            entity_type = T::TYPE_NAME,
            handler = handler.name(),
            subscription = %id,
            "Handler subscribed"
        );

        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        table
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Subscription { id, handler });
        Ok(id)
    }

    /// Freezes the subscription table. Idempotent.
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::AcqRel) {
            debug!("Event bus sealed");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Number of handlers registered for entity type `T`.
    pub fn subscriber_count<T: Entity>(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<T>())
            .map_or(0, Vec::len)
    }

    /// Dispatches `event` to every handler registered for `T`.
    ///
    /// Succeeds iff every handler succeeded. A failing handler never stops
    /// its siblings; cancellation does, and the resulting error still lists
    /// the failures observed before it fired.
    pub async fn publish<T: Entity>(
        &self,
        event: &DomainEvent<T>,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        let handlers = self.handlers_for::<T>();
        let event_type = event.event_type();

        if cancel.is_cancelled() {
            return Err(PublishError::Cancelled {
                event_type: event_type.to_string(),
                completed: 0,
                failures: Vec::new(),
            });
        }

        if handlers.is_empty() {
            debug!(event_type = %event_type, "No handlers subscribed");
            return Ok(());
        }

        debug!(
            event_type = %event_type,
            handlers = handlers.len(),
            mode = ?self.config.dispatch,
            "Publishing event"
        );

        match self.config.dispatch {
            DispatchMode::Sequential => dispatch_sequential(&handlers, event, cancel).await,
            DispatchMode::Concurrent => dispatch_concurrent(&handlers, event, cancel).await,
        }
    }

    fn handlers_for<T: Entity>(&self) -> Vec<Arc<dyn ErasedHandler>> {
        self.table
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<T>())
            .map(|subs| subs.iter().map(|s| Arc::clone(&s.handler)).collect())
            .unwrap_or_default()
    }

    /// Subscription ids registered for `T`, in registration order.
    pub fn subscriptions<T: Entity>(&self) -> Vec<SubscriptionId> {
        self.table
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<T>())
            .map(|subs| subs.iter().map(|s| s.id).collect())
            .unwrap_or_default()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.table.read().map(|t| t.len()).unwrap_or(0);
        f.debug_struct("EventBus")
            .field("config", &self.config)
            .field("entity_types", &types)
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

fn record_failure(failures: &mut Vec<HandlerFailure>, event_type: &str, handler: &str, error: anyhow::Error) {
    warn!(event_type = %event_type, handler = %handler, "Event handler failed: {:#}", error);
    failures.push(HandlerFailure {
        handler: handler.to_string(),
        source: error,
    });
}

fn finish(event_type: &str, dispatched: usize, failures: Vec<HandlerFailure>) -> Result<(), PublishError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(PublishError::HandlersFailed {
            event_type: event_type.to_string(),
            dispatched,
            failures,
        })
    }
}

async fn dispatch_sequential<T: Entity>(
    handlers: &[Arc<dyn ErasedHandler>],
    event: &DomainEvent<T>,
    cancel: &CancellationToken,
) -> Result<(), PublishError> {
    let event_type = event.event_type();
    let mut failures = Vec::new();

    for (completed, handler) in handlers.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(PublishError::Cancelled {
                event_type: event_type.to_string(),
                completed,
                failures,
            });
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = handler.handle_any(event, cancel) => Some(result),
        };

        match outcome {
            Some(Ok(())) => {}
            Some(Err(e)) => record_failure(&mut failures, event_type, handler.name(), e),
            None => {
                debug!(event_type = %event_type, handler = handler.name(), "Publish cancelled mid-handler");
                return Err(PublishError::Cancelled {
                    event_type: event_type.to_string(),
                    completed,
                    failures,
                });
            }
        }
    }

    finish(event_type, handlers.len(), failures)
}

async fn dispatch_concurrent<T: Entity>(
    handlers: &[Arc<dyn ErasedHandler>],
    event: &DomainEvent<T>,
    cancel: &CancellationToken,
) -> Result<(), PublishError> {
    let event_type = event.event_type();
    let mut failures = Vec::new();
    let mut completed = 0;

    let mut pending: FuturesUnordered<_> = handlers
        .iter()
        .map(|handler| async move { (handler.name(), handler.handle_any(event, cancel).await) })
        .collect();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PublishError::Cancelled {
                    event_type: event_type.to_string(),
                    completed,
                    failures,
                });
            }
            next = pending.next() => match next {
                Some((_, Ok(()))) => completed += 1,
                Some((name, Err(e))) => {
                    completed += 1;
                    record_failure(&mut failures, event_type, name, e);
                }
                None => break,
            },
        }
    }

    finish(event_type, handlers.len(), failures)
}
