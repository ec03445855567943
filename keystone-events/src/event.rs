//! Domain events emitted by the data-access layer.

use keystone_model::{event_type_for, Entity, EventKind};

/// An immutable notification that an entity of type `T` changed.
///
/// The tag follows `"{TypeName}.{Action}"`. Routing never looks at the tag;
/// it is metadata for handlers that filter on the action.
#[derive(Debug, Clone)]
pub struct DomainEvent<T> {
    payload: T,
    event_type: String,
}

impl<T: Entity> DomainEvent<T> {
    /// Creates an event with the canonical tag for `kind`.
    pub fn new(payload: T, kind: EventKind) -> Self {
        Self {
            payload,
            event_type: event_type_for::<T>(kind),
        }
    }

    /// Creates an event with an arbitrary tag. Handlers decide whether
    /// non-canonical tags mean anything to them.
    pub fn with_event_type(payload: T, event_type: impl Into<String>) -> Self {
        Self {
            payload,
            event_type: event_type.into(),
        }
    }

    pub fn added(payload: T) -> Self {
        Self::new(payload, EventKind::Added)
    }

    pub fn updated(payload: T) -> Self {
        Self::new(payload, EventKind::Updated)
    }

    pub fn removed(payload: T) -> Self {
        Self::new(payload, EventKind::Removed)
    }

    /// Snapshot of the entity at the time of the mutation.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The canonical action, if the tag carries one.
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.event_type)
    }
}
