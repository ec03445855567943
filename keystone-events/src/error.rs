//! Error types for the event bus.

use thiserror::Error;

/// One handler's failure during a publish.
#[derive(Debug, Error)]
#[error("handler '{handler}' failed: {source}")]
pub struct HandlerFailure {
    pub handler: String,
    #[source]
    pub source: anyhow::Error,
}

/// Aggregated outcome of a failed publish.
///
/// Both variants carry every handler failure observed, in the order the
/// failures were collected.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{count} of {dispatched} handler(s) failed for {event_type}", count = .failures.len())]
    HandlersFailed {
        event_type: String,
        dispatched: usize,
        failures: Vec<HandlerFailure>,
    },

    #[error("publish of {event_type} cancelled after {completed} handler(s)")]
    Cancelled {
        event_type: String,
        completed: usize,
        failures: Vec<HandlerFailure>,
    },
}

impl PublishError {
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            PublishError::HandlersFailed { failures, .. } | PublishError::Cancelled { failures, .. } => {
                failures
            }
        }
    }

    pub fn into_failures(self) -> Vec<HandlerFailure> {
        match self {
            PublishError::HandlersFailed { failures, .. } | PublishError::Cancelled { failures, .. } => {
                failures
            }
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            PublishError::HandlersFailed { event_type, .. }
            | PublishError::Cancelled { event_type, .. } => event_type,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PublishError::Cancelled { .. })
    }
}

/// Errors returned when registering a handler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscribeError {
    #[error("event bus is sealed; subscribe during plugin activation (entity type '{entity_type}')")]
    Sealed { entity_type: &'static str },
}
