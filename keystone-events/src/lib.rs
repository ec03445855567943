//! Domain event bus for keystone.
//!
//! The shared data-access layer publishes a [`DomainEvent`] for every entity
//! mutation; modules subscribe an [`EventHandler`] per entity type they care
//! about (audit trail, history, search indexing, ...).
//!
//! # Delivery
//!
//! - Handlers are keyed by the entity's Rust type, not by the event tag.
//! - Every handler registered for the type runs, even when a sibling fails.
//!   Failures are collected into one [`PublishError`].
//! - A cancelled publish stops dispatching and reports the failures seen so far.
//! - The subscription table is written during plugin activation and sealed
//!   afterwards; publishing only ever reads it.

mod bus;
mod error;
mod event;
mod handler;

pub use bus::{DispatchMode, EventBus, EventBusConfig, SubscriptionId};
pub use error::{HandlerFailure, PublishError, SubscribeError};
pub use event::DomainEvent;
pub use handler::EventHandler;

pub use tokio_util::sync::CancellationToken;
