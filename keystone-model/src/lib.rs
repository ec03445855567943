//! Entity model for keystone modules.
//!
//! Defines the capability traits every module's persisted types implement:
//! - [`Entity`]: a type name plus identity, the key the event bus routes on
//! - [`Auditable`]: entities whose lifecycle is recorded by the audit trail
//! - [`EventKind`]: the three canonical lifecycle actions
//!
//! These traits form the contract between modules and the shared data-access
//! layer. Modules never see each other's concrete types.

mod entity;
mod kind;

pub use entity::{Auditable, Entity};
pub use kind::{event_type_for, EventKind};
