//! Core type definitions for the keystone host.
//!
//! This crate defines the fundamental, module-agnostic types used throughout
//! the host:
//! - Entity and trace identifiers (UUID v7)
//! - The per-request execution context captured into audit records
//!
//! Everything domain-specific (todos, settings, users) belongs in the module
//! that owns it, not here.

mod context;
mod ids;

pub use context::{
    ExecutionContext, ExecutionContextAccessor, FixedExecutionContext, SharedExecutionContext,
};
pub use ids::{EntityId, TraceId};
