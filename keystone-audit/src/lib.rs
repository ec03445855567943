//! Audit trail for keystone entities.
//!
//! The trail is an ordinary event-bus consumer. For every tracked
//! [`Auditable`](keystone_model::Auditable) type it subscribes an
//! [`AuditTrailHandler`], which turns each `Added`/`Updated`/`Removed`
//! event into an immutable [`AuditRecord`]: an entity snapshot plus the
//! execution context of the request that caused it.
//!
//! Modules opt in from `activate`:
//!
//! ```ignore
//! let registrar = context.require::<Arc<AuditTrailRegistrar>>()?;
//! registrar.track::<Todo>()?;
//! ```

mod error;
mod handler;
mod plugin;
mod record;
mod trail;

pub use error::{AuditError, AuditResult};
pub use handler::AuditTrailHandler;
pub use plugin::{AuditPlugin, AuditSchemaSeeder, AUDIT_TABLE};
pub use record::AuditRecord;
pub use trail::{AuditTrail, AuditTrailRegistrar};
