use keystone_types::EntityId;
use serde::Serialize;

/// A persisted type owned by some module.
///
/// `TYPE_NAME` is the stable, human-readable name used in event tags
/// (`"{TYPE_NAME}.{Action}"`) and audit records. It must be unique across
/// all loaded modules.
pub trait Entity: Clone + Send + Sync + 'static {
    const TYPE_NAME: &'static str;

    fn id(&self) -> EntityId;
}

/// An entity with identity and versioning, eligible for the audit trail.
///
/// Most entities do NOT need this. Only implement it if every lifecycle
/// change of the type must leave an immutable record behind.
pub trait Auditable: Entity + Serialize {
    /// Monotonic version, bumped by the owning module on every update.
    fn version(&self) -> u64;

    /// Serialized snapshot stored in the audit record.
    /// Default implementation is the serde JSON representation.
    fn snapshot(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
