use keystone_events::SubscribeError;
use keystone_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit records cannot be audited")]
    SelfAudit,

    #[error("failed to snapshot {entity_type}: {source}")]
    Snapshot {
        entity_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("subscription error: {0}")]
    Subscribe(#[from] SubscribeError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type AuditResult<T> = Result<T, AuditError>;
