use crate::error::{AuditError, AuditResult};
use chrono::{DateTime, Utc};
use keystone_model::{Auditable, Entity, EventKind};
use keystone_types::{EntityId, ExecutionContext, TraceId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable record of one lifecycle change.
///
/// The execution context is flattened into scalar columns so stored records
/// do not change shape when the context type grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: EntityId,
    pub entity_id: EntityId,
    pub entity_type: String,
    pub event_type: String,
    pub kind: EventKind,
    pub entity_version: u64,
    pub recorded_at: DateTime<Utc>,
    /// Serialized entity as it was after the change.
    pub snapshot: String,

    pub trace_id: TraceId,
    pub session_id: Option<String>,
    pub request_id: Uuid,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub user_ip: Option<String>,
    pub is_authenticated: bool,
    pub request_started_at: DateTime<Utc>,
    pub language: Option<String>,
}

impl AuditRecord {
    /// Builds a record for `entity` from an already captured context.
    pub fn capture<T: Auditable>(
        entity: &T,
        event_type: &str,
        kind: EventKind,
        context: &ExecutionContext,
    ) -> AuditResult<Self> {
        let snapshot = entity.snapshot().map_err(|source| AuditError::Snapshot {
            entity_type: T::TYPE_NAME,
            source,
        })?;
        Ok(Self {
            id: EntityId::new(),
            entity_id: entity.id(),
            entity_type: T::TYPE_NAME.to_string(),
            event_type: event_type.to_string(),
            kind,
            entity_version: entity.version(),
            recorded_at: Utc::now(),
            snapshot,
            trace_id: context.trace_id,
            session_id: context.session_id.clone(),
            request_id: context.unique_id,
            user_id: context.user_id.clone(),
            username: context.username.clone(),
            user_ip: context.user_ip.clone(),
            is_authenticated: context.is_authenticated,
            request_started_at: context.started_at,
            language: context.language.clone(),
        })
    }

    /// Rebuilds the captured execution context.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext {
            trace_id: self.trace_id,
            session_id: self.session_id.clone(),
            unique_id: self.request_id,
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            user_ip: self.user_ip.clone(),
            is_authenticated: self.is_authenticated,
            started_at: self.request_started_at,
            language: self.language.clone(),
        }
    }
}

impl Entity for AuditRecord {
    const TYPE_NAME: &'static str = "AuditRecord";

    fn id(&self) -> EntityId {
        self.id
    }
}

// Records are stored through an ordinary repository, which makes them
// auditable in principle. The handler and registrar refuse that.
impl Auditable for AuditRecord {
    fn version(&self) -> u64 {
        1
    }
}
