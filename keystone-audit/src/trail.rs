use crate::error::{AuditError, AuditResult};
use crate::handler::AuditTrailHandler;
use crate::record::AuditRecord;
use keystone_events::{EventBus, SubscriptionId};
use keystone_model::{Auditable, Entity};
use keystone_storage::Repository;
use keystone_types::{EntityId, ExecutionContextAccessor};
use std::any::TypeId;
use std::sync::Arc;
use tracing::info;

/// Read side of the audit trail.
pub struct AuditTrail {
    records: Arc<dyn Repository<AuditRecord>>,
}

impl AuditTrail {
    pub fn new(records: Arc<dyn Repository<AuditRecord>>) -> Self {
        Self { records }
    }

    /// Every record of one entity, oldest first.
    pub async fn history(&self, entity_id: EntityId) -> AuditResult<Vec<AuditRecord>> {
        let mut records = self.records.query(&|r: &AuditRecord| r.entity_id == entity_id).await?;
        records.sort_by_key(|r| r.recorded_at);
        Ok(records)
    }

    /// Every record of one entity type, oldest first.
    pub async fn for_type(&self, entity_type: &str) -> AuditResult<Vec<AuditRecord>> {
        let mut records = self
            .records
            .query(&|r: &AuditRecord| r.entity_type == entity_type)
            .await?;
        records.sort_by_key(|r| r.recorded_at);
        Ok(records)
    }

    pub async fn len(&self) -> AuditResult<usize> {
        Ok(self.records.count().await?)
    }
}

/// Subscribes audit handlers for the entity types modules opt in.
pub struct AuditTrailRegistrar {
    bus: Arc<EventBus>,
    records: Arc<dyn Repository<AuditRecord>>,
    context: Arc<dyn ExecutionContextAccessor>,
}

impl AuditTrailRegistrar {
    pub fn new(
        bus: Arc<EventBus>,
        records: Arc<dyn Repository<AuditRecord>>,
        context: Arc<dyn ExecutionContextAccessor>,
    ) -> Self {
        Self { bus, records, context }
    }

    /// Starts auditing `T`. Must be called before the bus is sealed.
    pub fn track<T: Auditable>(&self) -> AuditResult<SubscriptionId> {
        if TypeId::of::<T>() == TypeId::of::<AuditRecord>() {
            return Err(AuditError::SelfAudit);
        }
        let handler = AuditTrailHandler::<T>::new(self.records.clone(), self.context.clone());
        let id = self.bus.subscribe::<T, _>(handler)?;
        info!(entity_type = T::TYPE_NAME, "Audit trail tracking entity");
        Ok(id)
    }
}
