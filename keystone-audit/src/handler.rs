use crate::record::AuditRecord;
use async_trait::async_trait;
use keystone_events::{CancellationToken, DomainEvent, EventHandler};
use keystone_model::{event_type_for, Auditable, Entity};
use keystone_storage::Repository;
use keystone_types::ExecutionContextAccessor;
use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace};

/// Persists an [`AuditRecord`] for every lifecycle event of `T`.
pub struct AuditTrailHandler<T> {
    name: String,
    records: Arc<dyn Repository<AuditRecord>>,
    context: Arc<dyn ExecutionContextAccessor>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Auditable> AuditTrailHandler<T> {
    pub fn new(records: Arc<dyn Repository<AuditRecord>>, context: Arc<dyn ExecutionContextAccessor>) -> Self {
        Self {
            name: format!("audit-trail<{}>", T::TYPE_NAME),
            records,
            context,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Auditable> EventHandler<T> for AuditTrailHandler<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &DomainEvent<T>, _cancel: &CancellationToken) -> anyhow::Result<()> {
        // Snapshot before the first await so the record reflects the
        // request that published the event.
        let context = self.context.current();

        if TypeId::of::<T>() == TypeId::of::<AuditRecord>() {
            trace!("Skipping audit of an audit record");
            return Ok(());
        }

        // Only the canonical "{Type}.{Action}" tags of T count.
        let kind = event
            .kind()
            .filter(|kind| event.event_type() == event_type_for::<T>(*kind));
        let Some(kind) = kind else {
            debug!(event_type = %event.event_type(), "Ignoring non-lifecycle event");
            return Ok(());
        };

        let record = AuditRecord::capture(event.payload(), event.event_type(), kind, &context)?;
        debug!(
            entity_type = T::TYPE_NAME,
            entity_id = %record.entity_id,
            event_type = %record.event_type,
            "Recording audit entry"
        );
        self.records.add(record).await?;
        Ok(())
    }
}
