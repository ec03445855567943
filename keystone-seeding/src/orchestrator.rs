//! Drives every registered seeder through schema creation and seeding.

use crate::condition::{is_met, SeedingCondition};
use crate::error::{SeedStage, SeedingError, SeedingResult};
use crate::seeder::Seeder;
use keystone_plugin_host::ServiceRegistry;
use keystone_storage::StoreHandle;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What one orchestrator run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedingReport {
    /// Seeders whose schema was created, in execution order.
    pub schemas_created: Vec<String>,
    /// Seeders whose data was seeded, in execution order.
    pub seeded: Vec<String>,
    /// Seeders that had nothing to do in either phase.
    pub up_to_date: Vec<String>,
    /// True when a global condition blocked the whole run.
    pub gated: bool,
}

impl SeedingReport {
    pub fn is_noop(&self) -> bool {
        self.schemas_created.is_empty() && self.seeded.is_empty()
    }
}

/// Runs seeders strictly one at a time in ascending `order`.
pub struct SeedingOrchestrator {
    seeders: Vec<Arc<dyn Seeder>>,
    conditions: Vec<Arc<dyn SeedingCondition>>,
    store: Arc<dyn StoreHandle>,
}

impl SeedingOrchestrator {
    /// `seeders` is taken in registration order; equal orders keep it.
    pub fn new(mut seeders: Vec<Arc<dyn Seeder>>, store: Arc<dyn StoreHandle>) -> Self {
        // sort_by_key is stable
        seeders.sort_by_key(|s| s.order());
        Self {
            seeders,
            conditions: Vec::new(),
            store,
        }
    }

    /// Collects every `Arc<dyn Seeder>` and `Arc<dyn SeedingCondition>`
    /// contributed during `configure_services`.
    pub fn from_services(services: &ServiceRegistry, store: Arc<dyn StoreHandle>) -> Self {
        let mut orchestrator = Self::new(services.all::<Arc<dyn Seeder>>(), store);
        orchestrator.conditions = services.all::<Arc<dyn SeedingCondition>>();
        orchestrator
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Arc<dyn SeedingCondition>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Seeder names in execution order.
    pub fn seeders(&self) -> Vec<String> {
        self.seeders.iter().map(|s| s.name().to_string()).collect()
    }

    /// True only if every global condition holds. No conditions means true.
    pub async fn can_seed(&self) -> bool {
        for condition in &self.conditions {
            if !is_met(condition.as_ref(), self.store.as_ref()).await {
                info!(condition = %condition.name(), "Seeding gated by condition");
                return false;
            }
        }
        true
    }

    /// Creates missing schema. Returns the seeders that created theirs.
    pub async fn ensure_schema(&self, cancel: &CancellationToken) -> SeedingResult<Vec<String>> {
        let mut report = SeedingReport::default();
        match self.run_phase(Phase::Schema, cancel, &mut report.schemas_created).await {
            Ok(()) => Ok(report.schemas_created),
            Err(e) => Err(e.into_error(report)),
        }
    }

    /// Seeds missing data. Returns the seeders that seeded.
    pub async fn seed_data(&self, cancel: &CancellationToken) -> SeedingResult<Vec<String>> {
        let mut report = SeedingReport::default();
        match self.run_phase(Phase::Seed, cancel, &mut report.seeded).await {
            Ok(()) => Ok(report.seeded),
            Err(e) => Err(e.into_error(report)),
        }
    }

    /// Full startup run: gate, schema, then data.
    pub async fn run(&self, cancel: &CancellationToken) -> SeedingResult<SeedingReport> {
        let mut report = SeedingReport::default();

        if !self.can_seed().await {
            report.gated = true;
            return Ok(report);
        }

        if let Err(e) = self.run_phase(Phase::Schema, cancel, &mut report.schemas_created).await {
            return Err(e.into_error(report));
        }
        if let Err(e) = self.run_phase(Phase::Seed, cancel, &mut report.seeded).await {
            return Err(e.into_error(report));
        }

        let up_to_date = self
            .seeders
            .iter()
            .map(|s| s.name().to_string())
            .filter(|name| !report.schemas_created.contains(name) && !report.seeded.contains(name))
            .collect();
        report.up_to_date = up_to_date;

        info!(
            schemas = report.schemas_created.len(),
            seeded = report.seeded.len(),
            up_to_date = report.up_to_date.len(),
            "Seeding complete"
        );
        Ok(report)
    }

    async fn run_phase(
        &self,
        phase: Phase,
        cancel: &CancellationToken,
        acted: &mut Vec<String>,
    ) -> Result<(), PhaseError> {
        for seeder in &self.seeders {
            if cancel.is_cancelled() {
                info!(phase = phase.as_str(), completed = acted.len(), "Seeding cancelled");
                return Err(PhaseError::Cancelled);
            }

            let name = seeder.name();
            let (check_stage, work_stage) = phase.stages();

            let needed = match phase {
                Phase::Schema => seeder.should_create_schema().await,
                Phase::Seed => seeder.should_seed().await,
            }
            .map_err(|source| fail(name, check_stage, source))?;

            if !needed {
                debug!(seeder = %name, order = seeder.order(), phase = phase.as_str(), "Nothing to do");
                continue;
            }

            info!(seeder = %name, order = seeder.order(), phase = phase.as_str(), "Running seeder");
            let outcome = match phase {
                Phase::Schema => seeder.create_schema().await,
                Phase::Seed => seeder.seed_data().await,
            };
            outcome.map_err(|source| fail(name, work_stage, source))?;

            acted.push(name.to_string());
        }
        Ok(())
    }
}

fn fail(seeder: &str, stage: SeedStage, source: anyhow::Error) -> PhaseError {
    error!(seeder = %seeder, stage = %stage, "Seeder failed: {:#}", source);
    PhaseError::Failed(SeedingError::SeederFailed {
        seeder: seeder.to_string(),
        stage,
        source,
    })
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Schema,
    Seed,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Schema => "schema",
            Phase::Seed => "seed",
        }
    }

    fn stages(self) -> (SeedStage, SeedStage) {
        match self {
            Phase::Schema => (SeedStage::ShouldCreateSchema, SeedStage::CreateSchema),
            Phase::Seed => (SeedStage::ShouldSeed, SeedStage::SeedData),
        }
    }
}

enum PhaseError {
    Failed(SeedingError),
    Cancelled,
}

impl PhaseError {
    fn into_error(self, completed: SeedingReport) -> SeedingError {
        match self {
            PhaseError::Failed(e) => e,
            PhaseError::Cancelled => SeedingError::Cancelled { completed },
        }
    }
}
