use crate::orchestrator::SeedingReport;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which seeder operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStage {
    ShouldCreateSchema,
    CreateSchema,
    ShouldSeed,
    SeedData,
}

impl fmt::Display for SeedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SeedStage::ShouldCreateSchema => "should_create_schema",
            SeedStage::CreateSchema => "create_schema",
            SeedStage::ShouldSeed => "should_seed",
            SeedStage::SeedData => "seed_data",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SeedingError {
    #[error("seeder '{seeder}' failed in {stage}: {source:#}")]
    SeederFailed {
        seeder: String,
        stage: SeedStage,
        #[source]
        source: anyhow::Error,
    },

    /// Work finished before cancellation is kept, not rolled back.
    #[error("seeding cancelled after {} schema(s) and {} seed(s)", completed.schemas_created.len(), completed.seeded.len())]
    Cancelled { completed: SeedingReport },
}

impl SeedingError {
    pub fn seeder(&self) -> Option<&str> {
        match self {
            SeedingError::SeederFailed { seeder, .. } => Some(seeder),
            SeedingError::Cancelled { .. } => None,
        }
    }
}

pub type SeedingResult<T> = Result<T, SeedingError>;
