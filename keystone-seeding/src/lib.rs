//! Schema and seed-data orchestration.
//!
//! Each module contributes a [`Seeder`] during `configure_services`. At
//! startup the [`SeedingOrchestrator`] runs them in ascending `order`
//! (ties keep registration order), first creating schema and then seeding
//! data. Every step is guarded by the seeder's own existence check, so a
//! second run against an initialised store does nothing.
//!
//! Global [`SeedingCondition`]s gate the whole run. Conditions fail closed:
//! an evaluation error counts as "not met" and is only logged.

mod condition;
mod error;
mod orchestrator;
mod seeder;

pub use condition::{AlwaysSeed, CompositeCondition, CompositeMode, DatabaseExists, SeedingCondition, SettingEquals};
pub use error::{SeedStage, SeedingError, SeedingResult};
pub use orchestrator::{SeedingOrchestrator, SeedingReport};
pub use seeder::Seeder;
