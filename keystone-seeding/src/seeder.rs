use async_trait::async_trait;

/// Module-owned unit that creates its schema and initial data.
///
/// Seeders hold whatever store handles or repositories they need; they are
/// built during `configure_services` from the registry. The `should_*`
/// checks must be side-effect-free and return `false` once their work
/// exists.
#[async_trait]
pub trait Seeder: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Lower runs first. Modules that others build on use small values.
    fn order(&self) -> i32;

    async fn should_create_schema(&self) -> anyhow::Result<bool>;

    async fn create_schema(&self) -> anyhow::Result<()>;

    async fn should_seed(&self) -> anyhow::Result<bool>;

    async fn seed_data(&self) -> anyhow::Result<()>;
}
