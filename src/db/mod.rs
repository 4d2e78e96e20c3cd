use anyhow::Context;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::path::Path;
use std::time::Duration;

use crate::config::Config;

/// Schema migrations, relative to the working directory.
pub const MIGRATIONS_DIR: &str = "./migrations";

pub async fn create_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .with_context(|| {
            format!(
                "failed to connect to database at {}",
                config.redacted_database_url()
            )
        })?;

    tracing::info!("Successfully connected to PostgreSQL database");
    Ok(pool)
}

/// Creates or upgrades the schema. Safe to run on every startup.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    let migrator = Migrator::new(Path::new(MIGRATIONS_DIR))
        .await
        .with_context(|| format!("failed to load migrations from {}", MIGRATIONS_DIR))?;

    migrator
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    tracing::info!("Database migrations completed");
    Ok(())
}
