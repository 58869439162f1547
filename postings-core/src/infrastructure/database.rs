use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::infrastructure::config::AppConfig;

pub async fn create_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;
    info!(
        max_connections = config.database_max_connections,
        "connected to postings database"
    );
    Ok(pool)
}

/// Applies the embedded schema migrations in `postings-core/migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!();
    info!(known = migrator.migrations.len(), "applying postings schema migrations");
    migrator.run(pool).await?;
    info!("postings schema is up to date");
    Ok(())
}
