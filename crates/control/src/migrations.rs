use sqlx::{Pool, Sqlite};
use tracing::info;

/// Embedded migration scripts
const MIGRATION_001_UPLOAD_LOG: &str = include_str!("../migrations/001_upload_log.sql");

/// Run all embedded migrations. Every script is idempotent.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    info!("Running migration 001: Upload log");
    sqlx::query(MIGRATION_001_UPLOAD_LOG).execute(pool).await?;

    info!("All migrations completed successfully");
    Ok(())
}
