/// Database migration runner
///
/// Migrations live in the `migrations/` directory of this crate and are
/// embedded into the binary via `sqlx::migrate!`, so the server can bring a
/// fresh database up to date at startup.
use sqlx::postgres::PgPool;
use tracing::info;

/// Runs all pending database migrations
///
/// Already-applied migrations are skipped; a failing migration aborts with an
/// error and leaves the schema at the last successful version.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    sqlx::migrate!("./migrations").run(pool).await?;

    info!("Database schema is up to date");
    Ok(())
}
