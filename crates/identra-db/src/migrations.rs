//! Embedded schema migrations.
//!
//! Permissions are reference data: their rows are seeded and maintained
//! here, never through the orchestration services.

use sqlx::PgPool;

use crate::error::DbError;

/// Apply all pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
