//! PostgreSQL persistence for the courtside engine.
//!
//! All concurrency control in the system lives behind this crate's
//! repositories: guarded conditional updates reported via `rows_affected`,
//! `INSERT … ON CONFLICT` idempotency, partial unique indexes, and the
//! TTL lease upsert. No repository ever does read-then-write on a status
//! column.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub type DbPool = PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database connection is alive.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// True when `err` is a PostgreSQL unique violation (23505) on a constraint
/// or index whose name starts with `prefix`. All uniqueness constraints in
/// the schema are named `uq_*` so expected duplicate races can be told
/// apart from genuine storage failures.
pub fn is_unique_violation(err: &sqlx::Error, prefix: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err
                    .constraint()
                    .map(|c| c.starts_with(prefix))
                    .unwrap_or(false)
        }
        _ => false,
    }
}
