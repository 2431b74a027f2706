//! TTL lease records for single-executor batch operations.
//!
//! Only the maintenance sweeps use leases: acquisition is an upsert that
//! succeeds when the name is free or the previous holder's TTL has lapsed,
//! so a crashed worker never wedges the sweep. The lease is advisory — it
//! bounds overlapping batch runs, nothing else.

use sqlx::PgPool;

use crate::models::lease::Lease;

/// Provides the advisory lease table.
pub struct LeaseRepo;

impl LeaseRepo {
    /// Try to acquire `name` for `owner` with a TTL in seconds.
    ///
    /// Returns `true` when the lease was acquired (fresh, re-acquired by
    /// the same owner, or stolen from an expired holder).
    pub async fn acquire(
        pool: &PgPool,
        name: &str,
        owner: &str,
        ttl_secs: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO leases (name, owner, expires_at) \
             VALUES ($1, $2, NOW() + make_interval(secs => $3)) \
             ON CONFLICT (name) DO UPDATE SET \
                 owner = EXCLUDED.owner, \
                 expires_at = EXCLUDED.expires_at \
             WHERE leases.expires_at <= NOW() OR leases.owner = EXCLUDED.owner",
        )
        .bind(name)
        .bind(owner)
        .bind(ttl_secs)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Extend a lease the caller still holds. Returns `false` when the
    /// lease was lost (expired and stolen, or never held).
    pub async fn renew(
        pool: &PgPool,
        name: &str,
        owner: &str,
        ttl_secs: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE leases SET expires_at = NOW() + make_interval(secs => $3) \
             WHERE name = $1 AND owner = $2 AND expires_at > NOW()",
        )
        .bind(name)
        .bind(owner)
        .bind(ttl_secs)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release a lease the caller holds. Releasing someone else's lease is
    /// a no-op.
    pub async fn release(pool: &PgPool, name: &str, owner: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM leases WHERE name = $1 AND owner = $2")
            .bind(name)
            .bind(owner)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Inspect a lease (diagnostics only).
    pub async fn get(pool: &PgPool, name: &str) -> Result<Option<Lease>, sqlx::Error> {
        sqlx::query_as::<_, Lease>("SELECT name, owner, expires_at FROM leases WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }
}
