//! The idempotency-key guard.
//!
//! A mutating entry point that accepts a caller-supplied idempotency token
//! claims (scope, key) here before doing anything else. The first claim
//! wins the insert and proceeds; every later claim sees the stored response
//! of the original attempt. Order creation, pass consumption, and points
//! accrual all reuse this one primitive instead of hand-rolled
//! check-then-insert sequences.

use serde_json::Value;
use sqlx::PgPool;

/// Result of claiming an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyClaim {
    /// First claim: the caller owns the operation and must store a
    /// response when done.
    Fresh,
    /// The key was already claimed. `None` means the original attempt has
    /// not stored its response yet (still in flight or crashed before
    /// completion).
    Replay(Option<Value>),
}

/// Provides the shared idempotency-key table.
pub struct IdempotencyRepo;

impl IdempotencyRepo {
    /// Claim (scope, key), returning who got there first.
    pub async fn claim(
        pool: &PgPool,
        scope: &str,
        key: &str,
    ) -> Result<IdempotencyClaim, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO idempotency_keys (scope, idem_key) VALUES ($1, $2) \
             ON CONFLICT (scope, idem_key) DO NOTHING",
        )
        .bind(scope)
        .bind(key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(IdempotencyClaim::Fresh);
        }

        let row: Option<(Option<Value>,)> = sqlx::query_as(
            "SELECT response FROM idempotency_keys WHERE scope = $1 AND idem_key = $2",
        )
        .bind(scope)
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(IdempotencyClaim::Replay(row.and_then(|(r,)| r)))
    }

    /// Record the operation's outcome for future replays.
    pub async fn store_response(
        pool: &PgPool,
        scope: &str,
        key: &str,
        response: &Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE idempotency_keys SET response = $3 \
             WHERE scope = $1 AND idem_key = $2",
        )
        .bind(scope)
        .bind(key)
        .bind(response)
        .execute(pool)
        .await?;
        Ok(())
    }
}
