//! Repository for the `service_passes` and `pass_consumptions` tables.
//!
//! The consumption ledger is the exactly-once mechanism for pass debits:
//! one row per (pass_id, application_id), inserted with ON CONFLICT so a
//! replay lands on the existing row, and the remaining-sessions decrement
//! guarded by `remaining_sessions > 0` inside the same transaction so two
//! fresh consumptions can never double-spend the last session.

use courtside_core::types::DbId;
use sqlx::PgPool;

use crate::models::service_pass::{PassConsumption, ServicePass};
use crate::models::status::PassStatus;

/// Column list for `service_passes` queries.
const COLUMNS: &str = "\
    id, user_id, source_order_id, service_type, total_sessions, \
    remaining_sessions, status_id, expires_at, created_at, updated_at";

/// Column list for `pass_consumptions` queries.
const CONSUMPTION_COLUMNS: &str =
    "id, pass_id, application_id, used_at, reverted, reverted_at";

/// Result of an idempotent pass issuance.
#[derive(Debug, Clone)]
pub enum IssueOutcome {
    /// A new pass was created for this order.
    Issued(ServicePass),
    /// The order already issued its pass; this is the existing one.
    Replayed(ServicePass),
}

/// Result of an idempotent consumption attempt.
#[derive(Debug, Clone)]
pub enum ConsumeOutcome {
    /// A new consumption row was appended and `remaining` decremented.
    Consumed(PassConsumption),
    /// A consumption for this (pass, application) already existed; nothing
    /// was decremented. Treated as success by callers.
    Replayed(PassConsumption),
    /// The pass had no remaining sessions at decrement time.
    InsufficientBalance,
    /// No pass with that id exists.
    PassNotFound,
}

/// Result of an idempotent reversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    /// The consumption was flipped to reverted and `remaining` incremented.
    Reverted,
    /// The consumption was already reverted; no-op success.
    AlreadyReverted,
    /// No consumption exists for that (pass, application) pair.
    NotFound,
}

/// Provides the prepaid-pass entitlement ledger.
pub struct PassRepo;

impl PassRepo {
    /// Issue a pass for a paid package order, exactly once per order.
    ///
    /// Replays (retried webhooks, crash-and-retry of the paid effect) hit
    /// the partial unique index on `source_order_id` and return the
    /// already-issued pass.
    pub async fn issue_for_order(
        pool: &PgPool,
        user_id: DbId,
        source_order_id: DbId,
        service_type: &str,
        total_sessions: i32,
        validity_days: i32,
    ) -> Result<IssueOutcome, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_passes \
                 (user_id, source_order_id, service_type, total_sessions, \
                  remaining_sessions, status_id, expires_at) \
             VALUES ($1, $2, $3, $4, $4, $5, NOW() + make_interval(days => $6)) \
             ON CONFLICT (source_order_id) WHERE source_order_id IS NOT NULL \
             DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, ServicePass>(&query)
            .bind(user_id)
            .bind(source_order_id)
            .bind(service_type)
            .bind(total_sessions)
            .bind(PassStatus::Active.id())
            .bind(validity_days)
            .fetch_optional(pool)
            .await?;

        if let Some(pass) = inserted {
            return Ok(IssueOutcome::Issued(pass));
        }

        let query = format!("SELECT {COLUMNS} FROM service_passes WHERE source_order_id = $1");
        let existing = sqlx::query_as::<_, ServicePass>(&query)
            .bind(source_order_id)
            .fetch_one(pool)
            .await?;
        Ok(IssueOutcome::Replayed(existing))
    }

    /// Find a pass by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ServicePass>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_passes WHERE id = $1");
        sqlx::query_as::<_, ServicePass>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The pass a new consumption should draw from: active, unexpired,
    /// matching service type, with sessions left, soonest expiry first
    /// (FIFO).
    pub async fn find_active_for(
        pool: &PgPool,
        user_id: DbId,
        service_type: &str,
    ) -> Result<Option<ServicePass>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_passes \
             WHERE user_id = $1 AND service_type = $2 AND status_id = $3 \
               AND remaining_sessions > 0 AND expires_at > NOW() \
             ORDER BY expires_at \
             LIMIT 1"
        );
        sqlx::query_as::<_, ServicePass>(&query)
            .bind(user_id)
            .bind(service_type)
            .bind(PassStatus::Active.id())
            .fetch_optional(pool)
            .await
    }

    /// Consume one session from a pass for an application, exactly once.
    ///
    /// The decrement is re-checked under the same transaction as the ledger
    /// insert — selection-time `remaining > 0` is not trusted.
    pub async fn consume(
        pool: &PgPool,
        pass_id: DbId,
        application_id: DbId,
    ) -> Result<ConsumeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert = format!(
            "INSERT INTO pass_consumptions (pass_id, application_id) \
             VALUES ($1, $2) \
             ON CONFLICT (pass_id, application_id) DO NOTHING \
             RETURNING {CONSUMPTION_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, PassConsumption>(&insert)
            .bind(pass_id)
            .bind(application_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(consumption) = inserted else {
            tx.rollback().await?;
            let query = format!(
                "SELECT {CONSUMPTION_COLUMNS} FROM pass_consumptions \
                 WHERE pass_id = $1 AND application_id = $2"
            );
            let existing = sqlx::query_as::<_, PassConsumption>(&query)
                .bind(pass_id)
                .bind(application_id)
                .fetch_one(pool)
                .await?;
            return Ok(ConsumeOutcome::Replayed(existing));
        };

        let decremented = sqlx::query(
            "UPDATE service_passes \
             SET remaining_sessions = remaining_sessions - 1, updated_at = NOW() \
             WHERE id = $1 AND remaining_sessions > 0",
        )
        .bind(pass_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            tx.rollback().await?;
            return if Self::find_by_id(pool, pass_id).await?.is_some() {
                Ok(ConsumeOutcome::InsufficientBalance)
            } else {
                Ok(ConsumeOutcome::PassNotFound)
            };
        }

        tx.commit().await?;

        tracing::info!(pass_id, application_id, "Pass session consumed");
        Ok(ConsumeOutcome::Consumed(consumption))
    }

    /// Revert a consumption, exactly once.
    ///
    /// Reverting an already-reverted record is a no-op success so the
    /// cancellation flows can retry safely.
    pub async fn revert(
        pool: &PgPool,
        pass_id: DbId,
        application_id: DbId,
    ) -> Result<RevertOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let flipped = sqlx::query(
            "UPDATE pass_consumptions \
             SET reverted = true, reverted_at = NOW() \
             WHERE pass_id = $1 AND application_id = $2 AND reverted = false",
        )
        .bind(pass_id)
        .bind(application_id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            let exists: Option<(bool,)> = sqlx::query_as(
                "SELECT reverted FROM pass_consumptions \
                 WHERE pass_id = $1 AND application_id = $2",
            )
            .bind(pass_id)
            .bind(application_id)
            .fetch_optional(pool)
            .await?;
            return Ok(match exists {
                Some(_) => RevertOutcome::AlreadyReverted,
                None => RevertOutcome::NotFound,
            });
        }

        // The CHECK constraint on remaining_sessions makes a credit beyond
        // total_sessions a hard storage error, not a silent corruption.
        sqlx::query(
            "UPDATE service_passes \
             SET remaining_sessions = remaining_sessions + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(pass_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(pass_id, application_id, "Pass consumption reverted");
        Ok(RevertOutcome::Reverted)
    }

    /// All consumption rows for a pass, oldest first.
    pub async fn consumptions_for(
        pool: &PgPool,
        pass_id: DbId,
    ) -> Result<Vec<PassConsumption>, sqlx::Error> {
        let query = format!(
            "SELECT {CONSUMPTION_COLUMNS} FROM pass_consumptions \
             WHERE pass_id = $1 ORDER BY used_at, id"
        );
        sqlx::query_as::<_, PassConsumption>(&query)
            .bind(pass_id)
            .fetch_all(pool)
            .await
    }

    /// Expire every active pass whose expiry has lapsed. Returns the number
    /// of passes flipped. Used by the maintenance sweep.
    pub async fn mark_expired_batch(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE service_passes \
             SET status_id = $1, updated_at = NOW() \
             WHERE status_id = $2 AND expires_at <= NOW()",
        )
        .bind(PassStatus::Expired.id())
        .bind(PassStatus::Active.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
