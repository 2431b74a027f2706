//! Repository for the `points_transactions` ledger.
//!
//! Balances are always derived from the log, never stored. Deduplication
//! of retried postings rides the partial unique index on
//! (user_id, tx_type_id, ref_key); the hold/spend guard is a single
//! `INSERT … SELECT` whose WHERE clause re-computes the available balance,
//! so two concurrent debits are serialized by the statement itself rather
//! than by a read-then-write.

use courtside_core::points::BalanceBreakdown;
use courtside_core::types::DbId;
use sqlx::PgPool;

use crate::models::points::PointsTransaction;
use crate::models::status::{PointsTxStatus, PointsTxType, StatusId};

/// Column list for `points_transactions` queries.
const COLUMNS: &str = "\
    id, user_id, amount, tx_type_id, status_id, reason, ref_key, admin_id, \
    created_at";

/// Result of a (possibly deduplicated) posting.
#[derive(Debug, Clone)]
pub enum PostOutcome {
    /// A new ledger row was written.
    Posted(PointsTransaction),
    /// A row with the same (user, type, ref_key) already existed; this is
    /// the prior result. Treated as success by callers.
    Duplicate(PointsTransaction),
}

/// Result of a balance-guarded debit (hold or immediate spend).
#[derive(Debug, Clone)]
pub enum GuardedPostOutcome {
    /// The guard passed and the row was written.
    Posted(PointsTransaction),
    /// The debit would drive the available balance below zero.
    InsufficientPoints,
}

/// Result of flipping a held row to confirmed or canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldFlipOutcome {
    /// The flip applied.
    Applied,
    /// The row was already in the requested status; no-op success.
    AlreadyInTarget,
    /// The row is in the other terminal status (e.g. releasing a hold that
    /// was already confirmed into a spend).
    Conflict { actual: StatusId },
    /// No held row with that id belongs to that user.
    NotFound,
}

/// Provides the append-only reward points ledger.
pub struct PointsRepo;

impl PointsRepo {
    /// Post a confirmed transaction, deduplicated by `ref_key` when given.
    pub async fn post(
        pool: &PgPool,
        user_id: DbId,
        amount: i64,
        tx_type: PointsTxType,
        reason: Option<&str>,
        ref_key: Option<&str>,
    ) -> Result<PostOutcome, sqlx::Error> {
        if let Some(key) = ref_key {
            let insert = format!(
                "INSERT INTO points_transactions \
                     (user_id, amount, tx_type_id, status_id, reason, ref_key) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (user_id, tx_type_id, ref_key) \
                     WHERE ref_key IS NOT NULL \
                 DO NOTHING \
                 RETURNING {COLUMNS}"
            );
            let inserted = sqlx::query_as::<_, PointsTransaction>(&insert)
                .bind(user_id)
                .bind(amount)
                .bind(tx_type.id())
                .bind(PointsTxStatus::Confirmed.id())
                .bind(reason)
                .bind(key)
                .fetch_optional(pool)
                .await?;

            if let Some(tx) = inserted {
                return Ok(PostOutcome::Posted(tx));
            }

            let query = format!(
                "SELECT {COLUMNS} FROM points_transactions \
                 WHERE user_id = $1 AND tx_type_id = $2 AND ref_key = $3"
            );
            let existing = sqlx::query_as::<_, PointsTransaction>(&query)
                .bind(user_id)
                .bind(tx_type.id())
                .bind(key)
                .fetch_one(pool)
                .await?;
            return Ok(PostOutcome::Duplicate(existing));
        }

        let insert = format!(
            "INSERT INTO points_transactions \
                 (user_id, amount, tx_type_id, status_id, reason) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let tx = sqlx::query_as::<_, PointsTransaction>(&insert)
            .bind(user_id)
            .bind(amount)
            .bind(tx_type.id())
            .bind(PointsTxStatus::Confirmed.id())
            .bind(reason)
            .fetch_one(pool)
            .await?;
        Ok(PostOutcome::Posted(tx))
    }

    /// Admin correction: always confirmed, always linked to the acting
    /// admin. May be positive or negative with no balance guard.
    pub async fn adjust(
        pool: &PgPool,
        user_id: DbId,
        amount: i64,
        admin_id: DbId,
        reason: &str,
    ) -> Result<PointsTransaction, sqlx::Error> {
        let insert = format!(
            "INSERT INTO points_transactions \
                 (user_id, amount, tx_type_id, status_id, reason, admin_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PointsTransaction>(&insert)
            .bind(user_id)
            .bind(amount)
            .bind(PointsTxType::AdminAdjust.id())
            .bind(PointsTxStatus::Confirmed.id())
            .bind(reason)
            .bind(admin_id)
            .fetch_one(pool)
            .await
    }

    /// Reserve `amount` points (stored as a negative `held` row), guarded
    /// by the available balance in the same statement.
    pub async fn hold(
        pool: &PgPool,
        user_id: DbId,
        amount: i64,
        reason: Option<&str>,
    ) -> Result<GuardedPostOutcome, sqlx::Error> {
        Self::guarded_debit(pool, user_id, amount, PointsTxType::Hold, PointsTxStatus::Held, reason)
            .await
    }

    /// Immediately spend `amount` points (a negative confirmed row), with
    /// the same available-balance guard as a hold.
    pub async fn spend(
        pool: &PgPool,
        user_id: DbId,
        amount: i64,
        reason: Option<&str>,
    ) -> Result<GuardedPostOutcome, sqlx::Error> {
        Self::guarded_debit(
            pool,
            user_id,
            amount,
            PointsTxType::Spend,
            PointsTxStatus::Confirmed,
            reason,
        )
        .await
    }

    /// Shared guarded-debit insert. `amount` is the positive number of
    /// points to debit; the stored row is negative.
    ///
    /// The guard condition is `balance + Σ(held) ≥ amount`: held rows are
    /// negative, so the left side is exactly the available balance.
    async fn guarded_debit(
        pool: &PgPool,
        user_id: DbId,
        amount: i64,
        tx_type: PointsTxType,
        status: PointsTxStatus,
        reason: Option<&str>,
    ) -> Result<GuardedPostOutcome, sqlx::Error> {
        let insert = format!(
            "INSERT INTO points_transactions \
                 (user_id, amount, tx_type_id, status_id, reason) \
             SELECT $1, -$2::BIGINT, $3, $4, $5 \
             WHERE (SELECT COALESCE(SUM(amount), 0)::BIGINT \
                    FROM points_transactions \
                    WHERE user_id = $1 AND status_id IN ($6, $7)) >= $2 \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, PointsTransaction>(&insert)
            .bind(user_id)
            .bind(amount)
            .bind(tx_type.id())
            .bind(status.id())
            .bind(reason)
            .bind(PointsTxStatus::Confirmed.id())
            .bind(PointsTxStatus::Held.id())
            .fetch_optional(pool)
            .await?;

        Ok(match inserted {
            Some(tx) => GuardedPostOutcome::Posted(tx),
            None => GuardedPostOutcome::InsufficientPoints,
        })
    }

    /// Release a hold: flip the held row to canceled, dropping the debt.
    pub async fn release(
        pool: &PgPool,
        user_id: DbId,
        hold_id: DbId,
    ) -> Result<HoldFlipOutcome, sqlx::Error> {
        Self::flip_hold(pool, user_id, hold_id, PointsTxStatus::Canceled).await
    }

    /// Finalize a hold into an actual spend: flip the held row to
    /// confirmed so it starts counting against the balance.
    pub async fn confirm_hold(
        pool: &PgPool,
        user_id: DbId,
        hold_id: DbId,
    ) -> Result<HoldFlipOutcome, sqlx::Error> {
        Self::flip_hold(pool, user_id, hold_id, PointsTxStatus::Confirmed).await
    }

    async fn flip_hold(
        pool: &PgPool,
        user_id: DbId,
        hold_id: DbId,
        target: PointsTxStatus,
    ) -> Result<HoldFlipOutcome, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE points_transactions SET status_id = $1 \
             WHERE id = $2 AND user_id = $3 AND tx_type_id = $4 AND status_id = $5",
        )
        .bind(target.id())
        .bind(hold_id)
        .bind(user_id)
        .bind(PointsTxType::Hold.id())
        .bind(PointsTxStatus::Held.id())
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(HoldFlipOutcome::Applied);
        }

        let row: Option<(StatusId,)> = sqlx::query_as(
            "SELECT status_id FROM points_transactions \
             WHERE id = $1 AND user_id = $2 AND tx_type_id = $3",
        )
        .bind(hold_id)
        .bind(user_id)
        .bind(PointsTxType::Hold.id())
        .fetch_optional(pool)
        .await?;

        Ok(match row {
            None => HoldFlipOutcome::NotFound,
            Some((actual,)) if actual == target.id() => HoldFlipOutcome::AlreadyInTarget,
            Some((actual,)) => HoldFlipOutcome::Conflict { actual },
        })
    }

    /// Derive a user's balance/debt/available position from the log.
    pub async fn balance_for(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<BalanceBreakdown, sqlx::Error> {
        let (confirmed, held): (i64, i64) = sqlx::query_as(
            "SELECT \
                 COALESCE(SUM(amount) FILTER (WHERE status_id = $2), 0)::BIGINT, \
                 COALESCE(SUM(amount) FILTER (WHERE status_id = $3), 0)::BIGINT \
             FROM points_transactions WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(PointsTxStatus::Confirmed.id())
        .bind(PointsTxStatus::Held.id())
        .fetch_one(pool)
        .await?;

        Ok(BalanceBreakdown::from_sums(confirmed, held))
    }

    /// A user's transactions, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<PointsTransaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM points_transactions \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, PointsTransaction>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
