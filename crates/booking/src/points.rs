//! Reward points flows.

use courtside_core::error::CoreError;
use courtside_core::points::BalanceBreakdown;
use courtside_core::types::DbId;
use courtside_db::models::points::PointsTransaction;
use courtside_db::models::status::PointsTxType;
use courtside_db::repositories::{GuardedPostOutcome, HoldFlipOutcome, PointsRepo, PostOutcome};
use sqlx::PgPool;

use crate::error::FlowResult;

/// Accrue points, deduplicated by `ref_key` when given. A replayed accrual
/// returns the original row as success.
pub async fn accrue(
    pool: &PgPool,
    user_id: DbId,
    amount: i64,
    reason: &str,
    ref_key: Option<&str>,
) -> FlowResult<PointsTransaction> {
    if amount <= 0 {
        return Err(CoreError::Validation("accrual amount must be positive".to_string()).into());
    }
    let outcome = PointsRepo::post(
        pool,
        user_id,
        amount,
        PointsTxType::Accrual,
        Some(reason),
        ref_key,
    )
    .await?;
    Ok(match outcome {
        PostOutcome::Posted(tx) | PostOutcome::Duplicate(tx) => tx,
    })
}

/// Spend points immediately. Fails with `InsufficientPoints` before any
/// row is written when the available balance does not cover the amount.
pub async fn spend(
    pool: &PgPool,
    user_id: DbId,
    amount: i64,
    reason: &str,
) -> FlowResult<PointsTransaction> {
    if amount <= 0 {
        return Err(CoreError::Validation("spend amount must be positive".to_string()).into());
    }
    match PointsRepo::spend(pool, user_id, amount, Some(reason)).await? {
        GuardedPostOutcome::Posted(tx) => Ok(tx),
        GuardedPostOutcome::InsufficientPoints => Err(CoreError::InsufficientPoints.into()),
    }
}

/// Reserve points against an in-progress checkout. The hold shows up as
/// debt until it is released or confirmed.
pub async fn hold(
    pool: &PgPool,
    user_id: DbId,
    amount: i64,
    reason: &str,
) -> FlowResult<PointsTransaction> {
    if amount <= 0 {
        return Err(CoreError::Validation("hold amount must be positive".to_string()).into());
    }
    match PointsRepo::hold(pool, user_id, amount, Some(reason)).await? {
        GuardedPostOutcome::Posted(tx) => Ok(tx),
        GuardedPostOutcome::InsufficientPoints => Err(CoreError::InsufficientPoints.into()),
    }
}

/// Release a hold, dropping the reservation. Idempotent: releasing an
/// already-released hold is success.
pub async fn release_hold(pool: &PgPool, user_id: DbId, hold_id: DbId) -> FlowResult<()> {
    settle_flip(
        PointsRepo::release(pool, user_id, hold_id).await?,
        hold_id,
        "release",
    )
}

/// Finalize a hold into an actual spend. Idempotent like release.
pub async fn confirm_hold(pool: &PgPool, user_id: DbId, hold_id: DbId) -> FlowResult<()> {
    settle_flip(
        PointsRepo::confirm_hold(pool, user_id, hold_id).await?,
        hold_id,
        "confirm",
    )
}

/// Unrestricted admin correction, audit-linked to the acting admin.
pub async fn admin_adjust(
    pool: &PgPool,
    user_id: DbId,
    amount: i64,
    admin_id: DbId,
    reason: &str,
) -> FlowResult<PointsTransaction> {
    if reason.trim().is_empty() {
        return Err(CoreError::Validation("an adjustment requires a reason".to_string()).into());
    }
    Ok(PointsRepo::adjust(pool, user_id, amount, admin_id, reason).await?)
}

/// A user's derived balance/debt/available position.
pub async fn balance(pool: &PgPool, user_id: DbId) -> FlowResult<BalanceBreakdown> {
    Ok(PointsRepo::balance_for(pool, user_id).await?)
}

fn settle_flip(outcome: HoldFlipOutcome, hold_id: DbId, operation: &str) -> FlowResult<()> {
    match outcome {
        HoldFlipOutcome::Applied | HoldFlipOutcome::AlreadyInTarget => Ok(()),
        HoldFlipOutcome::Conflict { actual } => Err(CoreError::InvalidState(format!(
            "cannot {operation} hold {hold_id}: it is in status {actual}"
        ))
        .into()),
        HoldFlipOutcome::NotFound => Err(CoreError::NotFound {
            entity: "PointsHold",
            id: hold_id,
        }
        .into()),
    }
}
