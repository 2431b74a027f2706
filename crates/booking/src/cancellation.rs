//! The cancellation workflow: request → approve/reject, plus withdrawal.
//!
//! The sub-state mutations live in `CancelRequestRepo`; this module adds
//! the chaining rule (an approval drives the main lifecycle to its
//! cancel target) and the compensating effects (pass reversion, stock
//! credit, points reversal).

use courtside_core::cancellation;
use courtside_core::error::CoreError;
use courtside_core::lifecycle::{self, order, rental, application, EntityKind};
use courtside_core::types::DbId;
use courtside_db::models::status::{PointsTxType, StatusId};
use courtside_db::repositories::{
    ApplicationRepo, CancelOutcome, CancelRequestRepo, OrderRepo, PassRepo, PointsRepo,
    RentalRepo, RevertOutcome, TransitionOutcome, TransitionRepo,
};
use courtside_events::{DomainEvent, EventBus};
use sqlx::PgPool;

use crate::error::{check_transition, entity_label, FlowResult};

/// File a cancellation request.
///
/// Allowed while the sub-state is `none` or `rejected`. A concurrent
/// second request loses the guarded update and surfaces as `InvalidState`.
pub async fn request(
    pool: &PgPool,
    bus: &EventBus,
    kind: EntityKind,
    entity_id: DbId,
    requester_id: DbId,
    reason_code: Option<&str>,
    reason_text: Option<&str>,
) -> FlowResult<()> {
    let outcome =
        CancelRequestRepo::request(pool, kind, entity_id, requester_id, reason_code, reason_text)
            .await?;
    settle(outcome, kind, entity_id)?;

    bus.publish(
        DomainEvent::new(
            format!("{}.cancel_requested", kind.as_str()),
            kind,
            entity_id,
        )
        .with_actor(requester_id),
    );
    Ok(())
}

/// Approve a pending request and chain the main lifecycle to its cancel
/// target (order → canceled/refunded, rental → canceled, application →
/// canceled), then run the compensating effects.
///
/// Returns the chained transition's outcome: a racing caller that moved
/// the main status first shows up as `Conflict` and the admin re-reads.
pub async fn approve(
    pool: &PgPool,
    bus: &EventBus,
    kind: EntityKind,
    entity_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    // Refuse before flipping the sub-state when the main status has no
    // cancel target at all (e.g. a shipped order).
    let current = TransitionRepo::current_status(pool, kind, entity_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: entity_label(kind),
            id: entity_id,
        })?;
    let target = chain_target(kind, current).ok_or_else(|| {
        CoreError::InvalidState(format!(
            "a {} in status {} cannot be canceled",
            kind.as_str(),
            lifecycle::status_name(kind, current)
        ))
    })?;

    let outcome = CancelRequestRepo::approve(pool, kind, entity_id, actor_id).await?;
    settle(outcome, kind, entity_id)?;

    let outcome = TransitionRepo::transition(
        pool,
        kind,
        entity_id,
        current,
        target,
        Some(actor_id),
        Some("cancellation approved"),
    )
    .await?;
    let outcome = check_transition(outcome, kind, entity_id, current, target)?;

    match outcome {
        TransitionOutcome::Applied => {
            run_cancel_effects(pool, kind, entity_id, target).await?;
            bus.publish(
                DomainEvent::transition(kind, entity_id, current, target).with_actor(actor_id),
            );
        }
        TransitionOutcome::Conflict { actual } => {
            tracing::warn!(
                entity = kind.as_str(),
                entity_id,
                actual,
                "Main status moved while approving cancellation; admin must re-read"
            );
        }
        _ => {}
    }

    Ok(outcome)
}

/// Reject a pending request. The main status is untouched and the customer
/// may re-request later.
pub async fn reject(
    pool: &PgPool,
    bus: &EventBus,
    kind: EntityKind,
    entity_id: DbId,
    actor_id: DbId,
) -> FlowResult<()> {
    let outcome = CancelRequestRepo::reject(pool, kind, entity_id, actor_id).await?;
    settle(outcome, kind, entity_id)?;

    bus.publish(
        DomainEvent::new(format!("{}.cancel_rejected", kind.as_str()), kind, entity_id)
            .with_actor(actor_id),
    );
    Ok(())
}

/// Withdraw a pending request. Only the original requester may do this;
/// the sub-state resets to `none` and the main status stays put.
pub async fn withdraw(
    pool: &PgPool,
    kind: EntityKind,
    entity_id: DbId,
    requester_id: DbId,
) -> FlowResult<()> {
    let outcome = CancelRequestRepo::withdraw(pool, kind, entity_id, requester_id).await?;
    settle(outcome, kind, entity_id)
}

/// The main-lifecycle status an approved cancellation drives to, or `None`
/// when the current status is not cancelable at all.
fn chain_target(kind: EntityKind, current: StatusId) -> Option<StatusId> {
    match kind {
        EntityKind::Order => match current {
            order::PENDING => Some(order::CANCELED),
            // Money already moved: an approved cancellation is a refund.
            order::PAID => Some(order::REFUNDED),
            _ => None,
        },
        EntityKind::Rental => match current {
            rental::CREATED | rental::PAID => Some(rental::CANCELED),
            _ => None,
        },
        EntityKind::Application => match current {
            application::DRAFT
            | application::SUBMITTED
            | application::REVIEWING
            | application::ACCEPTED
            | application::IN_PROGRESS => Some(application::CANCELED),
            _ => None,
        },
    }
}

/// Compensating effects after a chained cancel transition. Every branch
/// delegates to an idempotent primitive, so re-running after a crash is
/// safe.
async fn run_cancel_effects(
    pool: &PgPool,
    kind: EntityKind,
    entity_id: DbId,
    target: StatusId,
) -> FlowResult<()> {
    match kind {
        EntityKind::Application => {
            let application = ApplicationRepo::find_by_id(pool, entity_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "Application",
                    id: entity_id,
                })?;
            if let Some(pass_id) = application.used_pass_id {
                match PassRepo::revert(pool, pass_id, entity_id).await? {
                    RevertOutcome::Reverted => {
                        tracing::info!(pass_id, application_id = entity_id, "Pass session returned");
                    }
                    RevertOutcome::AlreadyReverted => {}
                    RevertOutcome::NotFound => {
                        tracing::warn!(
                            pass_id,
                            application_id = entity_id,
                            "used_pass_id set but no consumption record exists"
                        );
                    }
                }
            }
        }
        EntityKind::Rental => {
            // No-op unless the rental had already debited stock.
            RentalRepo::credit_stock(pool, entity_id).await?;
        }
        EntityKind::Order => {
            if target == order::REFUNDED {
                let order_row = OrderRepo::find_by_id(pool, entity_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "Order",
                        id: entity_id,
                    })?;
                if order_row.reward_points > 0 {
                    // Negate the paid-time accrual; ref_key makes it
                    // exactly-once under retries.
                    PointsRepo::post(
                        pool,
                        order_row.user_id,
                        -order_row.reward_points,
                        PointsTxType::Reversal,
                        Some("order refund"),
                        Some(&format!("order:{entity_id}:reward-reversal")),
                    )
                    .await?;
                }
            }
        }
    }
    Ok(())
}

/// Map the sub-state outcomes into flow errors.
fn settle(outcome: CancelOutcome, kind: EntityKind, entity_id: DbId) -> FlowResult<()> {
    match outcome {
        CancelOutcome::Applied => Ok(()),
        CancelOutcome::Conflict { actual } => Err(CoreError::InvalidState(format!(
            "cancel request for {} {} is {}",
            kind.as_str(),
            entity_id,
            cancellation::status_name(actual)
        ))
        .into()),
        CancelOutcome::NotRequester => Err(CoreError::Forbidden(
            "only the original requester can withdraw a cancellation request".to_string(),
        )
        .into()),
        CancelOutcome::NotFound => Err(CoreError::NotFound {
            entity: entity_label(kind),
            id: entity_id,
        }
        .into()),
    }
}
