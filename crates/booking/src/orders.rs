//! Purchase order flows.

use courtside_core::error::CoreError;
use courtside_core::lifecycle::EntityKind;
use courtside_core::types::DbId;
use courtside_db::models::order::{CreateOrder, Order};
use courtside_db::models::service_pass::SERVICE_TYPE_STRINGING;
use courtside_db::models::status::{OrderStatus, PointsTxType};
use courtside_db::repositories::{
    IdempotencyClaim, IdempotencyRepo, IssueOutcome, OrderRepo, PassRepo, PointsRepo,
    TransitionOutcome, TransitionRepo,
};
use courtside_events::{DomainEvent, EventBus};
use sqlx::PgPool;
use validator::Validate;

use crate::error::{check_transition, FlowResult};

/// Idempotency scope for order creation.
const IDEMPOTENCY_SCOPE: &str = "order.create";

/// Create a new pending order.
///
/// When the caller supplies an idempotency key (double-submitted checkout
/// clicks), replays return the originally created order instead of a
/// second one.
pub async fn create_order(
    pool: &PgPool,
    user_id: DbId,
    input: &CreateOrder,
    idempotency_key: Option<&str>,
) -> FlowResult<Order> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    if let Some(key) = idempotency_key {
        match IdempotencyRepo::claim(pool, IDEMPOTENCY_SCOPE, key).await? {
            IdempotencyClaim::Fresh => {}
            IdempotencyClaim::Replay(Some(response)) => {
                let order_id = response
                    .get("order_id")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or_else(|| {
                        CoreError::Internal("malformed idempotency response".to_string())
                    })?;
                let order = OrderRepo::find_by_id(pool, order_id).await?.ok_or(
                    CoreError::NotFound {
                        entity: "Order",
                        id: order_id,
                    },
                )?;
                tracing::debug!(order_id, key, "Order creation replayed");
                return Ok(order);
            }
            IdempotencyClaim::Replay(None) => {
                return Err(CoreError::Conflict(
                    "an identical request is already being processed".to_string(),
                )
                .into());
            }
        }
    }

    let order = OrderRepo::create(pool, user_id, input).await?;

    if let Some(key) = idempotency_key {
        IdempotencyRepo::store_response(
            pool,
            IDEMPOTENCY_SCOPE,
            key,
            &serde_json::json!({ "order_id": order.id }),
        )
        .await?;
    }

    tracing::info!(order_id = order.id, user_id, "Order created");
    Ok(order)
}

/// Payment confirmed: pending → paid, then issue the purchased pass and
/// accrue reward points.
pub async fn mark_paid(
    pool: &PgPool,
    bus: &EventBus,
    order_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    let outcome = TransitionRepo::transition(
        pool,
        EntityKind::Order,
        order_id,
        OrderStatus::Pending.id(),
        OrderStatus::Paid.id(),
        Some(actor_id),
        None,
    )
    .await?;
    let outcome = check_transition(
        outcome,
        EntityKind::Order,
        order_id,
        OrderStatus::Pending.id(),
        OrderStatus::Paid.id(),
    )?;

    if outcome == TransitionOutcome::Applied {
        run_paid_effects(pool, order_id).await?;
        bus.publish(
            DomainEvent::transition(
                EntityKind::Order,
                order_id,
                OrderStatus::Pending.id(),
                OrderStatus::Paid.id(),
            )
            .with_actor(actor_id),
        );
    }

    Ok(outcome)
}

/// Effects for a paid order. Idempotent end to end, so crash recovery can
/// re-run it for any order already in `paid`.
pub async fn run_paid_effects(pool: &PgPool, order_id: DbId) -> FlowResult<()> {
    let order = OrderRepo::find_by_id(pool, order_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        })?;

    if let (Some(total), Some(days)) = (order.package_total_sessions, order.package_validity_days) {
        match PassRepo::issue_for_order(
            pool,
            order.user_id,
            order.id,
            SERVICE_TYPE_STRINGING,
            total,
            days,
        )
        .await?
        {
            IssueOutcome::Issued(pass) => {
                tracing::info!(
                    order_id,
                    pass_id = pass.id,
                    total_sessions = total,
                    "Stringing pass issued"
                );
            }
            IssueOutcome::Replayed(pass) => {
                tracing::debug!(order_id, pass_id = pass.id, "Pass issuance replayed");
            }
        }
    }

    if order.reward_points > 0 {
        // PostOutcome::Duplicate is success — the accrual already happened.
        PointsRepo::post(
            pool,
            order.user_id,
            order.reward_points,
            PointsTxType::Accrual,
            Some("order reward"),
            Some(&format!("order:{order_id}:reward")),
        )
        .await?;
    }

    Ok(())
}

/// Admin ships the order: paid → shipped.
pub async fn mark_shipped(
    pool: &PgPool,
    bus: &EventBus,
    order_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    simple_transition(pool, bus, order_id, OrderStatus::Paid, OrderStatus::Shipped, actor_id).await
}

/// Carrier delivered: shipped → delivered.
pub async fn mark_delivered(
    pool: &PgPool,
    bus: &EventBus,
    order_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    simple_transition(
        pool,
        bus,
        order_id,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        actor_id,
    )
    .await
}

/// Customer confirms receipt: delivered → confirmed.
pub async fn confirm(
    pool: &PgPool,
    bus: &EventBus,
    order_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    simple_transition(
        pool,
        bus,
        order_id,
        OrderStatus::Delivered,
        OrderStatus::Confirmed,
        actor_id,
    )
    .await
}

/// Direct admin cancellation of an unpaid order: pending → canceled.
///
/// Paid orders go through the cancellation workflow and end in `refunded`.
pub async fn cancel_pending(
    pool: &PgPool,
    bus: &EventBus,
    order_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    simple_transition(
        pool,
        bus,
        order_id,
        OrderStatus::Pending,
        OrderStatus::Canceled,
        actor_id,
    )
    .await
}

/// Shared effect-free transition + event emission.
async fn simple_transition(
    pool: &PgPool,
    bus: &EventBus,
    order_id: DbId,
    expected: OrderStatus,
    next: OrderStatus,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    let outcome = TransitionRepo::transition(
        pool,
        EntityKind::Order,
        order_id,
        expected.id(),
        next.id(),
        Some(actor_id),
        None,
    )
    .await?;
    let outcome = check_transition(outcome, EntityKind::Order, order_id, expected.id(), next.id())?;

    if outcome == TransitionOutcome::Applied {
        bus.publish(
            DomainEvent::transition(EntityKind::Order, order_id, expected.id(), next.id())
                .with_actor(actor_id),
        );
    }

    Ok(outcome)
}
