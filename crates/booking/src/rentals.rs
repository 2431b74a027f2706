//! Racket rental flows.

use courtside_core::error::CoreError;
use courtside_core::lifecycle::EntityKind;
use courtside_core::types::DbId;
use courtside_db::models::rental::{CreateRental, Rental};
use courtside_db::models::status::RentalStatus;
use courtside_db::repositories::{
    RentalRepo, StockDebitOutcome, TransitionOutcome, TransitionRepo,
};
use courtside_events::{DomainEvent, EventBus};
use sqlx::PgPool;
use validator::Validate;

use crate::error::{check_transition, FlowResult};

/// Create a new rental in `created` status.
pub async fn create_rental(
    pool: &PgPool,
    user_id: DbId,
    input: &CreateRental,
) -> FlowResult<Rental> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let racket = RentalRepo::find_racket(pool, input.racket_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Racket",
            id: input.racket_id,
        })?;
    if racket.stock == 0 {
        return Err(CoreError::Conflict(format!(
            "racket '{}' is out of stock",
            racket.name
        ))
        .into());
    }

    let rental = RentalRepo::create(pool, user_id, input).await?;
    tracing::info!(rental_id = rental.id, user_id, racket_id = racket.id, "Rental created");
    Ok(rental)
}

/// Payment confirmed: created → paid.
pub async fn mark_paid(
    pool: &PgPool,
    bus: &EventBus,
    rental_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    simple_transition(
        pool,
        bus,
        rental_id,
        RentalStatus::Created,
        RentalStatus::Paid,
        actor_id,
    )
    .await
}

/// Hand the racket over: paid → out, then debit inventory.
///
/// Stock is re-checked before the transition, but the debit itself runs as
/// the post-commit effect. If a racing dispatch drained the stock in
/// between, the debit reports it and the discrepancy is logged for the
/// admin rather than rolling back the committed transition.
pub async fn dispatch(
    pool: &PgPool,
    bus: &EventBus,
    rental_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    let rental = RentalRepo::find_by_id(pool, rental_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Rental",
            id: rental_id,
        })?;
    let racket = RentalRepo::find_racket(pool, rental.racket_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Racket",
            id: rental.racket_id,
        })?;
    if racket.stock == 0 && !rental.stock_debited {
        return Err(CoreError::Conflict(format!(
            "racket '{}' is out of stock",
            racket.name
        ))
        .into());
    }

    let outcome = TransitionRepo::transition(
        pool,
        EntityKind::Rental,
        rental_id,
        RentalStatus::Paid.id(),
        RentalStatus::Out.id(),
        Some(actor_id),
        None,
    )
    .await?;
    let outcome = check_transition(
        outcome,
        EntityKind::Rental,
        rental_id,
        RentalStatus::Paid.id(),
        RentalStatus::Out.id(),
    )?;

    if outcome == TransitionOutcome::Applied {
        match RentalRepo::debit_stock(pool, rental_id).await? {
            StockDebitOutcome::Debited | StockDebitOutcome::AlreadyDebited => {}
            StockDebitOutcome::OutOfStock => {
                tracing::warn!(
                    rental_id,
                    racket_id = rental.racket_id,
                    "Rental dispatched with zero stock; inventory needs correction"
                );
            }
        }
        bus.publish(
            DomainEvent::transition(
                EntityKind::Rental,
                rental_id,
                RentalStatus::Paid.id(),
                RentalStatus::Out.id(),
            )
            .with_actor(actor_id),
        );
    }

    Ok(outcome)
}

/// Racket came back: out → returned, then credit inventory.
pub async fn mark_returned(
    pool: &PgPool,
    bus: &EventBus,
    rental_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    let outcome = TransitionRepo::transition(
        pool,
        EntityKind::Rental,
        rental_id,
        RentalStatus::Out.id(),
        RentalStatus::Returned.id(),
        Some(actor_id),
        None,
    )
    .await?;
    let outcome = check_transition(
        outcome,
        EntityKind::Rental,
        rental_id,
        RentalStatus::Out.id(),
        RentalStatus::Returned.id(),
    )?;

    if outcome == TransitionOutcome::Applied {
        RentalRepo::credit_stock(pool, rental_id).await?;
        bus.publish(
            DomainEvent::transition(
                EntityKind::Rental,
                rental_id,
                RentalStatus::Out.id(),
                RentalStatus::Returned.id(),
            )
            .with_actor(actor_id),
        );
    }

    Ok(outcome)
}

/// Shared effect-free transition + event emission.
async fn simple_transition(
    pool: &PgPool,
    bus: &EventBus,
    rental_id: DbId,
    expected: RentalStatus,
    next: RentalStatus,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    let outcome = TransitionRepo::transition(
        pool,
        EntityKind::Rental,
        rental_id,
        expected.id(),
        next.id(),
        Some(actor_id),
        None,
    )
    .await?;
    let outcome =
        check_transition(outcome, EntityKind::Rental, rental_id, expected.id(), next.id())?;

    if outcome == TransitionOutcome::Applied {
        bus.publish(
            DomainEvent::transition(EntityKind::Rental, rental_id, expected.id(), next.id())
                .with_actor(actor_id),
        );
    }

    Ok(outcome)
}
