//! Integration tests for the guarded transition primitive.
//!
//! Exercises the conditional update against a real database: winner/loser
//! classification under races, the idempotent-target exception, graph
//! rejection, and the history append.

use assert_matches::assert_matches;
use courtside_core::lifecycle::{rental, EntityKind};
use courtside_db::models::history::RECORD_LIFECYCLE;
use courtside_db::models::rental::CreateRental;
use courtside_db::repositories::{
    HistoryRepo, RentalRepo, TransitionOutcome, TransitionRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_rental(pool: &PgPool) -> i64 {
    let racket = RentalRepo::create_racket(pool, "Yonex Ezone 98", 5)
        .await
        .unwrap();
    let rental = RentalRepo::create(
        pool,
        1,
        &CreateRental {
            racket_id: racket.id,
            daily_rate: 5_000,
            due_at: None,
        },
    )
    .await
    .unwrap();
    rental.id
}

async fn status_of(pool: &PgPool, id: i64) -> i16 {
    TransitionRepo::current_status(pool, EntityKind::Rental, id)
        .await
        .unwrap()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Applied + history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transition_applies_and_records_history(pool: PgPool) {
    let id = new_rental(&pool).await;

    let outcome = TransitionRepo::transition(
        &pool,
        EntityKind::Rental,
        id,
        rental::CREATED,
        rental::PAID,
        Some(42),
        Some("payment confirmed"),
    )
    .await
    .unwrap();
    assert_eq!(outcome, TransitionOutcome::Applied);
    assert_eq!(status_of(&pool, id).await, rental::PAID);

    let history = HistoryRepo::list_for_entity(&pool, EntityKind::Rental, id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].record_type, RECORD_LIFECYCLE);
    assert_eq!(history[0].from_status_id, Some(rental::CREATED));
    assert_eq!(history[0].to_status_id, rental::PAID);
    assert_eq!(history[0].actor_id, Some(42));
    assert_eq!(history[0].description.as_deref(), Some("payment confirmed"));
}

// ---------------------------------------------------------------------------
// Idempotent-target exception
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_transition_is_idempotent_success(pool: PgPool) {
    let id = new_rental(&pool).await;

    TransitionRepo::transition(
        &pool,
        EntityKind::Rental,
        id,
        rental::CREATED,
        rental::PAID,
        None,
        None,
    )
    .await
    .unwrap();

    // The retried webhook: same transition again.
    let replay = TransitionRepo::transition(
        &pool,
        EntityKind::Rental,
        id,
        rental::CREATED,
        rental::PAID,
        None,
        None,
    )
    .await
    .unwrap();
    assert_eq!(replay, TransitionOutcome::AlreadyInTarget);

    // No second history row was written.
    let history = HistoryRepo::list_for_entity(&pool, EntityKind::Rental, id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

// ---------------------------------------------------------------------------
// Graph rejection, not-found
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_graph_forbidden_transition_rejected(pool: PgPool) {
    let id = new_rental(&pool).await;

    // created -> out skips payment.
    let outcome = TransitionRepo::transition(
        &pool,
        EntityKind::Rental,
        id,
        rental::CREATED,
        rental::OUT,
        None,
        None,
    )
    .await
    .unwrap();
    assert_eq!(outcome, TransitionOutcome::InvalidTransition);
    assert_eq!(status_of(&pool, id).await, rental::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transition_unknown_entity(pool: PgPool) {
    let outcome = TransitionRepo::transition(
        &pool,
        EntityKind::Rental,
        424242,
        rental::CREATED,
        rental::PAID,
        None,
        None,
    )
    .await
    .unwrap();
    assert_eq!(outcome, TransitionOutcome::NotFound);
}

// ---------------------------------------------------------------------------
// Races
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_divergent_transitions_one_winner(pool: PgPool) {
    // Admin A confirms payment while admin B cancels: exactly one wins,
    // the loser observes Conflict with the winner's status.
    let id = new_rental(&pool).await;

    let (pay, cancel) = tokio::join!(
        TransitionRepo::transition(
            &pool,
            EntityKind::Rental,
            id,
            rental::CREATED,
            rental::PAID,
            Some(1),
            None,
        ),
        TransitionRepo::transition(
            &pool,
            EntityKind::Rental,
            id,
            rental::CREATED,
            rental::CANCELED,
            Some(2),
            None,
        ),
    );
    let outcomes = [pay.unwrap(), cancel.unwrap()];

    let applied = outcomes
        .iter()
        .filter(|o| matches!(o, TransitionOutcome::Applied))
        .count();
    assert_eq!(applied, 1, "exactly one caller wins the step");

    let final_status = status_of(&pool, id).await;
    let loser = outcomes
        .iter()
        .find(|o| !matches!(o, TransitionOutcome::Applied))
        .unwrap();
    let actual = assert_matches!(loser, TransitionOutcome::Conflict { actual } => *actual);
    assert_eq!(
        actual, final_status,
        "the loser's re-read observes the winner's status"
    );

    // One step happened, so one history row.
    let history = HistoryRepo::list_for_entity(&pool, EntityKind::Rental, id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_same_transition_single_side_effect(pool: PgPool) {
    // Two admins clicking "dispatch" together: one Applied, the other gets
    // the idempotent success — and only one history row exists, which is
    // what keeps effects from double-running.
    let id = new_rental(&pool).await;
    TransitionRepo::transition(
        &pool,
        EntityKind::Rental,
        id,
        rental::CREATED,
        rental::PAID,
        None,
        None,
    )
    .await
    .unwrap();

    let (a, b) = tokio::join!(
        TransitionRepo::transition(
            &pool,
            EntityKind::Rental,
            id,
            rental::PAID,
            rental::OUT,
            Some(1),
            None,
        ),
        TransitionRepo::transition(
            &pool,
            EntityKind::Rental,
            id,
            rental::PAID,
            rental::OUT,
            Some(2),
            None,
        ),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let applied = outcomes
        .iter()
        .filter(|o| matches!(o, TransitionOutcome::Applied))
        .count();
    assert_eq!(applied, 1);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, TransitionOutcome::Applied | TransitionOutcome::AlreadyInTarget)));

    assert_eq!(status_of(&pool, id).await, rental::OUT);

    let dispatch_rows = HistoryRepo::list_for_entity(&pool, EntityKind::Rental, id)
        .await
        .unwrap()
        .into_iter()
        .filter(|h| h.to_status_id == rental::OUT)
        .count();
    assert_eq!(dispatch_rows, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cas_chain_totally_orders_transitions(pool: PgPool) {
    // Each transition's precondition is the previous one's postcondition,
    // so the full chain replays cleanly and leaves a coherent timeline.
    let id = new_rental(&pool).await;

    for (from, to) in [
        (rental::CREATED, rental::PAID),
        (rental::PAID, rental::OUT),
        (rental::OUT, rental::RETURNED),
    ] {
        let outcome =
            TransitionRepo::transition(&pool, EntityKind::Rental, id, from, to, None, None)
                .await
                .unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);
    }

    let history = HistoryRepo::list_for_entity(&pool, EntityKind::Rental, id)
        .await
        .unwrap();
    let steps: Vec<(Option<i16>, i16)> = history
        .iter()
        .map(|h| (h.from_status_id, h.to_status_id))
        .collect();
    assert_eq!(
        steps,
        vec![
            (Some(rental::CREATED), rental::PAID),
            (Some(rental::PAID), rental::OUT),
            (Some(rental::OUT), rental::RETURNED),
        ]
    );

    // The rental is terminal now; nothing further applies.
    let outcome = TransitionRepo::transition(
        &pool,
        EntityKind::Rental,
        id,
        rental::RETURNED,
        rental::CANCELED,
        None,
        None,
    )
    .await
    .unwrap();
    assert_eq!(outcome, TransitionOutcome::InvalidTransition);
}
