//! Integration tests for the cancel-request sub-state.
//!
//! Mutual exclusion of concurrent requests, the approve/reject/withdraw
//! guards, re-request after rejection, and the audit trail.

use assert_matches::assert_matches;
use courtside_core::cancellation;
use courtside_core::lifecycle::EntityKind;
use courtside_db::models::history::RECORD_CANCEL_REQUEST;
use courtside_db::models::order::CreateOrder;
use courtside_db::repositories::{CancelOutcome, CancelRequestRepo, HistoryRepo, OrderRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_order(pool: &PgPool, user_id: i64) -> i64 {
    let order = OrderRepo::create(
        pool,
        user_id,
        &CreateOrder {
            item_name: "Luxilon ALU Power reel".to_string(),
            amount: 180_000,
            reward_points: None,
            package_total_sessions: None,
            package_validity_days: None,
        },
    )
    .await
    .unwrap();
    order.id
}

async fn cancel_status(pool: &PgPool, id: i64) -> i16 {
    CancelRequestRepo::current(pool, EntityKind::Order, id)
        .await
        .unwrap()
        .unwrap()
        .0
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_request_from_none(pool: PgPool) {
    let id = new_order(&pool, 7).await;

    let outcome = CancelRequestRepo::request(
        &pool,
        EntityKind::Order,
        id,
        7,
        Some("change_of_mind"),
        Some("ordered the wrong gauge"),
    )
    .await
    .unwrap();
    assert_eq!(outcome, CancelOutcome::Applied);
    assert_eq!(cancel_status(&pool, id).await, cancellation::REQUESTED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_request_while_pending_conflicts(pool: PgPool) {
    let id = new_order(&pool, 7).await;
    CancelRequestRepo::request(&pool, EntityKind::Order, id, 7, None, None)
        .await
        .unwrap();

    let second = CancelRequestRepo::request(&pool, EntityKind::Order, id, 7, None, None)
        .await
        .unwrap();
    let actual = assert_matches!(second, CancelOutcome::Conflict { actual } => actual);
    assert_eq!(actual, cancellation::REQUESTED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_requests_exactly_one_wins(pool: PgPool) {
    let id = new_order(&pool, 7).await;

    let (a, b) = tokio::join!(
        CancelRequestRepo::request(&pool, EntityKind::Order, id, 7, None, None),
        CancelRequestRepo::request(&pool, EntityKind::Order, id, 8, None, None),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let applied = outcomes
        .iter()
        .filter(|o| matches!(o, CancelOutcome::Applied))
        .count();
    assert_eq!(applied, 1, "exactly one requested record exists");
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, CancelOutcome::Conflict { .. })));

    assert_eq!(cancel_status(&pool, id).await, cancellation::REQUESTED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_request_unknown_entity(pool: PgPool) {
    let outcome = CancelRequestRepo::request(&pool, EntityKind::Order, 424242, 7, None, None)
        .await
        .unwrap();
    assert_eq!(outcome, CancelOutcome::NotFound);
}

// ---------------------------------------------------------------------------
// Approve / reject
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_requires_pending_request(pool: PgPool) {
    let id = new_order(&pool, 7).await;

    // Approving with no request on file.
    let outcome = CancelRequestRepo::approve(&pool, EntityKind::Order, id, 99)
        .await
        .unwrap();
    let actual = assert_matches!(outcome, CancelOutcome::Conflict { actual } => actual);
    assert_eq!(actual, cancellation::NONE);

    CancelRequestRepo::request(&pool, EntityKind::Order, id, 7, None, None)
        .await
        .unwrap();
    let outcome = CancelRequestRepo::approve(&pool, EntityKind::Order, id, 99)
        .await
        .unwrap();
    assert_eq!(outcome, CancelOutcome::Applied);
    assert_eq!(cancel_status(&pool, id).await, cancellation::APPROVED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_then_re_request(pool: PgPool) {
    let id = new_order(&pool, 7).await;
    CancelRequestRepo::request(&pool, EntityKind::Order, id, 7, None, None)
        .await
        .unwrap();

    let outcome = CancelRequestRepo::reject(&pool, EntityKind::Order, id, 99)
        .await
        .unwrap();
    assert_eq!(outcome, CancelOutcome::Applied);
    assert_eq!(cancel_status(&pool, id).await, cancellation::REJECTED);

    // The customer may ask again after a rejection.
    let outcome = CancelRequestRepo::request(
        &pool,
        EntityKind::Order,
        id,
        7,
        Some("defect"),
        Some("strings arrived frayed"),
    )
    .await
    .unwrap();
    assert_eq!(outcome, CancelOutcome::Applied);
    assert_eq!(cancel_status(&pool, id).await, cancellation::REQUESTED);
}

// ---------------------------------------------------------------------------
// Withdraw
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_withdraw_resets_to_none(pool: PgPool) {
    let id = new_order(&pool, 7).await;
    CancelRequestRepo::request(&pool, EntityKind::Order, id, 7, Some("x"), Some("y"))
        .await
        .unwrap();

    let outcome = CancelRequestRepo::withdraw(&pool, EntityKind::Order, id, 7)
        .await
        .unwrap();
    assert_eq!(outcome, CancelOutcome::Applied);

    let (status, requested_by) = CancelRequestRepo::current(&pool, EntityKind::Order, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status, cancellation::NONE);
    assert_eq!(requested_by, None);

    let order = OrderRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(order.cancel_reason_code, None);
    assert_eq!(order.cancel_reason_text, None);
    assert_eq!(order.cancel_requested_at, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_withdraw_by_other_user_refused(pool: PgPool) {
    let id = new_order(&pool, 7).await;
    CancelRequestRepo::request(&pool, EntityKind::Order, id, 7, None, None)
        .await
        .unwrap();

    let outcome = CancelRequestRepo::withdraw(&pool, EntityKind::Order, id, 8)
        .await
        .unwrap();
    assert_eq!(outcome, CancelOutcome::NotRequester);
    assert_eq!(cancel_status(&pool, id).await, cancellation::REQUESTED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_withdraw_without_pending_request(pool: PgPool) {
    let id = new_order(&pool, 7).await;
    let outcome = CancelRequestRepo::withdraw(&pool, EntityKind::Order, id, 7)
        .await
        .unwrap();
    let actual = assert_matches!(outcome, CancelOutcome::Conflict { actual } => actual);
    assert_eq!(actual, cancellation::NONE);
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_every_operation_appends_history(pool: PgPool) {
    let id = new_order(&pool, 7).await;

    CancelRequestRepo::request(&pool, EntityKind::Order, id, 7, None, Some("too slow"))
        .await
        .unwrap();
    CancelRequestRepo::reject(&pool, EntityKind::Order, id, 99)
        .await
        .unwrap();
    CancelRequestRepo::request(&pool, EntityKind::Order, id, 7, None, None)
        .await
        .unwrap();
    CancelRequestRepo::withdraw(&pool, EntityKind::Order, id, 7)
        .await
        .unwrap();

    let history = HistoryRepo::list_for_entity(&pool, EntityKind::Order, id)
        .await
        .unwrap();
    let cancel_rows: Vec<_> = history
        .iter()
        .filter(|h| h.record_type == RECORD_CANCEL_REQUEST)
        .collect();
    assert_eq!(cancel_rows.len(), 4);
    assert_eq!(cancel_rows[0].to_status_id, cancellation::REQUESTED);
    assert_eq!(cancel_rows[1].to_status_id, cancellation::REJECTED);
    assert_eq!(cancel_rows[2].to_status_id, cancellation::REQUESTED);
    assert_eq!(cancel_rows[3].to_status_id, cancellation::NONE);
}
