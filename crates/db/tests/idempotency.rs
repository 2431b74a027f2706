//! Integration tests for the idempotency-key guard.

use assert_matches::assert_matches;
use courtside_db::repositories::{IdempotencyClaim, IdempotencyRepo};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_first_claim_is_fresh(pool: PgPool) {
    let claim = IdempotencyRepo::claim(&pool, "order.create", "abc-123")
        .await
        .unwrap();
    assert_eq!(claim, IdempotencyClaim::Fresh);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replay_before_response_is_stored(pool: PgPool) {
    IdempotencyRepo::claim(&pool, "order.create", "abc-123").await.unwrap();

    // The original attempt has not stored a response yet.
    let claim = IdempotencyRepo::claim(&pool, "order.create", "abc-123")
        .await
        .unwrap();
    assert_eq!(claim, IdempotencyClaim::Replay(None));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replay_returns_stored_response(pool: PgPool) {
    IdempotencyRepo::claim(&pool, "order.create", "abc-123").await.unwrap();
    IdempotencyRepo::store_response(&pool, "order.create", "abc-123", &json!({"order_id": 55}))
        .await
        .unwrap();

    let claim = IdempotencyRepo::claim(&pool, "order.create", "abc-123")
        .await
        .unwrap();
    let response = assert_matches!(claim, IdempotencyClaim::Replay(Some(r)) => r);
    assert_eq!(response["order_id"], 55);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scopes_are_independent(pool: PgPool) {
    IdempotencyRepo::claim(&pool, "order.create", "abc-123").await.unwrap();

    // The same token under another scope is a separate operation.
    let claim = IdempotencyRepo::claim(&pool, "points.accrue", "abc-123")
        .await
        .unwrap();
    assert_eq!(claim, IdempotencyClaim::Fresh);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_claims_one_fresh(pool: PgPool) {
    let (a, b) = tokio::join!(
        IdempotencyRepo::claim(&pool, "order.create", "race-1"),
        IdempotencyRepo::claim(&pool, "order.create", "race-1"),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let fresh = outcomes
        .iter()
        .filter(|c| matches!(c, IdempotencyClaim::Fresh))
        .count();
    assert_eq!(fresh, 1, "exactly one caller owns the operation");
}
