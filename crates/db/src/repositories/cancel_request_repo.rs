//! Guarded updates for the embedded cancel-request sub-state.
//!
//! The sub-state lives in `cancel_*` columns on each of the three entity
//! tables and moves none → requested → {approved, rejected}, with
//! withdrawal (requested → none) reserved for the original requester. Every
//! operation is a conditional update on `cancel_status_id` plus a history
//! row in the same transaction; the main `status_id` is never touched here.

use courtside_core::cancellation;
use courtside_core::lifecycle::EntityKind;
use courtside_core::types::DbId;
use sqlx::PgPool;

use crate::models::history;
use crate::models::status::{CancelRequestStatus, StatusId};
use crate::repositories::history_repo::{HistoryRepo, NewHistory};

/// Result of a guarded cancel-request operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The guarded update matched and committed.
    Applied,
    /// The sub-state was not where the operation requires it; `actual` is
    /// the status observed on re-read.
    Conflict { actual: StatusId },
    /// The withdrawal caller is not the original requester.
    NotRequester,
    /// No row with that id exists.
    NotFound,
}

/// Guarded operations on the cancel-request sub-state.
pub struct CancelRequestRepo;

impl CancelRequestRepo {
    fn table(entity: EntityKind) -> &'static str {
        match entity {
            EntityKind::Order => "orders",
            EntityKind::Rental => "rentals",
            EntityKind::Application => "applications",
        }
    }

    /// Read (cancel_status_id, cancel_requested_by) for an entity.
    pub async fn current(
        pool: &PgPool,
        entity: EntityKind,
        id: DbId,
    ) -> Result<Option<(StatusId, Option<DbId>)>, sqlx::Error> {
        let query = format!(
            "SELECT cancel_status_id, cancel_requested_by FROM {} WHERE id = $1",
            Self::table(entity)
        );
        sqlx::query_as(&query).bind(id).fetch_optional(pool).await
    }

    /// File a cancellation request.
    ///
    /// Allowed from `none` and from `rejected` (re-request after an admin
    /// rejection). A concurrent second request loses the guarded update and
    /// comes back as `Conflict`.
    pub async fn request(
        pool: &PgPool,
        entity: EntityKind,
        id: DbId,
        requester_id: DbId,
        reason_code: Option<&str>,
        reason_text: Option<&str>,
    ) -> Result<CancelOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE {} SET \
                 cancel_status_id = $1, \
                 cancel_reason_code = $2, \
                 cancel_reason_text = $3, \
                 cancel_requested_by = $4, \
                 cancel_requested_at = NOW(), \
                 cancel_processed_at = NULL, \
                 updated_at = NOW() \
             WHERE id = $5 AND cancel_status_id IN ($6, $7)",
            Self::table(entity)
        );
        let result = sqlx::query(&query)
            .bind(CancelRequestStatus::Requested.id())
            .bind(reason_code)
            .bind(reason_text)
            .bind(requester_id)
            .bind(id)
            .bind(CancelRequestStatus::None.id())
            .bind(CancelRequestStatus::Rejected.id())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Self::classify_miss(pool, entity, id).await;
        }

        HistoryRepo::append(
            &mut tx,
            &NewHistory {
                entity_kind: entity,
                entity_id: id,
                record_type: history::RECORD_CANCEL_REQUEST,
                from_status_id: None,
                to_status_id: CancelRequestStatus::Requested.id(),
                actor_id: Some(requester_id),
                description: reason_text,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            entity = entity.as_str(),
            entity_id = id,
            requester_id,
            "Cancellation requested"
        );
        Ok(CancelOutcome::Applied)
    }

    /// Approve a pending request. The chained main-lifecycle transition is
    /// the flow layer's job.
    pub async fn approve(
        pool: &PgPool,
        entity: EntityKind,
        id: DbId,
        actor_id: DbId,
    ) -> Result<CancelOutcome, sqlx::Error> {
        Self::process(pool, entity, id, actor_id, CancelRequestStatus::Approved).await
    }

    /// Reject a pending request, leaving the main status untouched. The
    /// customer may re-request later.
    pub async fn reject(
        pool: &PgPool,
        entity: EntityKind,
        id: DbId,
        actor_id: DbId,
    ) -> Result<CancelOutcome, sqlx::Error> {
        Self::process(pool, entity, id, actor_id, CancelRequestStatus::Rejected).await
    }

    async fn process(
        pool: &PgPool,
        entity: EntityKind,
        id: DbId,
        actor_id: DbId,
        target: CancelRequestStatus,
    ) -> Result<CancelOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE {} SET \
                 cancel_status_id = $1, \
                 cancel_processed_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = $2 AND cancel_status_id = $3",
            Self::table(entity)
        );
        let result = sqlx::query(&query)
            .bind(target.id())
            .bind(id)
            .bind(CancelRequestStatus::Requested.id())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Self::classify_miss(pool, entity, id).await;
        }

        HistoryRepo::append(
            &mut tx,
            &NewHistory {
                entity_kind: entity,
                entity_id: id,
                record_type: history::RECORD_CANCEL_REQUEST,
                from_status_id: Some(CancelRequestStatus::Requested.id()),
                to_status_id: target.id(),
                actor_id: Some(actor_id),
                description: None,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            entity = entity.as_str(),
            entity_id = id,
            actor_id,
            decision = %cancellation::status_name(target.id()),
            "Cancellation request processed"
        );
        Ok(CancelOutcome::Applied)
    }

    /// Withdraw a pending request. Only the original requester may do this;
    /// the sub-state resets to `none` (not `rejected`), and the main status
    /// stays exactly where it was.
    pub async fn withdraw(
        pool: &PgPool,
        entity: EntityKind,
        id: DbId,
        requester_id: DbId,
    ) -> Result<CancelOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE {} SET \
                 cancel_status_id = $1, \
                 cancel_reason_code = NULL, \
                 cancel_reason_text = NULL, \
                 cancel_requested_by = NULL, \
                 cancel_requested_at = NULL, \
                 cancel_processed_at = NULL, \
                 updated_at = NOW() \
             WHERE id = $2 AND cancel_status_id = $3 AND cancel_requested_by = $4",
            Self::table(entity)
        );
        let result = sqlx::query(&query)
            .bind(CancelRequestStatus::None.id())
            .bind(id)
            .bind(CancelRequestStatus::Requested.id())
            .bind(requester_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return match Self::current(pool, entity, id).await? {
                None => Ok(CancelOutcome::NotFound),
                Some((actual, requested_by))
                    if actual == CancelRequestStatus::Requested.id()
                        && requested_by != Some(requester_id) =>
                {
                    Ok(CancelOutcome::NotRequester)
                }
                Some((actual, _)) => Ok(CancelOutcome::Conflict { actual }),
            };
        }

        HistoryRepo::append(
            &mut tx,
            &NewHistory {
                entity_kind: entity,
                entity_id: id,
                record_type: history::RECORD_CANCEL_REQUEST,
                from_status_id: Some(CancelRequestStatus::Requested.id()),
                to_status_id: CancelRequestStatus::None.id(),
                actor_id: Some(requester_id),
                description: Some("withdrawn by requester"),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            entity = entity.as_str(),
            entity_id = id,
            requester_id,
            "Cancellation request withdrawn"
        );
        Ok(CancelOutcome::Applied)
    }

    async fn classify_miss(
        pool: &PgPool,
        entity: EntityKind,
        id: DbId,
    ) -> Result<CancelOutcome, sqlx::Error> {
        Ok(match Self::current(pool, entity, id).await? {
            None => CancelOutcome::NotFound,
            Some((actual, _)) => CancelOutcome::Conflict { actual },
        })
    }
}
