//! The shared lifecycle transition primitive.
//!
//! Every status change on orders, rentals, and applications goes through
//! [`TransitionRepo::transition`]: a single conditional update equivalent to
//! `UPDATE … SET status_id = next WHERE id = $1 AND status_id = expected`.
//! This is the sole concurrency-control primitive for entity state — there
//! is no read-then-write path anywhere in the workspace.

use courtside_core::lifecycle::{self, EntityKind};
use courtside_core::types::DbId;
use sqlx::PgPool;

use crate::models::history;
use crate::models::status::StatusId;
use crate::repositories::history_repo::{HistoryRepo, NewHistory};

/// Result of a guarded transition attempt.
///
/// Only `Applied` means the caller's update happened and its effect should
/// run. `AlreadyInTarget` is the idempotent-success case for duplicate
/// clicks and retried webhooks: the entity is where the caller wanted it,
/// but the effect must NOT be re-applied and no history is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The conditional update matched and committed.
    Applied,
    /// The entity was already in the requested target status.
    AlreadyInTarget,
    /// Another caller won; `actual` is the status observed on re-read.
    Conflict { actual: StatusId },
    /// The transition graph does not allow expected → next.
    InvalidTransition,
    /// No row with that id exists.
    NotFound,
}

/// Guarded status transitions for the three lifecycle entities.
pub struct TransitionRepo;

impl TransitionRepo {
    fn table(entity: EntityKind) -> &'static str {
        match entity {
            EntityKind::Order => "orders",
            EntityKind::Rental => "rentals",
            EntityKind::Application => "applications",
        }
    }

    /// Read the current status of an entity.
    pub async fn current_status(
        pool: &PgPool,
        entity: EntityKind,
        id: DbId,
    ) -> Result<Option<StatusId>, sqlx::Error> {
        let query = format!("SELECT status_id FROM {} WHERE id = $1", Self::table(entity));
        let row: Option<(StatusId,)> = sqlx::query_as(&query).bind(id).fetch_optional(pool).await?;
        Ok(row.map(|(s,)| s))
    }

    /// Atomically move an entity from `expected` to `next`.
    ///
    /// Order of checks:
    /// 1. the transition graph must allow expected → next;
    /// 2. if the entity is already in `next`, return `AlreadyInTarget`
    ///    before attempting the conditional update;
    /// 3. the conditional update runs, and a history row is appended in the
    ///    same transaction;
    /// 4. zero rows matched means re-read and classify as `NotFound`,
    ///    `AlreadyInTarget` (someone else got it there first), or
    ///    `Conflict`.
    pub async fn transition(
        pool: &PgPool,
        entity: EntityKind,
        id: DbId,
        expected: StatusId,
        next: StatusId,
        actor_id: Option<DbId>,
        description: Option<&str>,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        if !lifecycle::can_transition(entity, expected, next) {
            return Ok(TransitionOutcome::InvalidTransition);
        }

        match Self::current_status(pool, entity, id).await? {
            None => return Ok(TransitionOutcome::NotFound),
            Some(current) if current == next => return Ok(TransitionOutcome::AlreadyInTarget),
            Some(_) => {}
        }

        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE {} SET status_id = $1, updated_at = NOW() \
             WHERE id = $2 AND status_id = $3",
            Self::table(entity)
        );
        let result = sqlx::query(&query)
            .bind(next)
            .bind(id)
            .bind(expected)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return match Self::current_status(pool, entity, id).await? {
                None => Ok(TransitionOutcome::NotFound),
                Some(actual) if actual == next => Ok(TransitionOutcome::AlreadyInTarget),
                Some(actual) => Ok(TransitionOutcome::Conflict { actual }),
            };
        }

        HistoryRepo::append(
            &mut tx,
            &NewHistory {
                entity_kind: entity,
                entity_id: id,
                record_type: history::RECORD_LIFECYCLE,
                from_status_id: Some(expected),
                to_status_id: next,
                actor_id,
                description,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            entity = entity.as_str(),
            entity_id = id,
            from = %lifecycle::status_name(entity, expected),
            to = %lifecycle::status_name(entity, next),
            "Status transition applied"
        );

        Ok(TransitionOutcome::Applied)
    }
}
