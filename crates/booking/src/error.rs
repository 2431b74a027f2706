//! Flow-level error type.

use courtside_core::error::CoreError;
use courtside_core::lifecycle::{self, EntityKind};
use courtside_core::types::DbId;
use courtside_db::models::status::StatusId;
use courtside_db::repositories::TransitionOutcome;

/// Error type for flow operations.
///
/// Wraps [`CoreError`] for domain errors and sqlx for storage failures.
/// Expected race outcomes (`Conflict`, `AlreadyInTarget`) stay in the
/// outcome enums — callers branch on them, they are not errors.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A domain-level error from `courtside-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for flow return values.
pub type FlowResult<T> = Result<T, FlowError>;

/// Entity name for `CoreError::NotFound` messages.
pub(crate) fn entity_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Order => "Order",
        EntityKind::Rental => "Rental",
        EntityKind::Application => "Application",
    }
}

/// Promote the error-shaped transition outcomes into `FlowError`.
///
/// `NotFound` and `InvalidTransition` indicate a stale client or a bug and
/// become errors; `Applied`, `AlreadyInTarget`, and `Conflict` pass through
/// for the caller to branch on.
pub(crate) fn check_transition(
    outcome: TransitionOutcome,
    kind: EntityKind,
    id: DbId,
    expected: StatusId,
    next: StatusId,
) -> FlowResult<TransitionOutcome> {
    match outcome {
        TransitionOutcome::NotFound => Err(CoreError::NotFound {
            entity: entity_label(kind),
            id,
        }
        .into()),
        TransitionOutcome::InvalidTransition => Err(CoreError::InvalidState(format!(
            "Invalid {} transition: {} -> {}",
            kind.as_str(),
            lifecycle::status_name(kind, expected),
            lifecycle::status_name(kind, next),
        ))
        .into()),
        other => Ok(other),
    }
}
