use crate::types::DbId;

/// Domain error taxonomy shared by every crate in the workspace.
///
/// Expected race outcomes (a lost compare-and-swap, a replayed idempotent
/// call) are NOT errors — repositories report them through their outcome
/// enums and callers branch on them. `CoreError` is reserved for conditions
/// the caller must surface: missing entities, rejected input, exhausted
/// entitlements, and genuinely broken storage.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No remaining sessions on the selected pass")]
    InsufficientBalance,

    #[error("Insufficient points balance")]
    InsufficientPoints,

    #[error("Booking capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
