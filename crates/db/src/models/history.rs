//! Append-only status history model.

use courtside_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// Record type for lifecycle transitions.
pub const RECORD_LIFECYCLE: &str = "lifecycle";

/// Record type for cancel-request sub-state changes.
pub const RECORD_CANCEL_REQUEST: &str = "cancel_request";

/// A row from the `status_history` table.
///
/// One row per successful guarded update, written in the same transaction
/// as the update itself. `record_type` says whether the from/to ids belong
/// to the entity's lifecycle vocabulary or the cancel-request sub-state.
/// Rows are never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusHistoryEntry {
    pub id: DbId,
    pub entity_kind: String,
    pub entity_id: DbId,
    pub record_type: String,
    pub from_status_id: Option<StatusId>,
    pub to_status_id: StatusId,
    pub actor_id: Option<DbId>,
    pub description: Option<String>,
    pub created_at: Timestamp,
}
