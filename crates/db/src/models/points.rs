//! Points ledger transaction model.

use courtside_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `points_transactions` ledger.
///
/// Rows are append-only with one exception: a `held` row may flip to
/// `confirmed` (spend finalized) or `canceled` (reservation released).
/// `ref_key` deduplicates retried postings per (user, type, key).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PointsTransaction {
    pub id: DbId,
    pub user_id: DbId,
    pub amount: i64,
    pub tx_type_id: StatusId,
    pub status_id: StatusId,
    pub reason: Option<String>,
    pub ref_key: Option<String>,
    /// The acting admin for `admin_adjust` rows.
    pub admin_id: Option<DbId>,
    pub created_at: Timestamp,
}
