//! Prepaid stringing pass and consumption ledger models.

use courtside_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// The only pass-backed service the shop sells today. Kept as data so a
/// second service line (e.g. grip replacement bundles) is a new constant,
/// not a schema change.
pub const SERVICE_TYPE_STRINGING: &str = "stringing";

/// A row from the `service_passes` table.
///
/// `remaining_sessions` is maintained exclusively by the consume/revert
/// guarded updates; a CHECK constraint keeps it inside `0..=total_sessions`
/// so any code path that would break the invariant fails loudly. Passes are
/// never hard-deleted — expiry and cancellation are status transitions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ServicePass {
    pub id: DbId,
    pub user_id: DbId,
    /// Set when the pass was issued by a package purchase; unique where
    /// non-null so issuance replays land on the same pass.
    pub source_order_id: Option<DbId>,
    pub service_type: String,
    pub total_sessions: i32,
    pub remaining_sessions: i32,
    pub status_id: StatusId,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `pass_consumptions` ledger.
///
/// Unique on (pass_id, application_id): one debit per application per pass,
/// reversible exactly once via the `reverted` flip.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PassConsumption {
    pub id: DbId,
    pub pass_id: DbId,
    pub application_id: DbId,
    pub used_at: Timestamp,
    pub reverted: bool,
    pub reverted_at: Option<Timestamp>,
}
