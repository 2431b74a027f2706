//! Advisory lease row for single-executor batch operations.

use courtside_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `leases` table.
///
/// A lease is advisory and time-bounded: acquisition only succeeds when the
/// name is free or the previous holder's TTL has lapsed. It protects batch
/// sweeps from overlapping runs; it is not a general-purpose mutex.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lease {
    pub name: String,
    pub owner: String,
    pub expires_at: Timestamp,
}
