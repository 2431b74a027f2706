//! Purchase order entity models and DTOs.

use courtside_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::status::StatusId;

/// A row from the `orders` table.
///
/// The `package_*` columns are non-null when the order purchases a prepaid
/// stringing pass; reaching `paid` then issues the pass (idempotently, keyed
/// on the order id). The `cancel_*` columns are the embedded cancel-request
/// sub-state.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub user_id: DbId,
    pub item_name: String,
    pub amount: i64,
    pub reward_points: i64,
    pub package_total_sessions: Option<i32>,
    pub package_validity_days: Option<i32>,
    pub status_id: StatusId,
    pub cancel_status_id: StatusId,
    pub cancel_reason_code: Option<String>,
    pub cancel_reason_text: Option<String>,
    pub cancel_requested_by: Option<DbId>,
    pub cancel_requested_at: Option<Timestamp>,
    pub cancel_processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Whether this order purchases a stringing pass.
    pub fn is_package_purchase(&self) -> bool {
        self.package_total_sessions.is_some() && self.package_validity_days.is_some()
    }
}

/// DTO for creating a new order.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrder {
    #[validate(length(min = 1, max = 200))]
    pub item_name: String,
    #[validate(range(min = 0))]
    pub amount: i64,
    /// Points accrued when the order is paid. Defaults to 0.
    pub reward_points: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub package_total_sessions: Option<i32>,
    #[validate(range(min = 1, max = 730))]
    pub package_validity_days: Option<i32>,
}
