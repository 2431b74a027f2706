//! Stringing application entity models and DTOs.

use chrono::{NaiveDate, NaiveTime};
use courtside_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::status::StatusId;

/// A row from the `applications` table.
///
/// `order_id` and `rental_id` are optional cross-links; partial unique
/// indexes enforce at most one `draft` application per non-null link.
/// `used_pass_id` is set once the in-progress effect has consumed a pass
/// session for this application.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub rental_id: Option<DbId>,
    pub racket_model: String,
    pub string_name: String,
    pub tension_lbs: i32,
    pub preferred_date: NaiveDate,
    pub preferred_time: NaiveTime,
    pub use_pass: bool,
    pub used_pass_id: Option<DbId>,
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

/// DTO for creating a draft application.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateApplication {
    pub user_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub rental_id: Option<DbId>,
    #[validate(length(min = 1, max = 120))]
    pub racket_model: String,
    #[validate(length(min = 1, max = 120))]
    pub string_name: String,
    /// Stringing tension. The shop's machines go from 15 to 90 lbs.
    #[validate(range(min = 15, max = 90))]
    pub tension_lbs: i32,
    pub preferred_date: NaiveDate,
    pub preferred_time: NaiveTime,
    /// Consume a session from the customer's active pass when work starts.
    #[serde(default)]
    pub use_pass: bool,
}
