//! Rental entity models and DTOs, plus the racket inventory row.

use courtside_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::status::StatusId;

/// A row from the `rentals` table.
///
/// `stock_debited` is the idempotency flag for the inventory effect: the
/// dispatch effect only decrements racket stock after winning the
/// false→true flip, so a crash-and-retry can never debit twice.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Rental {
    pub id: DbId,
    pub user_id: DbId,
    pub racket_id: DbId,
    pub daily_rate: i64,
    pub due_at: Option<Timestamp>,
    pub status_id: StatusId,
    pub stock_debited: bool,
    pub cancel_status_id: StatusId,
    pub cancel_reason_code: Option<String>,
    pub cancel_reason_text: Option<String>,
    pub cancel_requested_by: Option<DbId>,
    pub cancel_requested_at: Option<Timestamp>,
    pub cancel_processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new rental.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRental {
    pub racket_id: DbId,
    #[validate(range(min = 0))]
    pub daily_rate: i64,
    pub due_at: Option<Timestamp>,
}

/// A row from the `rackets` inventory table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Racket {
    pub id: DbId,
    pub name: String,
    pub stock: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
