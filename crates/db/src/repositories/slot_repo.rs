//! Repository for the `booking_slot_config` row and the booked-count query.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::slot_config::{BookingSlotConfigRow, UpdateSlotConfig};
use crate::models::status::ApplicationStatus;

/// Column list for `booking_slot_config` queries.
const COLUMNS: &str = "\
    id, capacity, business_days, holidays, start_time, end_time, \
    interval_minutes, min_lead_hours, max_advance_days, updated_at";

/// The config table holds exactly one row.
const CONFIG_ROW_ID: i64 = 1;

/// Provides the slot configuration and per-day booked counts.
pub struct SlotRepo;

impl SlotRepo {
    /// Load the slot configuration.
    pub async fn get_config(pool: &PgPool) -> Result<BookingSlotConfigRow, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM booking_slot_config WHERE id = $1");
        sqlx::query_as::<_, BookingSlotConfigRow>(&query)
            .bind(CONFIG_ROW_ID)
            .fetch_one(pool)
            .await
    }

    /// Partially update the slot configuration (admin settings).
    pub async fn update_config(
        pool: &PgPool,
        input: &UpdateSlotConfig,
    ) -> Result<BookingSlotConfigRow, sqlx::Error> {
        let query = format!(
            "UPDATE booking_slot_config SET \
                 capacity = COALESCE($2, capacity), \
                 business_days = COALESCE($3, business_days), \
                 holidays = COALESCE($4, holidays), \
                 start_time = COALESCE($5, start_time), \
                 end_time = COALESCE($6, end_time), \
                 interval_minutes = COALESCE($7, interval_minutes), \
                 min_lead_hours = COALESCE($8, min_lead_hours), \
                 max_advance_days = COALESCE($9, max_advance_days), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BookingSlotConfigRow>(&query)
            .bind(CONFIG_ROW_ID)
            .bind(input.capacity)
            .bind(input.business_days.as_deref())
            .bind(input.holidays.as_deref())
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.interval_minutes)
            .bind(input.min_lead_hours)
            .bind(input.max_advance_days)
            .fetch_one(pool)
            .await
    }

    /// Count the applications occupying slots on `date`.
    ///
    /// Only submitted-through-in-progress applications hold a slot: a draft
    /// is not a booking yet, and completed/canceled ones have let go of
    /// theirs. The count is a read-consistent snapshot, not a reservation.
    pub async fn count_booked(pool: &PgPool, date: NaiveDate) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applications \
             WHERE preferred_date = $1 AND status_id IN ($2, $3, $4, $5)",
        )
        .bind(date)
        .bind(ApplicationStatus::Submitted.id())
        .bind(ApplicationStatus::Reviewing.id())
        .bind(ApplicationStatus::Accepted.id())
        .bind(ApplicationStatus::InProgress.id())
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
