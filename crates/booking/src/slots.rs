//! Slot engine glue: availability summaries and booking-time validation.

use chrono::NaiveDate;
use chrono::NaiveTime;
use courtside_core::booking::{self, SlotSummary};
use courtside_core::error::CoreError;
use courtside_core::types::Timestamp;
use courtside_db::repositories::SlotRepo;
use sqlx::PgPool;

use crate::error::FlowResult;

/// Availability summary for one day. Side-effect free.
pub async fn summarize(pool: &PgPool, date: NaiveDate) -> FlowResult<SlotSummary> {
    let config = SlotRepo::get_config(pool).await?.to_policy();
    let booked = SlotRepo::count_booked(pool, date).await?;
    Ok(booking::day_summary(&config, date, booked))
}

/// Validate a requested slot at booking time.
///
/// Re-checks capacity against a fresh booked count rather than trusting
/// whatever the UI rendered — this closes most of the window between two
/// customers looking at the same "available" slot. What remains is the
/// accepted soft-capacity window: the count is a snapshot, not a
/// reservation.
pub async fn validate_booking(
    pool: &PgPool,
    date: NaiveDate,
    time: NaiveTime,
    now: Timestamp,
) -> FlowResult<()> {
    let config = SlotRepo::get_config(pool).await?.to_policy();

    booking::validate_window(&config, date, time, now)
        .map_err(|rejection| CoreError::Validation(rejection.to_string()))?;

    let booked = SlotRepo::count_booked(pool, date).await?;
    let summary = booking::day_summary(&config, date, booked);
    if summary.remaining == 0 {
        return Err(CoreError::CapacityExceeded(format!(
            "no remaining stringing slots on {date}"
        ))
        .into());
    }

    Ok(())
}
