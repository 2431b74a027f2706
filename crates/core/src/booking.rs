//! Booking-window policy evaluation for stringing slots.
//!
//! All checks here are pure: the slot configuration and the current time
//! are parameters, so the flow layer decides where they come from and tests
//! control both deterministically. Capacity itself is checked by the flow
//! layer against a fresh booked-count snapshot at booking time — the count
//! is a snapshot, not a reservation (soft capacity).

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::types::Timestamp;

/// Slot policy as configured by the admin settings screen.
///
/// Loaded from the `booking_slot_config` row and injected into the
/// validators — the engine never reads policy from ambient state.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    /// Bookable applications per calendar day.
    pub capacity: i32,
    /// Weekdays the shop takes bookings, 0 = Sunday .. 6 = Saturday.
    pub business_days: Vec<i16>,
    /// Specific closed dates, checked after the weekday rule.
    pub holidays: Vec<NaiveDate>,
    /// First bookable time of day.
    pub start_time: NaiveTime,
    /// End of the bookable window (exclusive).
    pub end_time: NaiveTime,
    /// Slot grid granularity; requested times must sit on the grid.
    pub interval_minutes: i32,
    /// Minimum lead time between "now" and the requested slot.
    pub min_lead_hours: i64,
    /// Furthest-ahead calendar day that may be booked.
    pub max_advance_days: i64,
}

/// Derived per-day availability. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SlotSummary {
    pub date: NaiveDate,
    pub capacity: i32,
    pub booked: i64,
    pub remaining: i64,
}

/// Compute the availability summary for one day given a booked count.
///
/// `remaining` is clamped at zero: an oversold day (possible under the soft
/// capacity policy) reports zero, never a negative number.
pub fn day_summary(cfg: &SlotConfig, date: NaiveDate, booked: i64) -> SlotSummary {
    SlotSummary {
        date,
        capacity: cfg.capacity,
        booked,
        remaining: (i64::from(cfg.capacity) - booked).max(0),
    }
}

/// Why a requested date/time was rejected by the window policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingRejection {
    #[error("the shop is closed on that weekday")]
    ClosedDay,

    #[error("the shop is closed on that date")]
    Holiday,

    #[error("bookings require at least {required_hours} hours of lead time")]
    TooSoon { required_hours: i64 },

    #[error("bookings are only accepted up to {max_days} days ahead")]
    TooFarAhead { max_days: i64 },

    #[error("the requested time is outside opening hours")]
    OutsideHours,

    #[error("the requested time is not on the {interval_minutes}-minute slot grid")]
    MisalignedTime { interval_minutes: i32 },
}

/// Validate a requested slot against the configured booking window.
///
/// Checks, in order: business weekday, holiday calendar, advance-booking
/// horizon, lead-time cutoff, opening hours, and slot-grid alignment.
/// Capacity is deliberately not checked here — see the module docs.
pub fn validate_window(
    cfg: &SlotConfig,
    date: NaiveDate,
    time: NaiveTime,
    now: Timestamp,
) -> Result<(), BookingRejection> {
    let weekday = date.weekday().num_days_from_sunday() as i16;
    if !cfg.business_days.contains(&weekday) {
        return Err(BookingRejection::ClosedDay);
    }

    if cfg.holidays.contains(&date) {
        return Err(BookingRejection::Holiday);
    }

    let today = now.date_naive();
    if date > today + chrono::Duration::days(cfg.max_advance_days) {
        return Err(BookingRejection::TooFarAhead {
            max_days: cfg.max_advance_days,
        });
    }

    let requested = date.and_time(time);
    if requested < now.naive_utc() + chrono::Duration::hours(cfg.min_lead_hours) {
        return Err(BookingRejection::TooSoon {
            required_hours: cfg.min_lead_hours,
        });
    }

    if time < cfg.start_time || time >= cfg.end_time {
        return Err(BookingRejection::OutsideHours);
    }

    let minutes_from_open =
        i64::from(time.num_seconds_from_midnight() / 60) - i64::from(cfg.start_time.num_seconds_from_midnight() / 60);
    if cfg.interval_minutes > 0 && minutes_from_open % i64::from(cfg.interval_minutes) != 0 {
        return Err(BookingRejection::MisalignedTime {
            interval_minutes: cfg.interval_minutes,
        });
    }

    Ok(())
}
