//! Booking slot configuration row and update DTO.

use chrono::{NaiveDate, NaiveTime};
use courtside_core::booking::SlotConfig;
use courtside_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The single `booking_slot_config` row (id = 1), mutated only by admin
/// settings and read by the slot engine on every booking attempt.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookingSlotConfigRow {
    pub id: DbId,
    pub capacity: i32,
    /// 0 = Sunday .. 6 = Saturday.
    pub business_days: Vec<i16>,
    pub holidays: Vec<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub interval_minutes: i32,
    pub min_lead_hours: i32,
    pub max_advance_days: i32,
    pub updated_at: Timestamp,
}

impl BookingSlotConfigRow {
    /// Convert to the pure policy struct the validators consume.
    pub fn to_policy(&self) -> SlotConfig {
        SlotConfig {
            capacity: self.capacity,
            business_days: self.business_days.clone(),
            holidays: self.holidays.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            interval_minutes: self.interval_minutes,
            min_lead_hours: i64::from(self.min_lead_hours),
            max_advance_days: i64::from(self.max_advance_days),
        }
    }
}

/// Partial update DTO for the admin settings screen.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSlotConfig {
    pub capacity: Option<i32>,
    pub business_days: Option<Vec<i16>>,
    pub holidays: Option<Vec<NaiveDate>>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub interval_minutes: Option<i32>,
    pub min_lead_hours: Option<i32>,
    pub max_advance_days: Option<i32>,
}
