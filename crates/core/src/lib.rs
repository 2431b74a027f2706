//! Pure domain logic for the courtside storefront engine.
//!
//! This crate has zero internal dependencies so its policy tables and
//! validators can be used by the repository layer, the flow layer, and the
//! maintenance worker alike without pulling in sqlx.

pub mod booking;
pub mod cancellation;
pub mod error;
pub mod lifecycle;
pub mod points;
pub mod types;
