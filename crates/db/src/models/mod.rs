//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts, with validator derives where
//!   field-shape checks apply
//!
//! Outcome enums for the guarded primitives live next to their
//! repositories.

pub mod application;
pub mod history;
pub mod lease;
pub mod order;
pub mod points;
pub mod rental;
pub mod service_pass;
pub mod slot_config;
pub mod status;
