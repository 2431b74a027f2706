//! The courtside flow layer.
//!
//! Composes the repository primitives, the core policy tables, and the
//! event bus into the customer/admin operations: create and pay orders,
//! dispatch rentals, book and work stringing applications, run the
//! cancellation workflow, and move points.
//!
//! The layering rule: every status change is one guarded conditional
//! update in `courtside-db`; effects (pass issuance, stock movement,
//! points postings) run only after an `Applied` outcome and are themselves
//! idempotent, so a crash between commit and effect is recovered by simply
//! re-running the effect. Events are published after effects,
//! fire-and-forget.

pub mod applications;
pub mod cancellation;
pub mod error;
pub mod orders;
pub mod points;
pub mod rentals;
pub mod slots;

pub use error::{FlowError, FlowResult};
