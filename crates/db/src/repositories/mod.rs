//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Methods that guard a mutation
//! on prior state return an outcome enum instead of an error for the
//! expected race cases — callers branch, they don't catch.

pub mod application_repo;
pub mod cancel_request_repo;
pub mod history_repo;
pub mod idempotency_repo;
pub mod lease_repo;
pub mod order_repo;
pub mod pass_repo;
pub mod points_repo;
pub mod rental_repo;
pub mod slot_repo;
pub mod transition_repo;

pub use application_repo::ApplicationRepo;
pub use cancel_request_repo::{CancelOutcome, CancelRequestRepo};
pub use history_repo::HistoryRepo;
pub use idempotency_repo::{IdempotencyClaim, IdempotencyRepo};
pub use lease_repo::LeaseRepo;
pub use order_repo::OrderRepo;
pub use pass_repo::{ConsumeOutcome, IssueOutcome, PassRepo, RevertOutcome};
pub use points_repo::{GuardedPostOutcome, HoldFlipOutcome, PointsRepo, PostOutcome};
pub use rental_repo::{RentalRepo, StockCreditOutcome, StockDebitOutcome};
pub use slot_repo::SlotRepo;
pub use transition_repo::{TransitionOutcome, TransitionRepo};
