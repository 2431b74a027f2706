//! Cancellation-request protocol rules.
//!
//! Every order, rental, and application carries an embedded cancel-request
//! sub-state that moves none → requested → {approved, rejected}, with an
//! explicit withdrawal (requested → none) reserved for the original
//! requester. The sub-state never touches the main lifecycle status; only
//! an approval chains into the main transition graph, and that chaining
//! happens in the flow layer.
//!
//! Ids duplicated from the `db` crate's `CancelRequestStatus` enum (this
//! crate has zero internal deps); seed order is pinned by the db tests.

pub const NONE: i16 = 1;
pub const REQUESTED: i16 = 2;
pub const APPROVED: i16 = 3;
pub const REJECTED: i16 = 4;

/// A new request is allowed from `none` and from `rejected` (a customer may
/// re-request after an admin rejection), never while one is pending.
pub fn can_request(from: i16) -> bool {
    from == NONE || from == REJECTED
}

/// Approve and reject are only allowed while a request is pending.
pub fn can_process(from: i16) -> bool {
    from == REQUESTED
}

/// Withdrawal is only allowed while a request is pending. The requester
/// check is enforced by the repository's guarded update, not here.
pub fn can_withdraw(from: i16) -> bool {
    from == REQUESTED
}

/// Human-readable name for a cancel-request status id.
pub fn status_name(id: i16) -> &'static str {
    match id {
        NONE => "none",
        REQUESTED => "requested",
        APPROVED => "approved",
        REJECTED => "rejected",
        _ => "unknown",
    }
}
