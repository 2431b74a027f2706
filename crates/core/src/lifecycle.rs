//! Entity lifecycle state machines.
//!
//! One transition graph per storefront entity kind. Every status change in
//! the system goes through the repository layer's conditional update, and
//! that update consults these graphs first: a pair the graph does not list
//! is rejected before any SQL runs.
//!
//! Status ids are intentionally duplicated from the `db` crate's status
//! enums because this crate must have zero internal deps. They match the
//! 1-based seed order of the corresponding `*_statuses` lookup tables; the
//! db crate's tests pin the two sides together.

/// The three entity kinds driven by the shared transition primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Order,
    Rental,
    Application,
}

impl EntityKind {
    /// Stable string form used in history rows and event envelopes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Rental => "rental",
            Self::Application => "application",
        }
    }
}

/// Purchase order lifecycle: pending → paid → shipped → delivered →
/// confirmed, with canceled reachable from pending and refunded from paid.
pub mod order {
    pub const PENDING: i16 = 1;
    pub const PAID: i16 = 2;
    pub const SHIPPED: i16 = 3;
    pub const DELIVERED: i16 = 4;
    pub const CONFIRMED: i16 = 5;
    pub const CANCELED: i16 = 6;
    pub const REFUNDED: i16 = 7;

    /// Returns the set of valid target status ids reachable from `from`.
    pub fn valid_transitions(from: i16) -> &'static [i16] {
        match from {
            PENDING => &[PAID, CANCELED],
            PAID => &[SHIPPED, REFUNDED],
            SHIPPED => &[DELIVERED],
            DELIVERED => &[CONFIRMED],
            // Terminal: confirmed, canceled, refunded
            CONFIRMED | CANCELED | REFUNDED => &[],
            _ => &[],
        }
    }

    /// Human-readable name for a status id (for error messages).
    pub fn status_name(id: i16) -> &'static str {
        match id {
            PENDING => "pending",
            PAID => "paid",
            SHIPPED => "shipped",
            DELIVERED => "delivered",
            CONFIRMED => "confirmed",
            CANCELED => "canceled",
            REFUNDED => "refunded",
            _ => "unknown",
        }
    }
}

/// Racket rental lifecycle: created → paid → out → returned, with canceled
/// reachable from created and paid only — once the racket is out the rental
/// must come back through `returned`.
pub mod rental {
    pub const CREATED: i16 = 1;
    pub const PAID: i16 = 2;
    pub const OUT: i16 = 3;
    pub const RETURNED: i16 = 4;
    pub const CANCELED: i16 = 5;

    /// Returns the set of valid target status ids reachable from `from`.
    pub fn valid_transitions(from: i16) -> &'static [i16] {
        match from {
            CREATED => &[PAID, CANCELED],
            PAID => &[OUT, CANCELED],
            OUT => &[RETURNED],
            RETURNED | CANCELED => &[],
            _ => &[],
        }
    }

    /// Human-readable name for a status id (for error messages).
    pub fn status_name(id: i16) -> &'static str {
        match id {
            CREATED => "created",
            PAID => "paid",
            OUT => "out",
            RETURNED => "returned",
            CANCELED => "canceled",
            _ => "unknown",
        }
    }
}

/// Stringing application lifecycle. Canceled is reachable from every
/// non-terminal status; canceling an in-progress job returns the consumed
/// pass session through the cancellation workflow's revert effect.
pub mod application {
    pub const DRAFT: i16 = 1;
    pub const SUBMITTED: i16 = 2;
    pub const REVIEWING: i16 = 3;
    pub const ACCEPTED: i16 = 4;
    pub const IN_PROGRESS: i16 = 5;
    pub const COMPLETED: i16 = 6;
    pub const CANCELED: i16 = 7;

    /// Returns the set of valid target status ids reachable from `from`.
    pub fn valid_transitions(from: i16) -> &'static [i16] {
        match from {
            DRAFT => &[SUBMITTED, CANCELED],
            SUBMITTED => &[REVIEWING, CANCELED],
            REVIEWING => &[ACCEPTED, CANCELED],
            ACCEPTED => &[IN_PROGRESS, CANCELED],
            IN_PROGRESS => &[COMPLETED, CANCELED],
            COMPLETED | CANCELED => &[],
            _ => &[],
        }
    }

    /// Human-readable name for a status id (for error messages).
    pub fn status_name(id: i16) -> &'static str {
        match id {
            DRAFT => "draft",
            SUBMITTED => "submitted",
            REVIEWING => "reviewing",
            ACCEPTED => "accepted",
            IN_PROGRESS => "in_progress",
            COMPLETED => "completed",
            CANCELED => "canceled",
            _ => "unknown",
        }
    }
}

/// Returns the valid targets reachable from `from` for the given kind.
pub fn valid_transitions(kind: EntityKind, from: i16) -> &'static [i16] {
    match kind {
        EntityKind::Order => order::valid_transitions(from),
        EntityKind::Rental => rental::valid_transitions(from),
        EntityKind::Application => application::valid_transitions(from),
    }
}

/// Check whether a transition from `from` to `to` is valid for `kind`.
pub fn can_transition(kind: EntityKind, from: i16, to: i16) -> bool {
    valid_transitions(kind, from).contains(&to)
}

/// A status with no outgoing transitions is terminal.
pub fn is_terminal(kind: EntityKind, status: i16) -> bool {
    valid_transitions(kind, status).is_empty()
}

/// Human-readable status name for error messages and event types.
pub fn status_name(kind: EntityKind, status: i16) -> &'static str {
    match kind {
        EntityKind::Order => order::status_name(status),
        EntityKind::Rental => rental::status_name(status),
        EntityKind::Application => application::status_name(status),
    }
}

/// Validate a transition, returning a descriptive message for invalid ones.
pub fn validate_transition(kind: EntityKind, from: i16, to: i16) -> Result<(), String> {
    if can_transition(kind, from, to) {
        Ok(())
    } else {
        Err(format!(
            "Invalid {} transition: {} ({from}) -> {} ({to})",
            kind.as_str(),
            status_name(kind, from),
            status_name(kind, to),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Order graph
    // -----------------------------------------------------------------------

    #[test]
    fn order_pending_to_paid() {
        assert!(can_transition(EntityKind::Order, order::PENDING, order::PAID));
    }

    #[test]
    fn order_pending_to_canceled() {
        assert!(can_transition(EntityKind::Order, order::PENDING, order::CANCELED));
    }

    #[test]
    fn order_paid_to_refunded() {
        assert!(can_transition(EntityKind::Order, order::PAID, order::REFUNDED));
    }

    #[test]
    fn order_paid_to_canceled_invalid() {
        // A paid order is refunded, never canceled.
        assert!(!can_transition(EntityKind::Order, order::PAID, order::CANCELED));
    }

    #[test]
    fn order_shipped_to_delivered() {
        assert!(can_transition(EntityKind::Order, order::SHIPPED, order::DELIVERED));
    }

    #[test]
    fn order_shipped_not_cancelable() {
        assert!(!can_transition(EntityKind::Order, order::SHIPPED, order::CANCELED));
        assert!(!can_transition(EntityKind::Order, order::SHIPPED, order::REFUNDED));
    }

    #[test]
    fn order_delivered_to_confirmed() {
        assert!(can_transition(EntityKind::Order, order::DELIVERED, order::CONFIRMED));
    }

    #[test]
    fn order_pending_cannot_skip_to_shipped() {
        assert!(!can_transition(EntityKind::Order, order::PENDING, order::SHIPPED));
    }

    #[test]
    fn order_terminal_states() {
        assert!(is_terminal(EntityKind::Order, order::CONFIRMED));
        assert!(is_terminal(EntityKind::Order, order::CANCELED));
        assert!(is_terminal(EntityKind::Order, order::REFUNDED));
        assert!(!is_terminal(EntityKind::Order, order::PAID));
    }

    // -----------------------------------------------------------------------
    // Rental graph
    // -----------------------------------------------------------------------

    #[test]
    fn rental_created_to_paid() {
        assert!(can_transition(EntityKind::Rental, rental::CREATED, rental::PAID));
    }

    #[test]
    fn rental_paid_to_out() {
        assert!(can_transition(EntityKind::Rental, rental::PAID, rental::OUT));
    }

    #[test]
    fn rental_out_to_returned() {
        assert!(can_transition(EntityKind::Rental, rental::OUT, rental::RETURNED));
    }

    #[test]
    fn rental_canceled_from_created_and_paid_only() {
        assert!(can_transition(EntityKind::Rental, rental::CREATED, rental::CANCELED));
        assert!(can_transition(EntityKind::Rental, rental::PAID, rental::CANCELED));
        assert!(!can_transition(EntityKind::Rental, rental::OUT, rental::CANCELED));
        assert!(!can_transition(EntityKind::Rental, rental::RETURNED, rental::CANCELED));
    }

    #[test]
    fn rental_terminal_states() {
        assert!(is_terminal(EntityKind::Rental, rental::RETURNED));
        assert!(is_terminal(EntityKind::Rental, rental::CANCELED));
    }

    // -----------------------------------------------------------------------
    // Application graph
    // -----------------------------------------------------------------------

    #[test]
    fn application_happy_path() {
        use application::*;
        assert!(can_transition(EntityKind::Application, DRAFT, SUBMITTED));
        assert!(can_transition(EntityKind::Application, SUBMITTED, REVIEWING));
        assert!(can_transition(EntityKind::Application, REVIEWING, ACCEPTED));
        assert!(can_transition(EntityKind::Application, ACCEPTED, IN_PROGRESS));
        assert!(can_transition(EntityKind::Application, IN_PROGRESS, COMPLETED));
    }

    #[test]
    fn application_cancelable_from_every_open_status() {
        use application::*;
        assert!(can_transition(EntityKind::Application, DRAFT, CANCELED));
        assert!(can_transition(EntityKind::Application, SUBMITTED, CANCELED));
        assert!(can_transition(EntityKind::Application, REVIEWING, CANCELED));
        assert!(can_transition(EntityKind::Application, ACCEPTED, CANCELED));
        assert!(can_transition(EntityKind::Application, IN_PROGRESS, CANCELED));
    }

    #[test]
    fn application_completed_not_cancelable() {
        assert!(!can_transition(
            EntityKind::Application,
            application::COMPLETED,
            application::CANCELED
        ));
    }

    #[test]
    fn application_cannot_skip_review() {
        assert!(!can_transition(
            EntityKind::Application,
            application::SUBMITTED,
            application::ACCEPTED
        ));
    }

    #[test]
    fn application_terminal_states() {
        assert!(is_terminal(EntityKind::Application, application::COMPLETED));
        assert!(is_terminal(EntityKind::Application, application::CANCELED));
        assert!(!is_terminal(EntityKind::Application, application::DRAFT));
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    #[test]
    fn validate_transition_ok() {
        assert!(validate_transition(EntityKind::Rental, rental::CREATED, rental::PAID).is_ok());
    }

    #[test]
    fn validate_transition_err_is_descriptive() {
        let err =
            validate_transition(EntityKind::Rental, rental::RETURNED, rental::OUT).unwrap_err();
        assert!(err.contains("returned"));
        assert!(err.contains("out"));
        assert!(err.contains("rental"));
    }

    #[test]
    fn unknown_status_has_no_transitions() {
        assert!(valid_transitions(EntityKind::Order, 99).is_empty());
        assert!(valid_transitions(EntityKind::Rental, 0).is_empty());
        assert!(valid_transitions(EntityKind::Application, -1).is_empty());
    }

    #[test]
    fn entity_kind_strings() {
        assert_eq!(EntityKind::Order.as_str(), "order");
        assert_eq!(EntityKind::Rental.as_str(), "rental");
        assert_eq!(EntityKind::Application.as_str(), "application");
    }
}
