//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table. The same ids are
//! duplicated as plain constants in `courtside_core::lifecycle`,
//! `cancellation`, and `points` — the tests at the bottom pin the two
//! sides together so they cannot drift.

use courtside_core::error::CoreError;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Parse a persisted status ID, rejecting unknown values rather
            /// than silently defaulting.
            pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
                match id {
                    $( $val => Ok(Self::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        concat!("Unknown ", stringify!($name), " id: {}"),
                        other
                    ))),
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Purchase order lifecycle status.
    OrderStatus {
        Pending = 1,
        Paid = 2,
        Shipped = 3,
        Delivered = 4,
        Confirmed = 5,
        Canceled = 6,
        Refunded = 7,
    }
}

define_status_enum! {
    /// Racket rental lifecycle status.
    RentalStatus {
        Created = 1,
        Paid = 2,
        Out = 3,
        Returned = 4,
        Canceled = 5,
    }
}

define_status_enum! {
    /// Stringing application lifecycle status.
    ApplicationStatus {
        Draft = 1,
        Submitted = 2,
        Reviewing = 3,
        Accepted = 4,
        InProgress = 5,
        Completed = 6,
        Canceled = 7,
    }
}

define_status_enum! {
    /// Prepaid stringing pass status.
    PassStatus {
        Inactive = 1,
        Active = 2,
        Expired = 3,
        Canceled = 4,
    }
}

define_status_enum! {
    /// Embedded cancel-request sub-state.
    CancelRequestStatus {
        None = 1,
        Requested = 2,
        Approved = 3,
        Rejected = 4,
    }
}

define_status_enum! {
    /// Points transaction settlement status.
    PointsTxStatus {
        Confirmed = 1,
        Held = 2,
        Canceled = 3,
    }
}

define_status_enum! {
    /// Points transaction kind.
    PointsTxType {
        Accrual = 1,
        Spend = 2,
        AdminAdjust = 3,
        Hold = 4,
        Reversal = 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_core::{cancellation, lifecycle, points};

    #[test]
    fn order_status_ids_match_seed_data() {
        assert_eq!(OrderStatus::Pending.id(), 1);
        assert_eq!(OrderStatus::Paid.id(), 2);
        assert_eq!(OrderStatus::Shipped.id(), 3);
        assert_eq!(OrderStatus::Delivered.id(), 4);
        assert_eq!(OrderStatus::Confirmed.id(), 5);
        assert_eq!(OrderStatus::Canceled.id(), 6);
        assert_eq!(OrderStatus::Refunded.id(), 7);
    }

    #[test]
    fn order_status_ids_match_core_lifecycle() {
        assert_eq!(OrderStatus::Pending.id(), lifecycle::order::PENDING);
        assert_eq!(OrderStatus::Paid.id(), lifecycle::order::PAID);
        assert_eq!(OrderStatus::Shipped.id(), lifecycle::order::SHIPPED);
        assert_eq!(OrderStatus::Delivered.id(), lifecycle::order::DELIVERED);
        assert_eq!(OrderStatus::Confirmed.id(), lifecycle::order::CONFIRMED);
        assert_eq!(OrderStatus::Canceled.id(), lifecycle::order::CANCELED);
        assert_eq!(OrderStatus::Refunded.id(), lifecycle::order::REFUNDED);
    }

    #[test]
    fn rental_status_ids_match_core_lifecycle() {
        assert_eq!(RentalStatus::Created.id(), lifecycle::rental::CREATED);
        assert_eq!(RentalStatus::Paid.id(), lifecycle::rental::PAID);
        assert_eq!(RentalStatus::Out.id(), lifecycle::rental::OUT);
        assert_eq!(RentalStatus::Returned.id(), lifecycle::rental::RETURNED);
        assert_eq!(RentalStatus::Canceled.id(), lifecycle::rental::CANCELED);
    }

    #[test]
    fn application_status_ids_match_core_lifecycle() {
        assert_eq!(ApplicationStatus::Draft.id(), lifecycle::application::DRAFT);
        assert_eq!(
            ApplicationStatus::Submitted.id(),
            lifecycle::application::SUBMITTED
        );
        assert_eq!(
            ApplicationStatus::Reviewing.id(),
            lifecycle::application::REVIEWING
        );
        assert_eq!(
            ApplicationStatus::Accepted.id(),
            lifecycle::application::ACCEPTED
        );
        assert_eq!(
            ApplicationStatus::InProgress.id(),
            lifecycle::application::IN_PROGRESS
        );
        assert_eq!(
            ApplicationStatus::Completed.id(),
            lifecycle::application::COMPLETED
        );
        assert_eq!(
            ApplicationStatus::Canceled.id(),
            lifecycle::application::CANCELED
        );
    }

    #[test]
    fn cancel_request_ids_match_core() {
        assert_eq!(CancelRequestStatus::None.id(), cancellation::NONE);
        assert_eq!(CancelRequestStatus::Requested.id(), cancellation::REQUESTED);
        assert_eq!(CancelRequestStatus::Approved.id(), cancellation::APPROVED);
        assert_eq!(CancelRequestStatus::Rejected.id(), cancellation::REJECTED);
    }

    #[test]
    fn points_status_ids_match_core() {
        assert_eq!(PointsTxStatus::Confirmed.id(), points::STATUS_CONFIRMED);
        assert_eq!(PointsTxStatus::Held.id(), points::STATUS_HELD);
        assert_eq!(PointsTxStatus::Canceled.id(), points::STATUS_CANCELED);
    }

    #[test]
    fn from_id_round_trips() {
        assert_eq!(PassStatus::from_id(2).unwrap(), PassStatus::Active);
        assert_eq!(
            PointsTxType::from_id(5).unwrap(),
            PointsTxType::Reversal
        );
    }

    #[test]
    fn from_id_rejects_unknown() {
        assert!(OrderStatus::from_id(0).is_err());
        assert!(OrderStatus::from_id(99).is_err());
        assert!(PassStatus::from_id(5).is_err());
    }

    #[test]
    fn status_into_status_id() {
        let id: StatusId = RentalStatus::Out.into();
        assert_eq!(id, 3);
    }
}
