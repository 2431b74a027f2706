//! Points balance arithmetic.
//!
//! The points ledger is append-only: a user's displayed balance is always
//! derived from the transaction log, never stored. This module holds the
//! derivation so the db crate's aggregate query and the tests agree on one
//! definition.
//!
//! Status ids duplicated from the `db` crate's `PointsTxStatus` enum (this
//! crate has zero internal deps); seed order is pinned by the db tests.

pub const STATUS_CONFIRMED: i16 = 1;
pub const STATUS_HELD: i16 = 2;
pub const STATUS_CANCELED: i16 = 3;

/// A user's derived points position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BalanceBreakdown {
    /// Sum of confirmed transaction amounts.
    pub balance: i64,
    /// Points reserved by unreleased holds (holds are negative rows).
    pub debt: i64,
    /// What the user can actually spend right now.
    pub available: i64,
}

impl BalanceBreakdown {
    /// Build from the two aggregate sums the ledger query produces.
    ///
    /// `held_total` is the signed sum of `held` rows; holds are stored as
    /// negative amounts, so debt is its negation (clamped at zero in case
    /// of a manually corrected ledger).
    pub fn from_sums(confirmed_total: i64, held_total: i64) -> Self {
        let debt = (-held_total).max(0);
        Self {
            balance: confirmed_total,
            debt,
            available: (confirmed_total - debt).max(0),
        }
    }
}

/// Derive the breakdown from raw (amount, status_id) rows.
///
/// Canceled rows never count toward anything.
pub fn summarize(rows: &[(i64, i16)]) -> BalanceBreakdown {
    let mut confirmed = 0i64;
    let mut held = 0i64;
    for &(amount, status) in rows {
        match status {
            STATUS_CONFIRMED => confirmed += amount,
            STATUS_HELD => held += amount,
            _ => {}
        }
    }
    BalanceBreakdown::from_sums(confirmed, held)
}

/// Whether a new hold or spend of `amount` points fits the available
/// balance. Amounts are always positive at this level.
pub fn can_debit(breakdown: &BalanceBreakdown, amount: i64) -> bool {
    amount > 0 && breakdown.available >= amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ledger() {
        let b = summarize(&[]);
        assert_eq!(b.balance, 0);
        assert_eq!(b.debt, 0);
        assert_eq!(b.available, 0);
    }

    #[test]
    fn confirmed_rows_sum_to_balance() {
        let b = summarize(&[(500, STATUS_CONFIRMED), (-120, STATUS_CONFIRMED)]);
        assert_eq!(b.balance, 380);
        assert_eq!(b.available, 380);
    }

    #[test]
    fn holds_create_debt() {
        let b = summarize(&[(500, STATUS_CONFIRMED), (-200, STATUS_HELD)]);
        assert_eq!(b.balance, 500);
        assert_eq!(b.debt, 200);
        assert_eq!(b.available, 300);
    }

    #[test]
    fn canceled_rows_ignored() {
        let b = summarize(&[
            (500, STATUS_CONFIRMED),
            (-200, STATUS_CANCELED),
            (-100, STATUS_HELD),
        ]);
        assert_eq!(b.balance, 500);
        assert_eq!(b.debt, 100);
        assert_eq!(b.available, 400);
    }

    #[test]
    fn available_clamped_at_zero() {
        let b = summarize(&[(100, STATUS_CONFIRMED), (-300, STATUS_HELD)]);
        assert_eq!(b.debt, 300);
        assert_eq!(b.available, 0);
    }

    #[test]
    fn can_debit_respects_available() {
        let b = summarize(&[(500, STATUS_CONFIRMED), (-200, STATUS_HELD)]);
        assert!(can_debit(&b, 300));
        assert!(!can_debit(&b, 301));
    }

    #[test]
    fn can_debit_rejects_non_positive() {
        let b = summarize(&[(500, STATUS_CONFIRMED)]);
        assert!(!can_debit(&b, 0));
        assert!(!can_debit(&b, -10));
    }
}
