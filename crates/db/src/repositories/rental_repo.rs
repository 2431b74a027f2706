//! Repository for the `rentals` and `rackets` tables.
//!
//! Lifecycle changes go through [`crate::repositories::TransitionRepo`].
//! The inventory effect (debit a racket on dispatch, credit on return) is
//! made idempotent by the rental's `stock_debited` flag: the flip is the
//! guard, the stock arithmetic only runs after winning it.

use courtside_core::types::DbId;
use sqlx::PgPool;

use crate::models::rental::{CreateRental, Racket, Rental};

/// Column list for `rentals` queries.
const COLUMNS: &str = "\
    id, user_id, racket_id, daily_rate, due_at, status_id, stock_debited, \
    cancel_status_id, cancel_reason_code, cancel_reason_text, \
    cancel_requested_by, cancel_requested_at, cancel_processed_at, \
    created_at, updated_at";

/// Column list for `rackets` queries.
const RACKET_COLUMNS: &str = "id, name, stock, created_at, updated_at";

/// Result of the idempotent stock debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDebitOutcome {
    /// This call won the flag flip and decremented stock.
    Debited,
    /// A previous call already debited for this rental; no-op success.
    AlreadyDebited,
    /// The racket has zero stock; nothing was changed.
    OutOfStock,
}

/// Result of the idempotent stock credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockCreditOutcome {
    /// This call won the flag flip and incremented stock.
    Credited,
    /// The rental never debited stock (or was already credited); no-op.
    AlreadyCredited,
}

/// Provides CRUD operations for rentals and racket inventory.
pub struct RentalRepo;

impl RentalRepo {
    /// Create a new rental in `created` status.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateRental,
    ) -> Result<Rental, sqlx::Error> {
        let query = format!(
            "INSERT INTO rentals (user_id, racket_id, daily_rate, due_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Rental>(&query)
            .bind(user_id)
            .bind(input.racket_id)
            .bind(input.daily_rate)
            .bind(input.due_at)
            .fetch_one(pool)
            .await
    }

    /// Find a rental by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Rental>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rentals WHERE id = $1");
        sqlx::query_as::<_, Rental>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Idempotently debit one unit of racket stock for a dispatched rental.
    pub async fn debit_stock(
        pool: &PgPool,
        rental_id: DbId,
    ) -> Result<StockDebitOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE rentals SET stock_debited = true, updated_at = NOW() \
             WHERE id = $1 AND stock_debited = false",
        )
        .bind(rental_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(StockDebitOutcome::AlreadyDebited);
        }

        let decremented = sqlx::query(
            "UPDATE rackets SET stock = stock - 1, updated_at = NOW() \
             WHERE id = (SELECT racket_id FROM rentals WHERE id = $1) \
               AND stock > 0",
        )
        .bind(rental_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(StockDebitOutcome::OutOfStock);
        }

        tx.commit().await?;
        Ok(StockDebitOutcome::Debited)
    }

    /// Idempotently return one unit of racket stock for a returned rental.
    pub async fn credit_stock(
        pool: &PgPool,
        rental_id: DbId,
    ) -> Result<StockCreditOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE rentals SET stock_debited = false, updated_at = NOW() \
             WHERE id = $1 AND stock_debited = true",
        )
        .bind(rental_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(StockCreditOutcome::AlreadyCredited);
        }

        sqlx::query(
            "UPDATE rackets SET stock = stock + 1, updated_at = NOW() \
             WHERE id = (SELECT racket_id FROM rentals WHERE id = $1)",
        )
        .bind(rental_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(StockCreditOutcome::Credited)
    }

    // ── Rackets ─────────────────────────────────────────────────────

    /// Create a racket inventory row.
    pub async fn create_racket(
        pool: &PgPool,
        name: &str,
        stock: i32,
    ) -> Result<Racket, sqlx::Error> {
        let query = format!(
            "INSERT INTO rackets (name, stock) VALUES ($1, $2) RETURNING {RACKET_COLUMNS}"
        );
        sqlx::query_as::<_, Racket>(&query)
            .bind(name)
            .bind(stock)
            .fetch_one(pool)
            .await
    }

    /// Find a racket by its ID.
    pub async fn find_racket(pool: &PgPool, id: DbId) -> Result<Option<Racket>, sqlx::Error> {
        let query = format!("SELECT {RACKET_COLUMNS} FROM rackets WHERE id = $1");
        sqlx::query_as::<_, Racket>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
