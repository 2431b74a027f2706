//! Repository for the `applications` table.
//!
//! Draft uniqueness per linked order/rental is enforced by partial unique
//! indexes (`uq_applications_one_draft_per_order` / `_per_rental`); a
//! second draft insert surfaces as a 23505 the caller classifies with
//! [`crate::is_unique_violation`]. Lifecycle changes go through
//! [`crate::repositories::TransitionRepo`].

use chrono::{DateTime, Utc};
use courtside_core::lifecycle::application as lifecycle;
use courtside_core::types::DbId;
use sqlx::PgPool;

use crate::models::application::{Application, CreateApplication};

/// Column list for `applications` queries.
const COLUMNS: &str = "\
    id, user_id, order_id, rental_id, racket_model, string_name, \
    tension_lbs, preferred_date, preferred_time, use_pass, used_pass_id, \
    status_id, cancel_status_id, cancel_reason_code, cancel_reason_text, \
    cancel_requested_by, cancel_requested_at, cancel_processed_at, \
    created_at, updated_at";

/// Provides CRUD operations for stringing applications.
pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Create a new draft application.
    ///
    /// Fails with a `uq_`-prefixed unique violation when a draft already
    /// exists for the same order or rental link.
    pub async fn create_draft(
        pool: &PgPool,
        input: &CreateApplication,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "INSERT INTO applications \
                 (user_id, order_id, rental_id, racket_model, string_name, \
                  tension_lbs, preferred_date, preferred_time, use_pass) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(input.user_id)
            .bind(input.order_id)
            .bind(input.rental_id)
            .bind(&input.racket_model)
            .bind(&input.string_name)
            .bind(input.tension_lbs)
            .bind(input.preferred_date)
            .bind(input.preferred_time)
            .bind(input.use_pass)
            .fetch_one(pool)
            .await
    }

    /// Find an application by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record which pass a started application consumed.
    ///
    /// Guarded on `used_pass_id IS NULL` so a retried effect cannot point
    /// the application at a second pass.
    pub async fn set_used_pass(
        pool: &PgPool,
        application_id: DbId,
        pass_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applications SET used_pass_id = $2, updated_at = NOW() \
             WHERE id = $1 AND used_pass_id IS NULL",
        )
        .bind(application_id)
        .bind(pass_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Draft applications created before `cutoff`, oldest first.
    ///
    /// Feeds the maintenance sweep; the sweep cancels them through the
    /// normal guarded transition, so a draft the customer submits while the
    /// sweep is running simply wins the race.
    pub async fn list_stale_drafts(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications \
             WHERE status_id = $1 AND created_at < $2 \
             ORDER BY created_at \
             LIMIT $3"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(lifecycle::DRAFT)
            .bind(cutoff)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
