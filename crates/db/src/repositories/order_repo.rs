//! Repository for the `orders` table.
//!
//! Status changes go through [`crate::repositories::TransitionRepo`]; this
//! repo only covers creation and reads.

use courtside_core::types::DbId;
use sqlx::PgPool;

use crate::models::order::{CreateOrder, Order};

/// Column list for `orders` queries.
const COLUMNS: &str = "\
    id, user_id, item_name, amount, reward_points, \
    package_total_sessions, package_validity_days, status_id, \
    cancel_status_id, cancel_reason_code, cancel_reason_text, \
    cancel_requested_by, cancel_requested_at, cancel_processed_at, \
    created_at, updated_at";

/// Maximum page size for order listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for order listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides CRUD operations for purchase orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Create a new pending order.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateOrder,
    ) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders \
                 (user_id, item_name, amount, reward_points, \
                  package_total_sessions, package_validity_days) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .bind(&input.item_name)
            .bind(input.amount)
            .bind(input.reward_points.unwrap_or(0))
            .bind(input.package_total_sessions)
            .bind(input.package_validity_days)
            .fetch_one(pool)
            .await
    }

    /// Find an order by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's orders, newest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .bind(limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT))
            .bind(offset.unwrap_or(0))
            .fetch_all(pool)
            .await
    }
}
