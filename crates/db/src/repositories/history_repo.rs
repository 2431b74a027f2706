//! Repository for the append-only `status_history` table.
//!
//! Appends happen inside the same transaction as the guarded update they
//! record, so the writers here take a connection rather than the pool.

use courtside_core::lifecycle::EntityKind;
use courtside_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::history::StatusHistoryEntry;
use crate::models::status::StatusId;

/// Column list for `status_history` queries.
const COLUMNS: &str = "\
    id, entity_kind, entity_id, record_type, from_status_id, to_status_id, \
    actor_id, description, created_at";

/// A history record to append.
#[derive(Debug)]
pub struct NewHistory<'a> {
    pub entity_kind: EntityKind,
    pub entity_id: DbId,
    pub record_type: &'static str,
    pub from_status_id: Option<StatusId>,
    pub to_status_id: StatusId,
    pub actor_id: Option<DbId>,
    pub description: Option<&'a str>,
}

/// Read access plus the transactional append used by the guarded updates.
pub struct HistoryRepo;

impl HistoryRepo {
    /// Append one history row on an open transaction.
    pub async fn append(
        conn: &mut PgConnection,
        record: &NewHistory<'_>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO status_history \
                 (entity_kind, entity_id, record_type, from_status_id, \
                  to_status_id, actor_id, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.entity_kind.as_str())
        .bind(record.entity_id)
        .bind(record.record_type)
        .bind(record.from_status_id)
        .bind(record.to_status_id)
        .bind(record.actor_id)
        .bind(record.description)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Full timeline for one entity, oldest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_kind: EntityKind,
        entity_id: DbId,
    ) -> Result<Vec<StatusHistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM status_history \
             WHERE entity_kind = $1 AND entity_id = $2 \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, StatusHistoryEntry>(&query)
            .bind(entity_kind.as_str())
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
