//! Repository for the `audit_logs` table.

use sqlx::PgPool;

use crate::models::audit::{AuditLog, CreateAuditLog};

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "\
    id, timestamp, user_id, action_type, entity_type, \
    detail_text, details_json, created_at";

/// Provides append and query operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry.
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (user_id, action_type, entity_type, detail_text, details_json) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.user_id)
            .bind(&entry.action_type)
            .bind(&entry.entity_type)
            .bind(&entry.detail_text)
            .bind(&entry.details_json)
            .fetch_one(pool)
            .await
    }

    /// Most recent entries first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs ORDER BY timestamp DESC, id DESC LIMIT $1"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(limit.clamp(1, 500))
            .fetch_all(pool)
            .await
    }

    /// All entries with the given action type, oldest first.
    pub async fn list_by_action(
        pool: &PgPool,
        action_type: &str,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs WHERE action_type = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(action_type)
            .fetch_all(pool)
            .await
    }
}
