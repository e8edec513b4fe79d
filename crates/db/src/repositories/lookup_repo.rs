//! Repository for the `categories`, `brands`, and `suppliers` lookup tables.

use sqlx::{PgConnection, PgPool};
use stockroom_core::types::DbId;

use crate::models::lookup::{LookupEntry, LookupKind};

/// Column list for lookup SELECT queries.
const COLUMNS: &str = "id, name, created_at, updated_at";

/// Provides name resolution and listing for lookup tables.
pub struct LookupRepo;

impl LookupRepo {
    /// Find a lookup entry id by exact name.
    pub async fn find_id_by_name(
        conn: &mut PgConnection,
        kind: LookupKind,
        name: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let query = format!("SELECT id FROM {} WHERE name = $1", kind.table());
        sqlx::query_scalar::<_, DbId>(&query)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Resolve `name` to an id, creating the entry when it does not exist.
    ///
    /// A concurrent creator makes the INSERT a no-op; the entry is then
    /// re-queried once and the winner's id is used. Returns `RowNotFound` if
    /// it still cannot be seen.
    pub async fn resolve_or_create(
        conn: &mut PgConnection,
        kind: LookupKind,
        name: &str,
    ) -> Result<DbId, sqlx::Error> {
        if let Some(id) = Self::find_id_by_name(conn, kind, name).await? {
            return Ok(id);
        }

        let query = format!(
            "INSERT INTO {} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id",
            kind.table()
        );
        let created = sqlx::query_scalar::<_, DbId>(&query)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        if let Some(id) = created {
            tracing::debug!(table = kind.table(), name, id, "Created lookup entry");
            return Ok(id);
        }

        Self::find_id_by_name(conn, kind, name)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// List every entry of a lookup table, ordered by name.
    pub async fn list(pool: &PgPool, kind: LookupKind) -> Result<Vec<LookupEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {} ORDER BY name", kind.table());
        sqlx::query_as::<_, LookupEntry>(&query)
            .fetch_all(pool)
            .await
    }
}
