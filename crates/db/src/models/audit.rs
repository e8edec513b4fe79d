//! Audit log entity and create DTO.
//!
//! Audit logs have no `updated_at` field; entries are immutable once written.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stockroom_core::types::{DbId, Timestamp};

/// A single audit log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub timestamp: Timestamp,
    pub user_id: Option<DbId>,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub detail_text: String,
    pub details_json: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for appending an audit log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditLog {
    pub user_id: Option<DbId>,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub detail_text: String,
    pub details_json: Option<serde_json::Value>,
}
