//! Batch engines over the product table.
//!
//! - [`mutation`] -- applies one mutation descriptor to a filtered set in a
//!   single transaction.
//! - [`import`] -- ingests a CSV file row by row, one transaction per row.
//! - [`export`] -- streams a filtered slice out as CSV.
//!
//! Every engine takes the pool explicitly and appends exactly one audit
//! entry per call, failed calls included.

pub mod export;
pub mod import;
pub mod mutation;

use stockroom_core::audit::ENTITY_PRODUCTS;
use stockroom_core::error::CoreError;
use stockroom_core::types::DbId;
use stockroom_db::models::audit::CreateAuditLog;
use stockroom_db::repositories::AuditLogRepo;
use stockroom_db::DbPool;

/// Call-level failure of a bulk mutation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The descriptor was rejected before any row was touched.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// A statement failed; the whole batch was rolled back.
    #[error("Transaction failed: {0}")]
    Transaction(#[from] sqlx::Error),
}

/// Call-level failure of an import. Row-level problems never surface here;
/// they are collected into the batch result.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The file could not be read as CSV, lacks required columns, or is too
    /// large.
    #[error("{0}")]
    InputFormat(String),

    /// The file has more data rows than the configured ceiling. Rows before
    /// the limit stay committed.
    #[error("Import exceeds the maximum of {limit} rows")]
    RowLimitExceeded { limit: usize },

    /// The store could not be reached outside a row transaction.
    #[error("Transaction failed: {0}")]
    Transaction(#[from] sqlx::Error),
}

/// Append one audit entry for a batch call.
///
/// A failed write is logged and swallowed: the batch it describes has
/// already committed, and its result is still returned to the caller.
pub(crate) async fn record_activity(
    pool: &DbPool,
    user_id: DbId,
    action_type: &str,
    detail_text: String,
    details_json: serde_json::Value,
) {
    let entry = CreateAuditLog {
        user_id: Some(user_id),
        action_type: action_type.to_string(),
        entity_type: Some(ENTITY_PRODUCTS.to_string()),
        detail_text,
        details_json: Some(details_json),
    };
    if let Err(e) = AuditLogRepo::insert(pool, &entry).await {
        tracing::error!(error = %e, action_type, user_id, "Failed to write audit entry");
    }
}
