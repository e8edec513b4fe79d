//! Audit logging constants and detail formatting for batch operations.
//!
//! Every mutation, import, and export call appends exactly one audit entry,
//! including calls that fail. This module only builds the text; the `db`
//! crate owns the `audit_logs` table.

use crate::batch::BatchResult;

// ---------------------------------------------------------------------------
// Action type constants
// ---------------------------------------------------------------------------

/// Known action types for audit log entries.
pub mod action_types {
    pub const BULK_STATUS_UPDATE: &str = "bulk_status_update";
    pub const BULK_FIELD_UPDATE: &str = "bulk_field_update";
    pub const BULK_PRICE_UPDATE: &str = "bulk_price_update";
    pub const PRODUCT_IMPORT: &str = "product_import";
    pub const PRODUCT_EXPORT: &str = "product_export";
}

/// Entity type recorded on every entry written by this crate's engines.
pub const ENTITY_PRODUCTS: &str = "products";

/// Maximum length of `detail_text`; longer text is truncated with an ellipsis.
pub const MAX_DETAIL_LENGTH: usize = 2_000;

// ---------------------------------------------------------------------------
// Detail text
// ---------------------------------------------------------------------------

/// Detail line for a batch that ran to completion (possibly with row errors).
pub fn batch_detail(result: &BatchResult) -> String {
    truncate_detail(result.summary_line())
}

/// Detail line for a mutation whose filter matched nothing.
pub fn no_match_detail() -> String {
    "No matching records".to_string()
}

/// Detail line for a committed bulk mutation.
///
/// Pricing passes that leave sale prices at or above the regular price get
/// a trailing note with the count.
pub fn mutation_detail(affected: u64, matched: u64, sale_price_lapses: u64) -> String {
    let mut text = format!("Updated {affected} of {matched} matching products");
    if sale_price_lapses > 0 {
        text.push_str(&format!(
            "; {sale_price_lapses} sale prices are no longer below the regular price"
        ));
    }
    truncate_detail(text)
}

/// Detail line for a batch aborted at call level.
pub fn failure_detail(error: &dyn std::fmt::Display) -> String {
    truncate_detail(format!("Failed: {error}"))
}

/// Detail line for a finished export.
pub fn export_detail(rows: u64, fields: &[&str]) -> String {
    truncate_detail(format!("Exported {rows} rows ({})", fields.join(", ")))
}

fn truncate_detail(mut text: String) -> String {
    if text.len() > MAX_DETAIL_LENGTH {
        let mut cut = MAX_DETAIL_LENGTH - 3;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
