//! Batch summaries returned by the mutation engine and the import pipeline.

use serde::{Deserialize, Serialize};

/// Maximum number of per-row error lines kept in a summary. Counts keep
/// increasing past this cap; only the message list is truncated.
pub const MAX_REPORTED_ERRORS: usize = 1_000;

/// Outcome counters and per-row error lines for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success_count: u64,
    pub error_count: u64,
    pub skipped_count: u64,
    pub updated_count: u64,
    /// Ordered `"Row N: <reasons>"` lines.
    pub errors: Vec<String>,
    /// Set when the batch stopped early on a cancellation signal.
    #[serde(default)]
    pub cancelled: bool,
}

impl BatchResult {
    /// Record a failed row.
    pub fn push_error(&mut self, row: usize, reasons: &str) {
        self.error_count += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(format_row_error(row, reasons));
        }
    }

    /// Total number of rows that reached a terminal state.
    pub fn processed(&self) -> u64 {
        self.success_count + self.error_count + self.skipped_count + self.updated_count
    }

    /// One-line summary used for logs and audit entries.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} created, {} updated, {} skipped, {} failed",
            self.success_count, self.updated_count, self.skipped_count, self.error_count
        );
        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        line
    }
}

/// Format a per-row error line. `row` is the 1-based data row number.
pub fn format_row_error(row: usize, reasons: &str) -> String {
    format!("Row {row}: {reasons}")
}
