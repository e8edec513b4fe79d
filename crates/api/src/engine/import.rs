//! CSV import pipeline.
//!
//! Rows are processed strictly in file order. Each row that passes
//! validation is written inside its own transaction, so a storage failure
//! rolls back that row alone and the import carries on. Call-level failures
//! (unreadable file, missing columns, row ceiling) surface as
//! [`ImportError`]; everything else lands in the returned [`BatchResult`].

use std::io::Read;

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgConnection;
use stockroom_core::audit::{self, action_types};
use stockroom_core::batch::BatchResult;
use stockroom_core::identifier::{self, IdentifierLookup, IdentifierPattern};
use stockroom_core::import::{
    self as csv_import, DuplicatePolicy, ImportOptions, ImportRow, RunIdentifiers,
};
use stockroom_core::types::DbId;
use stockroom_db::models::lookup::LookupKind;
use stockroom_db::models::product::{IdentifierColumn, NewProduct};
use stockroom_db::repositories::{LookupRepo, ProductRepo};
use stockroom_db::DbPool;
use tokio_util::sync::CancellationToken;

use super::{record_activity, ImportError};

/// Import every data row of `input`.
///
/// `cancel` is checked before each row; once it fires the partial result is
/// returned with `cancelled` set. Rows already committed stay committed on
/// every exit path.
pub async fn import<R: Read + Send>(
    pool: &DbPool,
    actor_id: DbId,
    input: R,
    options: &ImportOptions,
    cancel: &CancellationToken,
) -> Result<BatchResult, ImportError> {
    let policy = options.duplicate_policy.as_str();
    tracing::info!(user_id = actor_id, policy, max_rows = options.max_rows, "Product import started");

    let mut result = BatchResult::default();
    let outcome = run(pool, input, options, cancel, &mut result).await;

    let details = json!({ "duplicate_policy": policy, "result": &result });
    match outcome {
        Ok(()) => {
            tracing::info!(
                user_id = actor_id,
                created = result.success_count,
                updated = result.updated_count,
                skipped = result.skipped_count,
                failed = result.error_count,
                cancelled = result.cancelled,
                "Product import finished",
            );
            record_activity(
                pool,
                actor_id,
                action_types::PRODUCT_IMPORT,
                audit::batch_detail(&result),
                details,
            )
            .await;
            Ok(result)
        }
        Err(e) => {
            tracing::error!(
                user_id = actor_id,
                error = %e,
                processed = result.processed(),
                "Product import aborted",
            );
            record_activity(
                pool,
                actor_id,
                action_types::PRODUCT_IMPORT,
                audit::failure_detail(&e),
                details,
            )
            .await;
            Err(e)
        }
    }
}

/// Drive the reader, accumulating into `result` so partial counts survive
/// an early return.
async fn run<R: Read + Send>(
    pool: &DbPool,
    input: R,
    options: &ImportOptions,
    cancel: &CancellationToken,
    result: &mut BatchResult,
) -> Result<(), ImportError> {
    let mut reader = csv_import::csv_reader(input);
    let header_record = reader
        .headers()
        .map_err(|e| ImportError::InputFormat(format!("Could not read CSV header: {e}")))?
        .clone();
    let headers = csv_import::validate_headers(&header_record).map_err(ImportError::InputFormat)?;

    let mut seen = RunIdentifiers::default();
    let mut record = csv::StringRecord::new();
    let mut row_number = 0usize;

    loop {
        if cancel.is_cancelled() {
            tracing::warn!(rows = row_number, "Product import cancelled");
            result.cancelled = true;
            return Ok(());
        }

        let line_before = reader.position().line();
        let parse_error = match reader.read_record(&mut record) {
            Ok(true) => None,
            // Trailing empty lines after the last record are not rows.
            Ok(false) => return Ok(()),
            Err(e) if e.is_io_error() => {
                return Err(ImportError::InputFormat(format!("Could not read CSV: {e}")));
            }
            Err(e) => Some(e),
        };
        let lines_read = reader.position().line().saturating_sub(line_before);

        for _ in 0..csv_import::blank_lines_before(lines_read, &record) {
            next_row(&mut row_number, options)?;
            result.skipped_count += 1;
        }
        next_row(&mut row_number, options)?;

        if let Some(e) = parse_error {
            result.push_error(row_number, &format!("Could not parse row: {e}"));
            continue;
        }

        if csv_import::is_blank_record(&record) {
            result.skipped_count += 1;
            continue;
        }

        let row = match csv_import::parse_row(&record, &headers, &seen) {
            Ok(row) => row,
            Err(reasons) => {
                result.push_error(row_number, &reasons.join("; "));
                continue;
            }
        };
        if let Some(sku) = &row.sku {
            seen.claim_sku(sku);
        }
        if let Some(barcode) = &row.barcode {
            seen.claim_barcode(barcode);
        }

        match import_row(pool, &row, options, &seen).await {
            Ok(RowOutcome::Created { sku, barcode }) => {
                result.success_count += 1;
                seen.claim_sku(&sku);
                seen.claim_barcode(&barcode);
            }
            Ok(RowOutcome::Updated) => result.updated_count += 1,
            Ok(RowOutcome::Skipped) => result.skipped_count += 1,
            Err(e) => {
                tracing::debug!(row = row_number, error = %e, "Import row rolled back");
                result.push_error(row_number, &describe_row_failure(&e));
            }
        }
    }
}

/// Advance to the next data row, enforcing the row ceiling. Blank and
/// malformed rows count toward it like any other.
fn next_row(row_number: &mut usize, options: &ImportOptions) -> Result<(), ImportError> {
    *row_number += 1;
    if *row_number > options.max_rows {
        return Err(ImportError::RowLimitExceeded {
            limit: options.max_rows,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-row transaction
// ---------------------------------------------------------------------------

/// Terminal state of a row that reached the store.
enum RowOutcome {
    /// Inserted with these final identifiers.
    Created { sku: String, barcode: String },
    Updated,
    Skipped,
}

async fn import_row(
    pool: &DbPool,
    row: &ImportRow,
    options: &ImportOptions,
    seen: &RunIdentifiers,
) -> Result<RowOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let mut sku = row.sku.clone();
    let mut barcode = row.barcode.clone();

    if sku.is_some() || barcode.is_some() {
        let existing =
            ProductRepo::find_duplicate(&mut *tx, sku.as_deref(), barcode.as_deref()).await?;
        if let Some(existing) = existing {
            match options.duplicate_policy {
                DuplicatePolicy::Skip => return Ok(RowOutcome::Skipped),
                DuplicatePolicy::Update => {
                    let input = build_product(&mut *tx, row).await?;
                    ProductRepo::overwrite(&mut *tx, existing.id, &input).await?;
                    tx.commit().await?;
                    return Ok(RowOutcome::Updated);
                }
                DuplicatePolicy::CreateWithNewIdentifier => {
                    if let Some(value) = &sku {
                        if ProductRepo::identifier_exists(&mut *tx, IdentifierColumn::Sku, value)
                            .await?
                        {
                            sku = None;
                        }
                    }
                    if let Some(value) = &barcode {
                        if ProductRepo::identifier_exists(
                            &mut *tx,
                            IdentifierColumn::Barcode,
                            value,
                        )
                        .await?
                        {
                            barcode = None;
                        }
                    }
                }
            }
        }
    }

    let mut input = build_product(&mut *tx, row).await?;

    let sku = match sku {
        Some(value) => value,
        None => {
            let pattern = &options.sku_pattern;
            generate(
                &mut *tx,
                IdentifierColumn::Sku,
                seen,
                || pattern.candidate(),
                options.max_identifier_attempts,
            )
            .await?
        }
    };
    let barcode = match barcode {
        Some(value) => value,
        None => {
            generate(
                &mut *tx,
                IdentifierColumn::Barcode,
                seen,
                identifier::barcode_candidate,
                options.max_identifier_attempts,
            )
            .await?
        }
    };
    let product_number_pattern = IdentifierPattern::product_number();
    let product_number = generate(
        &mut *tx,
        IdentifierColumn::ProductNumber,
        seen,
        || product_number_pattern.candidate(),
        options.max_identifier_attempts,
    )
    .await?;

    input.sku = Some(sku.clone());
    input.barcode = Some(barcode.clone());
    input.product_number = Some(product_number);

    ProductRepo::insert(&mut *tx, &input).await?;
    tx.commit().await?;

    Ok(RowOutcome::Created { sku, barcode })
}

/// Map an extracted row onto an insert DTO, resolving lookup names (and
/// creating missing ones) on `conn`. Identifiers are left unset.
async fn build_product(conn: &mut PgConnection, row: &ImportRow) -> Result<NewProduct, sqlx::Error> {
    let category_id = resolve_lookup(conn, LookupKind::Category, row.category.as_deref()).await?;
    let brand_id = resolve_lookup(conn, LookupKind::Brand, row.brand.as_deref()).await?;
    let supplier_id = resolve_lookup(conn, LookupKind::Supplier, row.supplier.as_deref()).await?;

    Ok(NewProduct {
        name: row.name.clone(),
        description: row.description.clone(),
        price: row.price,
        sale_price: row.sale_price,
        sale_start: row.sale_start,
        sale_end: row.sale_end,
        quantity: row.quantity,
        status: row.status.as_str().to_string(),
        category_id,
        brand_id,
        supplier_id,
        tax_rate: row.tax_rate,
        weight: row.weight,
        dimensions: row.dimensions.clone(),
        ..Default::default()
    })
}

async fn resolve_lookup(
    conn: &mut PgConnection,
    kind: LookupKind,
    name: Option<&str>,
) -> Result<Option<DbId>, sqlx::Error> {
    match name {
        Some(name) => Ok(Some(LookupRepo::resolve_or_create(conn, kind, name).await?)),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Identifier generation
// ---------------------------------------------------------------------------

/// Checks candidates against this run's claimed identifiers, then the store.
struct StoreLookup<'a> {
    conn: &'a mut PgConnection,
    column: IdentifierColumn,
    seen: &'a RunIdentifiers,
}

#[async_trait]
impl IdentifierLookup for StoreLookup<'_> {
    type Error = sqlx::Error;

    async fn is_taken(&mut self, candidate: &str) -> Result<bool, sqlx::Error> {
        let claimed = match self.column {
            IdentifierColumn::Sku => self.seen.has_sku(candidate),
            IdentifierColumn::Barcode => self.seen.has_barcode(candidate),
            IdentifierColumn::ProductNumber => false,
        };
        if claimed {
            return Ok(true);
        }
        ProductRepo::identifier_exists(&mut *self.conn, self.column, candidate).await
    }
}

async fn generate<F>(
    conn: &mut PgConnection,
    column: IdentifierColumn,
    seen: &RunIdentifiers,
    next_candidate: F,
    max_attempts: u32,
) -> Result<String, sqlx::Error>
where
    F: FnMut() -> String + Send,
{
    let mut lookup = StoreLookup { conn, column, seen };
    let generated = identifier::generate_unique(next_candidate, max_attempts, &mut lookup).await?;
    if generated.used_fallback {
        tracing::warn!(
            column = column.column(),
            attempts = generated.attempts,
            value = %generated.value,
            "Identifier retries exhausted, using fallback suffix",
        );
    }
    Ok(generated.value)
}

// ---------------------------------------------------------------------------
// Row failure messages
// ---------------------------------------------------------------------------

/// Human-readable reason for a rolled-back row.
fn describe_row_failure(err: &sqlx::Error) -> String {
    if let sqlx::Error::Database(db_err) = err {
        match db_err.constraint() {
            Some("uq_products_sku") => return "SKU already exists".to_string(),
            Some("uq_products_barcode") => return "Barcode already exists".to_string(),
            Some("uq_products_product_number") => {
                return "Generated product number collided; retry the row".to_string()
            }
            Some(constraint) if constraint.starts_with("ck_") => {
                return format!("Value rejected by constraint {constraint}");
            }
            _ => {}
        }
    }
    format!("Database error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_reported_verbatim() {
        let msg = describe_row_failure(&sqlx::Error::RowNotFound);
        assert!(msg.starts_with("Database error: "), "{msg}");
    }
}
