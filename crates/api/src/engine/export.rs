//! Streaming CSV export.
//!
//! A spawned task reads the filtered rows through a database cursor, encodes
//! them with `csv::Writer`, and hands the bytes to the HTTP body in chunks
//! over a bounded channel. Memory stays bounded by the channel capacity times
//! the chunk size, whatever the result size.

use std::io;

use axum::body::Bytes;
use futures::TryStreamExt;
use serde_json::json;
use sqlx::Row;
use stockroom_core::audit::{self, action_types};
use stockroom_core::export::{self as fields, ExportField};
use stockroom_core::filter::FilterCriteria;
use stockroom_core::types::DbId;
use stockroom_db::filter;
use stockroom_db::repositories::product_repo;
use stockroom_db::DbPool;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::record_activity;

/// Chunks buffered between the cursor and the response body.
const CHANNEL_CAPACITY: usize = 16;

/// Rows encoded per chunk.
const ROWS_PER_CHUNK: u64 = 500;

/// One piece of the CSV body.
pub type CsvChunk = Result<Bytes, io::Error>;

#[derive(Debug, thiserror::Error)]
enum ExportError {
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV encoding failed: {0}")]
    Io(#[from] io::Error),

    #[error("Client disconnected after {rows} rows")]
    Disconnected { rows: u64 },
}

/// Start exporting the products matching `criteria`.
///
/// `requested` field names are resolved against the allow-list; unknown
/// names are dropped and an empty selection falls back to the default
/// columns. The returned stream ends after the last row, or with an error
/// item if the query fails part-way.
pub fn export(
    pool: DbPool,
    actor_id: DbId,
    criteria: FilterCriteria,
    requested: &[String],
) -> ReceiverStream<CsvChunk> {
    let selected = fields::resolve_fields(requested);
    let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        tracing::info!(user_id = actor_id, fields = selected.len(), "Product export started");
        let keys: Vec<&str> = selected.iter().map(|f| f.key()).collect();
        let details = json!({ "filter": &criteria, "fields": &keys });

        match stream_rows(&pool, &criteria, &selected, &sender).await {
            Ok(rows) => {
                tracing::info!(user_id = actor_id, rows, "Product export finished");
                record_activity(
                    &pool,
                    actor_id,
                    action_types::PRODUCT_EXPORT,
                    audit::export_detail(rows, &keys),
                    details,
                )
                .await;
            }
            Err(e) => {
                tracing::error!(user_id = actor_id, error = %e, "Product export failed");
                // The receiver may already be gone; nothing else to tell it.
                let _ = sender.send(Err(io::Error::other(e.to_string()))).await;
                record_activity(
                    &pool,
                    actor_id,
                    action_types::PRODUCT_EXPORT,
                    audit::failure_detail(&e),
                    details,
                )
                .await;
            }
        }
    });

    ReceiverStream::new(receiver)
}

/// Write the header and every matching row to `sender`. Returns the number
/// of data rows written.
async fn stream_rows(
    pool: &DbPool,
    criteria: &FilterCriteria,
    selected: &[ExportField],
    sender: &mpsc::Sender<CsvChunk>,
) -> Result<u64, ExportError> {
    let compiled = filter::compile(criteria, 1);
    let sql = product_repo::export_sql(selected, &compiled);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(fields::header_labels(selected))?;

    let mut cursor = filter::bind_query(sqlx::query(&sql), &compiled.binds).fetch(pool);
    let mut rows = 0u64;
    let mut record: Vec<String> = Vec::with_capacity(selected.len());

    while let Some(row) = cursor.try_next().await? {
        record.clear();
        for idx in 0..selected.len() {
            let value: Option<String> = row.try_get(idx)?;
            record.push(value.unwrap_or_default());
        }
        writer.write_record(&record)?;
        rows += 1;

        if rows % ROWS_PER_CHUNK == 0 {
            send_chunk(&mut writer, sender, rows).await?;
        }
    }

    send_chunk(&mut writer, sender, rows).await?;
    Ok(rows)
}

/// Flush whatever the writer has buffered into one chunk.
async fn send_chunk(
    writer: &mut csv::Writer<Vec<u8>>,
    sender: &mpsc::Sender<CsvChunk>,
    rows: u64,
) -> Result<(), ExportError> {
    writer.flush()?;
    let filled = std::mem::replace(writer, csv::Writer::from_writer(Vec::new()));
    let buf = filled.into_inner().map_err(|e| e.into_error())?;
    if buf.is_empty() {
        return Ok(());
    }
    sender
        .send(Ok(Bytes::from(buf)))
        .await
        .map_err(|_| ExportError::Disconnected { rows })
}
