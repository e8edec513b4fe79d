//! Handlers for CSV product import.
//!
//! The upload is a multipart form with a single `file` field. The body is
//! read chunk by chunk and rejected as soon as it passes the configured size
//! ceiling, before any parsing.

use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use stockroom_core::batch::BatchResult;
use stockroom_core::import::{template_csv, DuplicatePolicy};

use crate::engine::import::import;
use crate::engine::ImportError;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::CanImport;
use crate::response::DataResponse;
use crate::state::AppState;

const TEMPLATE_FILENAME: &str = "product_import_template.csv";

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    /// `skip` (default), `update`, or `create_with_new_identifier`.
    pub duplicate_policy: Option<String>,
}

/// POST /api/v1/products/import?duplicate_policy=
pub async fn import_products(
    State(state): State<AppState>,
    CanImport(user): CanImport,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<BatchResult>>> {
    let policy = match query.duplicate_policy.as_deref() {
        Some(raw) => DuplicatePolicy::from_str_value(raw)?,
        None => DuplicatePolicy::default(),
    };
    let max_bytes = state.config.engine.import_max_bytes;

    let mut file: Option<Vec<u8>> = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            if data.len() + chunk.len() > max_bytes {
                return Err(ImportError::InputFormat(format!(
                    "File exceeds the maximum upload size of {max_bytes} bytes"
                ))
                .into());
            }
            data.extend_from_slice(&chunk);
        }
        file = Some(data);
    }

    let data =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let options = state.config.engine.import_options(policy);
    let cancel = state.shutdown.child_token();
    let result = import(&state.pool, user.user_id, data.as_slice(), &options, &cancel).await?;

    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/products/import/template
///
/// Download a CSV with the full import header and one example row.
pub async fn download_template(CanImport(_user): CanImport) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{TEMPLATE_FILENAME}\""),
            ),
        ],
        template_csv(),
    )
}
