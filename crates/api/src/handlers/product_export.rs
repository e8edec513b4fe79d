//! Handler for streamed CSV product export.

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use stockroom_core::filter::FilterCriteria;

use crate::engine::export::export;
use crate::middleware::rbac::CanExport;
use crate::state::AppState;

/// Request body for `POST /products/export`.
#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub filter: FilterCriteria,
    /// Column keys; unknown keys are ignored, none selects the defaults.
    #[serde(default)]
    pub fields: Vec<String>,
}

/// POST /api/v1/products/export
///
/// Streams `text/csv`. The status is sent before the first row, so a query
/// failure part-way through truncates the body instead of changing the
/// status.
pub async fn export_products(
    State(state): State<AppState>,
    CanExport(user): CanExport,
    Json(body): Json<ExportRequest>,
) -> impl IntoResponse {
    let stream = export(state.pool.clone(), user.user_id, body.filter, &body.fields);
    let filename = format!(
        "products_{}.csv",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Body::from_stream(stream),
    )
}
