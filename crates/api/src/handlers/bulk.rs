//! Handlers for bulk product mutation.
//!
//! Both endpoints take the same filter shape, so a preview count always
//! predicts which rows an apply call would touch.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use stockroom_core::filter::FilterCriteria;
use stockroom_core::mutation::MutationDescriptor;

use crate::engine::mutation::{self, MutationOutcome};
use crate::error::AppResult;
use crate::middleware::rbac::CanBulkMutate;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /products/bulk`.
#[derive(Debug, Deserialize)]
pub struct BulkMutationRequest {
    /// Omitted or empty criteria select every product.
    #[serde(default)]
    pub filter: FilterCriteria,
    pub mutation: MutationDescriptor,
}

/// Request body for `POST /products/bulk/preview`.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub filter: FilterCriteria,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub matching_count: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/products/bulk
///
/// Apply one mutation descriptor to every product matching the filter.
pub async fn apply_bulk(
    State(state): State<AppState>,
    CanBulkMutate(user): CanBulkMutate,
    Json(body): Json<BulkMutationRequest>,
) -> AppResult<Json<DataResponse<MutationOutcome>>> {
    let outcome =
        mutation::apply(&state.pool, user.user_id, &body.filter, &body.mutation).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/products/bulk/preview
pub async fn preview_bulk(
    State(state): State<AppState>,
    CanBulkMutate(_user): CanBulkMutate,
    Json(body): Json<PreviewRequest>,
) -> AppResult<Json<DataResponse<PreviewResponse>>> {
    let matching_count = mutation::preview(&state.pool, &body.filter).await?;
    Ok(Json(DataResponse {
        data: PreviewResponse { matching_count },
    }))
}
