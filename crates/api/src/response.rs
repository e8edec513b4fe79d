//! Success envelope shared by every JSON endpoint.

use serde::Serialize;

/// `{ "data": T }`. Errors use the `{ "error", "code" }` shape from
/// [`crate::error::AppError`] instead.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
