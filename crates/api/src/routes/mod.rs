pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /products/bulk                                   apply mutation (POST)
/// /products/bulk/preview                           matching count (POST)
/// /products/import                                 CSV upload (POST, multipart)
/// /products/import/template                        CSV template (GET)
/// /products/export                                 streamed CSV (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/products", products::router())
}
