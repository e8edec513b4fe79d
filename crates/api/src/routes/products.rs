//! Route definitions for bulk product operations.
//!
//! Mounted at `/products`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{bulk, product_export, product_import};
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// ```text
/// POST   /bulk               -> apply_bulk
/// POST   /bulk/preview       -> preview_bulk
/// POST   /import             -> import_products   (multipart)
/// GET    /import/template    -> download_template
/// POST   /export             -> export_products   (streamed)
/// ```
///
/// The import route lifts axum's default body limit; the handler enforces
/// `IMPORT_MAX_BYTES` itself.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bulk", post(bulk::apply_bulk))
        .route("/bulk/preview", post(bulk::preview_bulk))
        .route(
            "/import",
            post(product_import::import_products).layer(DefaultBodyLimit::disable()),
        )
        .route("/import/template", get(product_import::download_template))
        .route("/export", post(product_export::export_products))
}
