use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stockroom_core::error::CoreError;

use crate::engine::{EngineError, ImportError};

/// Error returned by handlers and extractors.
///
/// Every variant renders as `{ "error": <message>, "code": <CODE> }` with a
/// matching status. Row-level import problems never reach this type; they
/// travel inside the batch result.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bulk mutation failed validation or its transaction.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An import was rejected or aborted as a whole.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Malformed request framing (multipart, missing form field).
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No route for {0}")]
    RouteNotFound(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// Status, machine-readable code, and client-facing message.
type Classified = (StatusCode, &'static str, String);

impl AppError {
    fn classify(&self) -> Classified {
        match self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Engine(EngineError::Validation(core)) => classify_core_error(core),
            AppError::Engine(EngineError::Transaction(err)) => classify_sqlx_error(err),
            AppError::Import(ImportError::InputFormat(msg)) => {
                (StatusCode::BAD_REQUEST, "INPUT_FORMAT", msg.clone())
            }
            AppError::Import(err @ ImportError::RowLimitExceeded { .. }) => (
                StatusCode::BAD_REQUEST,
                "ROW_LIMIT_EXCEEDED",
                err.to_string(),
            ),
            AppError::Import(ImportError::Transaction(err)) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::RouteNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = self.classify();
        (status, Json(ErrorBody { error, code })).into_response()
    }
}

/// Sanitized 500; the detail only goes to the log.
fn internal(detail: &dyn std::fmt::Display) -> Classified {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(core: &CoreError) -> Classified {
    match core {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::UnknownValue { .. } => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", core.to_string())
        }
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
    }
}

/// Unique violations on `uq_*` constraints (SQLSTATE 23505) become 409;
/// anything else is a sanitized 500.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            if let Some(constraint) = db_err.constraint().filter(|c| c.starts_with("uq_")) {
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                );
            }
        }
    }
    internal(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_value_is_a_validation_error() {
        let err = AppError::from(CoreError::unknown("status", "gone", &["active", "inactive"]));
        let (status, code, message) = err.classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert_eq!(message, "Unknown status 'gone'. Must be one of: active, inactive");
    }

    #[test]
    fn row_limit_keeps_its_own_code() {
        let err = AppError::from(ImportError::RowLimitExceeded { limit: 5 });
        let (status, code, message) = err.classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "ROW_LIMIT_EXCEEDED");
        assert_eq!(message, "Import exceeds the maximum of 5 rows");
    }

    #[test]
    fn pool_errors_are_sanitized() {
        let err = AppError::from(EngineError::Transaction(sqlx::Error::PoolTimedOut));
        let (status, code, message) = err.classify();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert_eq!(message, "An internal error occurred");
    }
}
