/// Domain-level error shared by every crate in the workspace.
///
/// Row-level import problems are never raised through this type; they are
/// collected into [`crate::batch::BatchResult::errors`] instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown {kind} '{value}'. Must be one of: {allowed}")]
    UnknownValue {
        kind: &'static str,
        value: String,
        allowed: String,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl CoreError {
    /// Build an [`CoreError::UnknownValue`] from a list of accepted strings.
    pub fn unknown(kind: &'static str, value: &str, allowed: &[&str]) -> Self {
        Self::UnknownValue {
            kind,
            value: value.to_string(),
            allowed: allowed.join(", "),
        }
    }
}
