//! Capability-based access control extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects the request with 403 unless
//! the caller's role grants the named capability. Batch handlers take one of
//! these instead of a bare `AuthUser`, so no batch can start without the
//! permission check.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use stockroom_core::error::CoreError;
use stockroom_core::roles::{has_capability, Capability};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Reject `user` unless its role grants `capability`.
fn require(user: &AuthUser, capability: Capability) -> Result<(), AppError> {
    if has_capability(&user.role, capability) {
        return Ok(());
    }
    tracing::warn!(
        user_id = user.user_id,
        role = %user.role,
        %capability,
        "Capability check failed",
    );
    Err(AppError::Core(CoreError::Forbidden(format!(
        "The '{capability}' capability is required"
    ))))
}

macro_rules! capability_extractor {
    ($(#[$meta:meta])* $name:ident => $capability:expr) => {
        $(#[$meta])*
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let user = AuthUser::from_request_parts(parts, state).await?;
                require(&user, $capability)?;
                Ok($name(user))
            }
        }
    };
}

capability_extractor!(
    /// Requires [`Capability::BulkMutate`].
    ///
    /// ```ignore
    /// async fn apply(CanBulkMutate(user): CanBulkMutate) -> AppResult<Json<()>> {
    ///     Ok(Json(()))
    /// }
    /// ```
    CanBulkMutate => Capability::BulkMutate
);

capability_extractor!(
    /// Requires [`Capability::Import`].
    CanImport => Capability::Import
);

capability_extractor!(
    /// Requires [`Capability::Export`].
    CanExport => Capability::Export
);
