//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::CanBulkMutate`] -- Requires the `bulk_mutate` capability.
//! - [`rbac::CanImport`] -- Requires the `import` capability.
//! - [`rbac::CanExport`] -- Requires the `export` capability.

pub mod auth;
pub mod rbac;
