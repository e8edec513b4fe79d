//! Well-known role names and the capabilities they grant.
//!
//! Role names must match the `role` claim issued in access tokens. The
//! capability table is the permission contract the engines consume: a caller
//! may run a batch only if its role grants the matching capability.

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_STAFF: &str = "staff";

/// A named permission checked before any batch operation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Apply a mutation descriptor to a filtered product set.
    BulkMutate,
    /// Ingest a CSV file into the product table.
    Import,
    /// Stream a filtered product slice out as CSV.
    Export,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BulkMutate => "bulk_mutate",
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return `true` when `role` grants `capability`.
///
/// Admins and managers may do everything; staff may only export. Unknown
/// roles are granted nothing.
pub fn has_capability(role: &str, capability: Capability) -> bool {
    match role {
        ROLE_ADMIN | ROLE_MANAGER => true,
        ROLE_STAFF => matches!(capability, Capability::Export),
        _ => false,
    }
}
