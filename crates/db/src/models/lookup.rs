//! Category, brand, and supplier lookup tables.
//!
//! The three tables share one shape, so a single model and a
//! [`LookupKind`] discriminator cover all of them.

use serde::Serialize;
use sqlx::FromRow;
use stockroom_core::types::{DbId, Timestamp};

/// Which lookup table a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Category,
    Brand,
    Supplier,
}

impl LookupKind {
    /// Table name. Static, never caller-supplied.
    pub fn table(self) -> &'static str {
        match self {
            Self::Category => "categories",
            Self::Brand => "brands",
            Self::Supplier => "suppliers",
        }
    }
}

/// A row from any lookup table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LookupEntry {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
