//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! `&PgPool`, or `&mut PgConnection` when the caller owns the transaction.

pub mod audit_repo;
pub mod lookup_repo;
pub mod product_repo;

pub use audit_repo::AuditLogRepo;
pub use lookup_repo::LookupRepo;
pub use product_repo::ProductRepo;
