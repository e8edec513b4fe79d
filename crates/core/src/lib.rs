//! Domain types and pure logic for the bulk product mutation and CSV
//! import/export engine.
//!
//! Nothing in this crate touches the database or performs network I/O. The
//! `db` crate compiles filters into SQL and the `api` crate orchestrates the
//! engines; both depend on the types defined here.

pub mod audit;
pub mod batch;
pub mod error;
pub mod export;
pub mod filter;
pub mod identifier;
pub mod import;
pub mod mutation;
pub mod pricing;
pub mod product;
pub mod roles;
pub mod types;
