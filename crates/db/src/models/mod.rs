//! Row models and insert/update DTOs, one module per table family.

pub mod audit;
pub mod lookup;
pub mod product;
