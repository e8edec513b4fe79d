pub mod bulk;
pub mod product_export;
pub mod product_import;
