//! Repository for the `products` table.
//!
//! Batch paths take `&mut PgConnection` so the caller controls the
//! transaction (`&mut *tx`); read-only helpers take `&PgPool`.

use sqlx::{PgConnection, PgPool};
use stockroom_core::export::ExportField;
use stockroom_core::filter::FilterCriteria;
use stockroom_core::mutation::FieldUpdate;
use stockroom_core::product::ProductStatus;
use stockroom_core::types::DbId;

use crate::filter::{self, BindValue, CompiledFilter};
use crate::models::product::{IdentifierColumn, NewProduct, PriceRow, Product};

/// Column list for `products` SELECT / RETURNING.
const COLUMNS: &str = "\
    id, name, sku, barcode, product_number, description, price, sale_price, \
    sale_start, sale_end, quantity, status, category_id, brand_id, supplier_id, \
    tax_rate, weight, dimensions, created_at, updated_at";

/// Column list for INSERT (excludes `id`, `created_at`, `updated_at`).
const INSERT_COLUMNS: &str = "\
    name, sku, barcode, product_number, description, price, sale_price, \
    sale_start, sale_end, quantity, status, category_id, brand_id, supplier_id, \
    tax_rate, weight, dimensions";

/// Lookup joins shared by the export query.
const EXPORT_JOINS: &str = "\
    LEFT JOIN categories c ON c.id = p.category_id \
    LEFT JOIN brands b ON b.id = p.brand_id \
    LEFT JOIN suppliers s ON s.id = p.supplier_id";

/// Provides filter-driven batch operations and import writes for products.
pub struct ProductRepo;

impl ProductRepo {
    // -- Filtered reads ------------------------------------------------------

    /// Count products matching `criteria`.
    pub async fn count_matching(
        pool: &PgPool,
        criteria: &FilterCriteria,
    ) -> Result<i64, sqlx::Error> {
        let compiled = filter::compile(criteria, 1);
        let query = format!(
            "SELECT COUNT(*)::BIGINT FROM products p WHERE {}",
            compiled.clause
        );
        filter::bind_query_scalar(sqlx::query_scalar::<_, i64>(&query), &compiled.binds)
            .fetch_one(pool)
            .await
    }

    /// Lock every product matching `criteria` and return its pricing columns,
    /// ordered by id.
    pub async fn lock_matching(
        conn: &mut PgConnection,
        criteria: &FilterCriteria,
    ) -> Result<Vec<PriceRow>, sqlx::Error> {
        let compiled = filter::compile(criteria, 1);
        let query = format!(
            "SELECT p.id, p.price, p.sale_price FROM products p \
             WHERE {} ORDER BY p.id FOR UPDATE",
            compiled.clause
        );
        filter::bind_query_as(sqlx::query_as::<_, PriceRow>(&query), &compiled.binds)
            .fetch_all(&mut *conn)
            .await
    }

    // -- Batched writes ------------------------------------------------------

    /// Set `status` on every id in `ids`. Returns rows affected.
    pub async fn set_status(
        conn: &mut PgConnection,
        ids: &[DbId],
        status: ProductStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET status = $2, updated_at = NOW() WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(status.as_str())
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Apply a field update to every id in `ids`. Returns rows affected.
    ///
    /// An empty update touches only `updated_at`.
    pub async fn apply_field_update(
        conn: &mut PgConnection,
        ids: &[DbId],
        update: &FieldUpdate,
    ) -> Result<u64, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_idx = 2u32; // $1 is the id array
        let mut bind_values: Vec<BindValue> = Vec::new();

        let id_columns = [
            ("category_id", update.category_id),
            ("brand_id", update.brand_id),
            ("supplier_id", update.supplier_id),
        ];
        for (column, value) in id_columns {
            if let Some(id) = value {
                sets.push(format!("{column} = ${bind_idx}"));
                bind_idx += 1;
                bind_values.push(BindValue::BigInt(id));
            }
        }

        if let Some(status) = update.status {
            sets.push(format!("status = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Text(status.as_str().to_string()));
        }

        if let Some(rate) = update.tax_rate {
            sets.push(format!("tax_rate = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Decimal(rate));
        }

        if let Some(ref text) = update.description_replace {
            sets.push(format!("description = ${bind_idx}"));
            bind_values.push(BindValue::Text(text.clone()));
        } else if let Some(ref text) = update.description_append {
            sets.push(format!("description = description || ${bind_idx}"));
            bind_values.push(BindValue::Text(text.clone()));
        }

        sets.push("updated_at = NOW()".to_string());

        let query = format!(
            "UPDATE products SET {} WHERE id = ANY($1)",
            sets.join(", ")
        );
        let q = filter::bind_query(sqlx::query(&query).bind(ids), &bind_values);
        let result = q.execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    /// Write a pricing result for one product. Returns rows affected.
    pub async fn set_prices(
        conn: &mut PgConnection,
        id: DbId,
        price: rust_decimal::Decimal,
        sale_price: Option<rust_decimal::Decimal>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET price = $2, sale_price = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(price)
        .bind(sale_price)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    // -- Import --------------------------------------------------------------

    /// `true` if any product already holds `value` in `column`.
    pub async fn identifier_exists(
        conn: &mut PgConnection,
        column: IdentifierColumn,
        value: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM products WHERE {} = $1)",
            column.column()
        );
        sqlx::query_scalar::<_, bool>(&query)
            .bind(value)
            .fetch_one(&mut *conn)
            .await
    }

    /// Lock and return the product sharing `sku` or `barcode`, lowest id first.
    pub async fn find_duplicate(
        conn: &mut PgConnection,
        sku: Option<&str>,
        barcode: Option<&str>,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products \
             WHERE sku = $1 OR barcode = $2 \
             ORDER BY id LIMIT 1 FOR UPDATE"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(sku)
            .bind(barcode)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Insert a new product, returning the created row.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewProduct,
    ) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(&input.sku)
            .bind(&input.barcode)
            .bind(&input.product_number)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.sale_price)
            .bind(input.sale_start)
            .bind(input.sale_end)
            .bind(input.quantity)
            .bind(&input.status)
            .bind(input.category_id)
            .bind(input.brand_id)
            .bind(input.supplier_id)
            .bind(input.tax_rate)
            .bind(input.weight)
            .bind(&input.dimensions)
            .fetch_one(&mut *conn)
            .await
    }

    /// Overwrite the mutable fields of product `id`. SKU, barcode, and
    /// product number are left untouched.
    pub async fn overwrite(
        conn: &mut PgConnection,
        id: DbId,
        input: &NewProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET \
                name = $2, description = $3, price = $4, sale_price = $5, \
                sale_start = $6, sale_end = $7, quantity = $8, status = $9, \
                category_id = $10, brand_id = $11, supplier_id = $12, \
                tax_rate = $13, weight = $14, dimensions = $15, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.sale_price)
            .bind(input.sale_start)
            .bind(input.sale_end)
            .bind(input.quantity)
            .bind(&input.status)
            .bind(input.category_id)
            .bind(input.brand_id)
            .bind(input.supplier_id)
            .bind(input.tax_rate)
            .bind(input.weight)
            .bind(&input.dimensions)
            .fetch_optional(&mut *conn)
            .await
    }

    // -- Single-row reads ----------------------------------------------------

    /// Find a product by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a product by barcode.
    pub async fn find_by_barcode(
        pool: &PgPool,
        barcode: &str,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE barcode = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(barcode)
            .fetch_optional(pool)
            .await
    }
}

/// Build the export SELECT for `fields` over an already compiled filter.
///
/// Every selected column is text (or NULL) so rows can be read uniformly by
/// position.
pub fn export_sql(fields: &[ExportField], compiled: &CompiledFilter) -> String {
    let select = fields
        .iter()
        .map(|f| f.sql_expr())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {select} FROM products p {EXPORT_JOINS} WHERE {} ORDER BY p.id",
        compiled.clause
    )
}
