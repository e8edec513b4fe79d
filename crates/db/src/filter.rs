//! Filter compiler: turns a [`FilterCriteria`] into a parameterised WHERE
//! clause over `products p`.
//!
//! Every caller-supplied value becomes a positional `$n` bind. Only the fixed
//! stock thresholds are written into the SQL text. The mutation engine, the
//! matching-count preview, and the export stream all compile through here so
//! they select the same rows for the same criteria.

use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::Postgres;
use stockroom_core::filter::FilterCriteria;
use stockroom_core::product::{StockCondition, HIGH_STOCK_THRESHOLD, LOW_STOCK_THRESHOLD};
use stockroom_core::types::Timestamp;

/// Typed bind value for dynamically-built product queries.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    BigInt(i64),
    Text(String),
    Decimal(Decimal),
    Timestamp(Timestamp),
}

/// A compiled predicate and the values for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    /// SQL boolean expression; `TRUE` when the criteria are empty.
    pub clause: String,
    pub binds: Vec<BindValue>,
    /// First placeholder index not used by `clause`.
    pub next_index: u32,
}

/// Compile `criteria`, numbering placeholders from `first_index`.
///
/// Never fails: contradictory criteria (e.g. `price_min > price_max`) produce
/// a clause that matches nothing.
pub fn compile(criteria: &FilterCriteria, first_index: u32) -> CompiledFilter {
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<BindValue> = Vec::new();
    let mut idx = first_index;

    let mut push = |sql: &str, value: BindValue, conditions: &mut Vec<String>| {
        conditions.push(format!("{sql} ${idx}"));
        binds.push(value);
        idx += 1;
    };

    if let Some(id) = criteria.category_id {
        push("p.category_id =", BindValue::BigInt(id), &mut conditions);
    }
    if let Some(id) = criteria.brand_id {
        push("p.brand_id =", BindValue::BigInt(id), &mut conditions);
    }
    if let Some(id) = criteria.supplier_id {
        push("p.supplier_id =", BindValue::BigInt(id), &mut conditions);
    }
    if let Some(status) = criteria.status {
        push(
            "p.status =",
            BindValue::Text(status.as_str().to_string()),
            &mut conditions,
        );
    }
    if let Some(min) = criteria.price_min {
        push("p.price >=", BindValue::Decimal(min), &mut conditions);
    }
    if let Some(max) = criteria.price_max {
        push("p.price <=", BindValue::Decimal(max), &mut conditions);
    }
    if let Some(from) = criteria.created_from_bound() {
        push("p.created_at >=", BindValue::Timestamp(from), &mut conditions);
    }
    if let Some(to) = criteria.created_to_bound() {
        push("p.created_at <", BindValue::Timestamp(to), &mut conditions);
    }

    if let Some(stock) = criteria.stock_condition {
        conditions.push(stock_clause(stock));
    }

    let clause = if conditions.is_empty() {
        "TRUE".to_string()
    } else {
        conditions.join(" AND ")
    };

    CompiledFilter {
        clause,
        binds,
        next_index: idx,
    }
}

fn stock_clause(condition: StockCondition) -> String {
    match condition {
        StockCondition::InStock => "p.quantity > 0".to_string(),
        StockCondition::LowStock => format!("p.quantity <= {LOW_STOCK_THRESHOLD}"),
        StockCondition::OutOfStock => "p.quantity = 0".to_string(),
        StockCondition::HighStock => format!("p.quantity > {HIGH_STOCK_THRESHOLD}"),
    }
}

// ---------------------------------------------------------------------------
// Binding helpers
// ---------------------------------------------------------------------------

/// Bind a slice of `BindValue` to a sqlx `Query`.
pub fn bind_query<'q>(
    mut q: sqlx::query::Query<'q, Postgres, PgArguments>,
    binds: &'q [BindValue],
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    for val in binds {
        q = match val {
            BindValue::BigInt(v) => q.bind(*v),
            BindValue::Text(v) => q.bind(v.as_str()),
            BindValue::Decimal(v) => q.bind(*v),
            BindValue::Timestamp(v) => q.bind(*v),
        };
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
pub fn bind_query_as<'q, O>(
    mut q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    binds: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments> {
    for val in binds {
        q = match val {
            BindValue::BigInt(v) => q.bind(*v),
            BindValue::Text(v) => q.bind(v.as_str()),
            BindValue::Decimal(v) => q.bind(*v),
            BindValue::Timestamp(v) => q.bind(*v),
        };
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
pub fn bind_query_scalar<'q, O>(
    mut q: sqlx::query::QueryScalar<'q, Postgres, O, PgArguments>,
    binds: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, Postgres, O, PgArguments> {
    for val in binds {
        q = match val {
            BindValue::BigInt(v) => q.bind(*v),
            BindValue::Text(v) => q.bind(v.as_str()),
            BindValue::Decimal(v) => q.bind(*v),
            BindValue::Timestamp(v) => q.bind(*v),
        };
    }
    q
}
