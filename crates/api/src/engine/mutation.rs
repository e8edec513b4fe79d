//! Bulk mutation engine.
//!
//! A call validates its descriptor, counts the matching rows, and then runs
//! the whole batch inside one transaction: the matching rows are locked
//! `FOR UPDATE`, rewritten, and committed together. Any statement error, or a
//! price that cannot be computed, rolls back every row of the batch.

use serde::Serialize;
use serde_json::json;
use sqlx::PgConnection;
use stockroom_core::audit;
use stockroom_core::batch::BatchResult;
use stockroom_core::filter::FilterCriteria;
use stockroom_core::mutation::MutationDescriptor;
use stockroom_core::pricing::{compute_adjustment, PriceRule, SaleRule};
use stockroom_core::types::DbId;
use stockroom_db::models::product::PriceRow;
use stockroom_db::repositories::ProductRepo;
use stockroom_db::DbPool;

use super::{record_activity, EngineError};

/// What a bulk mutation call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The filter selected nothing; no transaction was opened.
    NoMatchingRecords,
    /// The batch committed.
    Applied {
        result: BatchResult,
        /// Rows locked by the filter inside the transaction.
        matched_count: u64,
        /// Pricing passes only: rows left with `sale_price >= price`.
        sale_price_lapses: u64,
    },
}

/// Count the rows `criteria` currently selects.
pub async fn preview(pool: &DbPool, criteria: &FilterCriteria) -> Result<i64, EngineError> {
    Ok(ProductRepo::count_matching(pool, criteria).await?)
}

/// Apply `descriptor` to every product matching `criteria`.
pub async fn apply(
    pool: &DbPool,
    actor_id: DbId,
    criteria: &FilterCriteria,
    descriptor: &MutationDescriptor,
) -> Result<MutationOutcome, EngineError> {
    descriptor.validate()?;
    let action = descriptor.action_name();

    tracing::info!(user_id = actor_id, action, ?criteria, "Bulk mutation started");
    if criteria.is_empty() {
        tracing::warn!(
            user_id = actor_id,
            action,
            "Bulk mutation has no filter; every product is targeted",
        );
    }

    let outcome = match ProductRepo::count_matching(pool, criteria).await {
        Ok(0) => Ok(None),
        Ok(_) => run_batch(pool, criteria, descriptor).await.map(Some),
        Err(e) => Err(EngineError::from(e)),
    };

    let details = json!({ "filter": criteria, "mutation": descriptor });

    match outcome {
        Ok(None) => {
            tracing::info!(user_id = actor_id, action, "Bulk mutation matched no records");
            record_activity(pool, actor_id, action, audit::no_match_detail(), details).await;
            Ok(MutationOutcome::NoMatchingRecords)
        }
        Ok(Some(batch)) => {
            let result = BatchResult {
                success_count: batch.affected,
                ..Default::default()
            };
            tracing::info!(
                user_id = actor_id,
                action,
                matched = batch.matched,
                affected = batch.affected,
                "Bulk mutation committed",
            );
            if batch.sale_price_lapses > 0 {
                tracing::warn!(
                    user_id = actor_id,
                    lapses = batch.sale_price_lapses,
                    "Pricing pass left sale prices at or above the regular price",
                );
            }

            let mut details = details;
            details["result"] = json!(result);
            details["matched_count"] = json!(batch.matched);
            details["sale_price_lapses"] = json!(batch.sale_price_lapses);
            record_activity(
                pool,
                actor_id,
                action,
                audit::mutation_detail(batch.affected, batch.matched, batch.sale_price_lapses),
                details,
            )
            .await;

            Ok(MutationOutcome::Applied {
                result,
                matched_count: batch.matched,
                sale_price_lapses: batch.sale_price_lapses,
            })
        }
        Err(e) => {
            tracing::error!(user_id = actor_id, action, error = %e, "Bulk mutation failed");
            record_activity(pool, actor_id, action, audit::failure_detail(&e), details).await;
            Err(e)
        }
    }
}

/// Counters from one committed batch.
struct BatchCounts {
    matched: u64,
    affected: u64,
    sale_price_lapses: u64,
}

async fn run_batch(
    pool: &DbPool,
    criteria: &FilterCriteria,
    descriptor: &MutationDescriptor,
) -> Result<BatchCounts, EngineError> {
    let mut tx = pool.begin().await?;

    let rows = ProductRepo::lock_matching(&mut *tx, criteria).await?;
    let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();

    let mut sale_price_lapses = 0;
    let affected = match descriptor {
        MutationDescriptor::SetStatus { status } => {
            ProductRepo::set_status(&mut *tx, &ids, *status).await?
        }
        MutationDescriptor::SetFields(update) => {
            ProductRepo::apply_field_update(&mut *tx, &ids, update).await?
        }
        MutationDescriptor::AdjustPricing {
            price_rule,
            sale_rule,
        } => {
            let (affected, lapses) =
                reprice(&mut *tx, &rows, *price_rule, *sale_rule).await?;
            sale_price_lapses = lapses;
            affected
        }
    };

    tx.commit().await?;

    Ok(BatchCounts {
        matched: rows.len() as u64,
        affected,
        sale_price_lapses,
    })
}

/// Recompute and write prices for each locked row. Returns rows affected and
/// the number of rows whose sale price is no longer below the price.
async fn reprice(
    conn: &mut PgConnection,
    rows: &[PriceRow],
    price_rule: PriceRule,
    sale_rule: Option<SaleRule>,
) -> Result<(u64, u64), EngineError> {
    let mut affected = 0;
    let mut lapses = 0;
    for row in rows {
        let adjusted = compute_adjustment(row.price, row.sale_price, price_rule, sale_rule)?;
        if adjusted.sale_price_lapsed() {
            lapses += 1;
        }
        affected += ProductRepo::set_prices(&mut *conn, row.id, adjusted.price, adjusted.sale_price)
            .await?;
    }
    Ok((affected, lapses))
}
