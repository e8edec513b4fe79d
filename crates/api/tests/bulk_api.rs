//! HTTP-level integration tests for bulk mutation and preview.

mod common;

use axum::http::StatusCode;
use common::{body_json, d, post_json, post_json_auth, product, seed, seed_lookup, token};
use serde_json::json;
use sqlx::PgPool;
use stockroom_db::models::lookup::LookupKind;
use stockroom_db::models::product::NewProduct;
use stockroom_db::repositories::{AuditLogRepo, ProductRepo};

const BULK: &str = "/api/v1/products/bulk";
const PREVIEW: &str = "/api/v1/products/bulk/preview";

#[sqlx::test(migrations = "../../db/migrations")]
async fn percentage_increase_touches_only_filtered_category(pool: PgPool) {
    let electronics = seed_lookup(&pool, LookupKind::Category, "Electronics").await;
    let garden = seed_lookup(&pool, LookupKind::Category, "Garden").await;
    let p1 = seed(
        &pool,
        NewProduct { category_id: Some(electronics), ..product("Radio", "100", 5) },
    )
    .await;
    let p2 = seed(
        &pool,
        NewProduct { category_id: Some(garden), ..product("Rake", "100", 5) },
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let body = json!({
        "filter": { "category_id": electronics },
        "mutation": {
            "kind": "adjust_pricing",
            "price_rule": { "type": "percentage_increase", "value": "10" }
        }
    });
    let response = post_json_auth(app, BULK, &token(1, "manager"), body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["outcome"], "applied");
    assert_eq!(json["data"]["matched_count"], 1);
    assert_eq!(json["data"]["result"]["success_count"], 1);

    let radio = ProductRepo::find_by_id(&pool, p1).await.unwrap().unwrap();
    let rake = ProductRepo::find_by_id(&pool, p2).await.unwrap().unwrap();
    assert_eq!(radio.price, d("110.00"));
    assert_eq!(rake.price, d("100"));

    let audit = AuditLogRepo::list_by_action(&pool, "bulk_price_update").await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].user_id, Some(1));
    assert_eq!(audit[0].detail_text, "Updated 1 of 1 matching products");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_change_respects_stock_and_status_filters(pool: PgPool) {
    let empty_active = seed(&pool, product("A", "5", 0)).await;
    let stocked_active = seed(&pool, product("B", "5", 20)).await;
    let empty_blocked = seed(
        &pool,
        NewProduct { status: "blocked".into(), ..product("C", "5", 0) },
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let body = json!({
        "filter": { "stock_condition": "out_of_stock", "status": "active" },
        "mutation": { "kind": "set_status", "status": "discontinued" }
    });
    let response = post_json_auth(app, BULK, &token(1, "admin"), body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let status = |id| {
        let pool = pool.clone();
        async move { ProductRepo::find_by_id(&pool, id).await.unwrap().unwrap().status }
    };
    assert_eq!(status(empty_active).await, "discontinued");
    assert_eq!(status(stocked_active).await, "active");
    assert_eq!(status(empty_blocked).await, "blocked");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn idempotent_status_change_reports_matched_count(pool: PgPool) {
    seed(&pool, product("A", "1", 1)).await;
    seed(&pool, product("B", "1", 1)).await;

    let app = common::build_test_app(pool);
    let body = json!({
        "filter": { "status": "active" },
        "mutation": { "kind": "set_status", "status": "active" }
    });
    let json = body_json(post_json_auth(app, BULK, &token(1, "admin"), body).await).await;
    assert_eq!(json["data"]["result"]["success_count"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sale_rule_applies_to_adjusted_price(pool: PgPool) {
    let id = seed(
        &pool,
        NewProduct { sale_price: Some(d("15")), ..product("Lamp", "20", 3) },
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let body = json!({
        "mutation": {
            "kind": "adjust_pricing",
            "price_rule": { "type": "fixed_decrease", "value": "30" },
            "sale_rule": { "type": "clear_sale" }
        }
    });
    let response = post_json_auth(app, BULK, &token(1, "admin"), body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let lamp = ProductRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(lamp.price, d("0"));
    assert_eq!(lamp.sale_price, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pricing_reports_sale_price_lapses(pool: PgPool) {
    seed(
        &pool,
        NewProduct { sale_price: Some(d("9")), ..product("Mug", "10", 3) },
    )
    .await;

    let app = common::build_test_app(pool);
    let body = json!({
        "mutation": {
            "kind": "adjust_pricing",
            "price_rule": { "type": "set_price", "value": "8" }
        }
    });
    let json = body_json(post_json_auth(app, BULK, &token(1, "admin"), body).await).await;
    assert_eq!(json["data"]["sale_price_lapses"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn field_update_sets_lookup_and_appends_description(pool: PgPool) {
    let brand = seed_lookup(&pool, LookupKind::Brand, "Acme").await;
    let id = seed(
        &pool,
        NewProduct { description: "Steel".into(), ..product("Hammer", "10", 1) },
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let body = json!({
        "mutation": {
            "kind": "set_fields",
            "brand_id": brand,
            "description_append": " (clearance)"
        }
    });
    let response = post_json_auth(app, BULK, &token(1, "manager"), body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let hammer = ProductRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(hammer.brand_id, Some(brand));
    assert_eq!(hammer.description, "Steel (clearance)");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_match_returns_no_matching_records_and_audits(pool: PgPool) {
    seed(&pool, product("A", "1", 5)).await;

    let app = common::build_test_app(pool.clone());
    let body = json!({
        "filter": { "price_min": "50", "price_max": "10" },
        "mutation": { "kind": "set_status", "status": "inactive" }
    });
    let json = body_json(post_json_auth(app, BULK, &token(1, "admin"), body).await).await;
    assert_eq!(json["data"]["outcome"], "no_matching_records");

    let audit = AuditLogRepo::list_by_action(&pool, "bulk_status_update").await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].detail_text, "No matching records");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_descriptor_is_rejected_before_any_write(pool: PgPool) {
    let id = seed(&pool, product("A", "1", 5)).await;

    let app = common::build_test_app(pool.clone());
    let body = json!({
        "mutation": {
            "kind": "set_fields",
            "description_append": "x",
            "description_replace": "y"
        }
    });
    let response = post_json_auth(app, BULK, &token(1, "admin"), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let unchanged = ProductRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(unchanged.description, "");
    assert!(AuditLogRepo::list_recent(&pool, 10).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn out_of_range_price_operand_is_a_validation_error(pool: PgPool) {
    let id = seed(&pool, product("A", "100", 5)).await;

    let app = common::build_test_app(pool.clone());
    let body = json!({
        "mutation": {
            "kind": "adjust_pricing",
            "price_rule": {
                "type": "percentage_increase",
                "value": "79228162514264337593543950335"
            }
        }
    });
    let response = post_json_auth(app, BULK, &token(1, "admin"), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("Percentage increase"));

    let unchanged = ProductRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(unchanged.price, d("100"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failing_row_rolls_back_the_whole_batch(pool: PgPool) {
    let radio = seed(&pool, product("Radio", "10", 5)).await;
    // 10% more than this no longer fits NUMERIC(12, 2).
    let vault = seed(&pool, product("Vault", "9999999999.00", 1)).await;

    let app = common::build_test_app(pool.clone());
    let body = json!({
        "mutation": {
            "kind": "adjust_pricing",
            "price_rule": { "type": "percentage_increase", "value": "10" }
        }
    });
    let response = post_json_auth(app, BULK, &token(1, "admin"), body).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], "INTERNAL_ERROR");

    let price = |id| {
        let pool = pool.clone();
        async move { ProductRepo::find_by_id(&pool, id).await.unwrap().unwrap().price }
    };
    assert_eq!(price(radio).await, d("10"));
    assert_eq!(price(vault).await, d("9999999999.00"));

    let audit = AuditLogRepo::list_by_action(&pool, "bulk_price_update").await.unwrap();
    assert_eq!(audit.len(), 1);
    assert!(audit[0].detail_text.starts_with("Failed: "), "{}", audit[0].detail_text);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn preview_counts_matching_rows(pool: PgPool) {
    seed(&pool, product("A", "5", 0)).await;
    seed(&pool, product("B", "5", 3)).await;
    seed(&pool, product("C", "5", 80)).await;

    let app = common::build_test_app(pool);
    let body = json!({ "filter": { "stock_condition": "low_stock" } });
    let response = post_json_auth(app, PREVIEW, &token(1, "manager"), body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["matching_count"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn staff_cannot_mutate(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = json!({ "mutation": { "kind": "set_status", "status": "active" } });
    let response = post_json_auth(app, BULK, &token(3, "staff"), body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = json!({ "mutation": { "kind": "set_status", "status": "active" } });
    let response = post_json(app, BULK, body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
