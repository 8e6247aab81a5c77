//! HTTP-level tests for the production order lifecycle.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth, user_token};
use sqlx::PgPool;

async fn create_product(pool: &PgPool, token: &str, code: &str) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/products",
        serde_json::json!({ "code": code, "name": format!("Product {code}"), "unit": "pcs" }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn create_order(pool: &PgPool, token: &str, body: serde_json::Value) -> serde_json::Value {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/production/orders", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn update_order(
    pool: &PgPool,
    token: &str,
    id: i64,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(app, &format!("/api/v1/production/orders/{id}"), body, token).await;
    let status = response.status();
    (status, body_json(response).await)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_progress_drives_status_until_locked(pool: PgPool) {
    let (user, token) = user_token(&pool, "planner").await;
    let product_id = create_product(&pool, &token, "P-100").await;

    let order = create_order(
        &pool,
        &token,
        serde_json::json!({ "product_id": product_id, "quantity": 100 }),
    )
    .await;
    let id = order["id"].as_i64().unwrap();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["produced"], 0);
    assert_eq!(order["priority"], 3);
    assert_eq!(order["created_by"], user.id);
    let expected_prefix = format!("PO{}", Utc::now().format("%Y%m%d"));
    assert_eq!(order["order_no"], format!("{expected_prefix}0001"));

    let (status, json) = update_order(&pool, &token, id, serde_json::json!({ "produced": 40 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "processing");

    let (status, json) = update_order(&pool, &token, id, serde_json::json!({ "produced": 100 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "completed");

    let (status, json) = update_order(&pool, &token, id, serde_json::json!({ "produced": 50 })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ORDER_LOCKED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_overproduction_and_invalid_transition(pool: PgPool) {
    let (_user, token) = user_token(&pool, "planner").await;
    let product_id = create_product(&pool, &token, "P-200").await;
    let order = create_order(
        &pool,
        &token,
        serde_json::json!({ "product_id": product_id, "quantity": 10 }),
    )
    .await;
    let id = order["id"].as_i64().unwrap();

    let (status, json) = update_order(&pool, &token, id, serde_json::json!({ "produced": 11 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "OVER_PRODUCTION");

    let (status, json) =
        update_order(&pool, &token, id, serde_json::json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INVALID_TRANSITION");

    let (status, json) =
        update_order(&pool, &token, id, serde_json::json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "cancelled");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_processing_order_cannot_be_deleted(pool: PgPool) {
    let (_user, token) = user_token(&pool, "planner").await;
    let product_id = create_product(&pool, &token, "P-300").await;
    let order = create_order(
        &pool,
        &token,
        serde_json::json!({ "product_id": product_id, "quantity": 5 }),
    )
    .await;
    let id = order["id"].as_i64().unwrap();
    update_order(&pool, &token, id, serde_json::json!({ "status": "processing" })).await;

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/production/orders/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "ORDER_IN_PROGRESS");

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, &format!("/api/v1/production/orders/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "processing");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_rejects_bad_input(pool: PgPool) {
    let (_user, token) = user_token(&pool, "planner").await;
    let product_id = create_product(&pool, &token, "P-400").await;

    for body in [
        serde_json::json!({ "product_id": product_id, "quantity": 0 }),
        serde_json::json!({ "product_id": product_id, "quantity": 5, "priority": 9 }),
        serde_json::json!({
            "product_id": product_id,
            "quantity": 5,
            "start_date": "2026-03-10T00:00:00Z",
            "end_date": "2026-03-01T00:00:00Z",
        }),
    ] {
        let app = common::build_test_app(pool.clone());
        let response = post_json_auth(app, "/api/v1/production/orders", body, &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/production/orders",
        serde_json::json!({ "product_id": 999_999, "quantity": 5 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_product_with_orders_cannot_be_deleted(pool: PgPool) {
    let (_user, token) = user_token(&pool, "planner").await;
    let product_id = create_product(&pool, &token, "P-500").await;
    create_order(
        &pool,
        &token,
        serde_json::json!({ "product_id": product_id, "quantity": 5 }),
    )
    .await;

    let app = common::build_test_app(pool);
    let response = delete_auth(app, &format!("/api/v1/products/{product_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_and_statistics(pool: PgPool) {
    let (_user, token) = user_token(&pool, "planner").await;
    let product_id = create_product(&pool, &token, "P-600").await;
    let low = create_order(
        &pool,
        &token,
        serde_json::json!({ "product_id": product_id, "quantity": 5, "priority": 1 }),
    )
    .await;
    let high = create_order(
        &pool,
        &token,
        serde_json::json!({ "product_id": product_id, "quantity": 5, "priority": 5 }),
    )
    .await;
    update_order(
        &pool,
        &token,
        low["id"].as_i64().unwrap(),
        serde_json::json!({ "produced": 2 }),
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/production/orders", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["data"][0]["id"], high["id"], "highest priority first");

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/production/orders?status=processing", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["id"], low["id"]);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/production/orders?status=bogus", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/production/statistics", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["today_stats"]["total_orders"], 2);
    assert!(json["data"]["status_stats"].is_array());
}
