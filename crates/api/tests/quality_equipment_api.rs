//! HTTP-level tests for quality standards, inspections, equipment and
//! maintenance records.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth, user_token};
use sqlx::PgPool;

async fn post_created(pool: &PgPool, token: &str, uri: &str, body: serde_json::Value) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, uri, body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED, "POST {uri}");
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Product, order and a 9.5..10.5 standard, returned as `(order_id, standard_id)`.
async fn quality_fixture(pool: &PgPool, token: &str) -> (i64, i64) {
    let product_id = post_created(
        pool,
        token,
        "/api/v1/products",
        serde_json::json!({ "code": "QP-1", "name": "Shaft", "unit": "pcs" }),
    )
    .await;
    let order_id = post_created(
        pool,
        token,
        "/api/v1/production/orders",
        serde_json::json!({ "product_id": product_id, "quantity": 10 }),
    )
    .await;
    let standard_id = post_created(
        pool,
        token,
        "/api/v1/quality/standards",
        serde_json::json!({
            "product_id": product_id,
            "name": "Diameter",
            "standard_type": "dimension",
            "min_value": 9.5,
            "max_value": 10.5,
            "target_value": 10.0,
            "unit": "mm",
        }),
    )
    .await;
    (order_id, standard_id)
}

// ---------------------------------------------------------------------------
// Quality
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_standard_range_and_name_rules(pool: PgPool) {
    let (_user, token) = user_token(&pool, "inspector").await;
    let (_order_id, standard_id) = quality_fixture(&pool, &token).await;

    // Target equal to a limit is outside the open range.
    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        &format!("/api/v1/quality/standards/{standard_id}"),
        serde_json::json!({ "target_value": 10.5 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(
        app,
        &format!("/api/v1/quality/standards/{standard_id}"),
        &token,
    )
    .await;
    let standard = body_json(response).await["data"].clone();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/quality/standards",
        serde_json::json!({
            "product_id": standard["product_id"],
            "name": "Diameter",
            "standard_type": "dimension",
            "min_value": 1.0,
            "max_value": 3.0,
            "target_value": 2.0,
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/quality/standards/types", &token).await;
    assert_eq!(body_json(response).await["data"], serde_json::json!(["dimension"]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inspections_and_pass_rate(pool: PgPool) {
    let (user, token) = user_token(&pool, "inspector").await;
    let (order_id, standard_id) = quality_fixture(&pool, &token).await;

    for (value, result) in [(10.0, "pass"), (10.1, "pass"), (9.9, "pass"), (11.0, "fail")] {
        post_created(
            &pool,
            &token,
            "/api/v1/quality/inspections",
            serde_json::json!({
                "production_order_id": order_id,
                "quality_standard_id": standard_id,
                "actual_value": value,
                "result": result,
            }),
        )
        .await;
    }

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/quality/inspections",
        serde_json::json!({
            "production_order_id": order_id,
            "quality_standard_id": standard_id,
            "actual_value": 10.0,
            "result": "maybe",
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/quality/inspections?result=fail", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["inspector_id"], user.id);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(
        app,
        &format!("/api/v1/quality/statistics?production_order_id={order_id}"),
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_inspections"], 4);
    assert_eq!(json["data"]["passed_count"], 3);
    assert_eq!(json["data"]["pass_rate"], 75.0);

    // Inspections now reference the standard.
    let app = common::build_test_app(pool);
    let response = delete_auth(
        app,
        &format!("/api/v1/quality/standards/{standard_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_statistics_have_zero_rates(pool: PgPool) {
    let (_user, token) = user_token(&pool, "inspector").await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/quality/statistics", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_inspections"], 0);
    assert_eq!(json["data"]["pass_rate"], 0.0);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/equipment/statistics", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_equipment"], 0);
    assert_eq!(json["data"]["running_rate"], 0.0);
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

async fn create_equipment(pool: &PgPool, token: &str, code: &str, status: &str) -> i64 {
    post_created(
        pool,
        token,
        "/api/v1/equipment",
        serde_json::json!({
            "code": code,
            "name": format!("Press {code}"),
            "equipment_type": "press",
            "location": "Hall A",
            "status": status,
        }),
    )
    .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_equipment_status_rules_and_summary(pool: PgPool) {
    let (_user, token) = user_token(&pool, "maintainer").await;
    create_equipment(&pool, &token, "EQ-1", "running").await;
    create_equipment(&pool, &token, "EQ-2", "running").await;
    create_equipment(&pool, &token, "EQ-3", "running").await;
    let faulty = create_equipment(&pool, &token, "EQ-4", "stopped").await;

    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        &format!("/api/v1/equipment/{faulty}"),
        serde_json::json!({ "status": "broken" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        &format!("/api/v1/equipment/{faulty}"),
        serde_json::json!({ "status": "fault" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["location"], "Hall A");

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/equipment/statistics", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_equipment"], 4);
    assert_eq!(json["data"]["running_count"], 3);
    assert_eq!(json["data"]["fault_count"], 1);
    assert_eq!(json["data"]["running_rate"], 75.0);

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/equipment",
        serde_json::json!({
            "code": "EQ-1", "name": "Clash", "equipment_type": "press", "status": "running",
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_maintenance_window_and_upcoming(pool: PgPool) {
    let (user, token) = user_token(&pool, "maintainer").await;
    let equipment_id = create_equipment(&pool, &token, "EQ-9", "maintenance").await;
    let start = Utc::now() - Duration::hours(3);

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/equipment/maintenance",
        serde_json::json!({
            "equipment_id": equipment_id,
            "maintenance_type": "preventive",
            "description": "Backwards window",
            "start_time": start,
            "end_time": start - Duration::minutes(1),
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let record_id = post_created(
        &pool,
        &token,
        "/api/v1/equipment/maintenance",
        serde_json::json!({
            "equipment_id": equipment_id,
            "maintenance_type": "preventive",
            "description": "Oil change",
            "start_time": start,
            "end_time": start + Duration::minutes(90),
            "cost": 120.0,
            "next_maintenance": Utc::now() + Duration::days(3),
        }),
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(
        app,
        &format!("/api/v1/equipment/maintenance/{record_id}"),
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["duration_minutes"], 90);
    assert_eq!(json["data"]["maintainer_id"], user.id);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/equipment/upcoming-maintenance", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/equipment/upcoming-maintenance?days=1", &token).await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let app = common::build_test_app(pool);
    let response = delete_auth(app, &format!("/api/v1/equipment/{equipment_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
