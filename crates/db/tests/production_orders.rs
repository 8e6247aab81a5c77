//! Integration tests for the production order lifecycle.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_db::models::product::CreateProduct;
use mes_db::models::production_order::{
    CreateProductionOrder, OrderFilter, UpdateProductionOrder,
};
use mes_db::models::user::CreateUser;
use mes_db::repositories::{ProductRepo, ProductionOrderRepo, UserRepo};
use mes_db::DbError;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed(pool: &PgPool) -> (i64, i64) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: "planner".to_string(),
            email: "planner@example.com".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            real_name: "Planner".to_string(),
            phone: String::new(),
            role: "admin".to_string(),
        },
    )
    .await
    .unwrap();
    let product = ProductRepo::create(
        pool,
        &CreateProduct {
            code: "P-100".to_string(),
            name: "Gearbox".to_string(),
            description: None,
            unit: "pcs".to_string(),
            price: Some(120.0),
            is_active: None,
        },
    )
    .await
    .unwrap();
    (user.id, product.id)
}

fn new_order(product_id: i64, quantity: i32) -> CreateProductionOrder {
    CreateProductionOrder {
        product_id,
        quantity,
        priority: None,
        start_date: None,
        end_date: None,
    }
}

fn report_produced(produced: i32) -> UpdateProductionOrder {
    UpdateProductionOrder {
        produced: Some(produced),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_assigns_pending_and_defaults(pool: PgPool) {
    let (user_id, product_id) = seed(&pool).await;

    let order = ProductionOrderRepo::create(&pool, &new_order(product_id, 100), user_id)
        .await
        .unwrap();

    let today = Utc::now().date_naive().format("%Y%m%d").to_string();
    assert_eq!(order.order_no, format!("PO{today}0001"));
    assert_eq!(order.status, "pending");
    assert_eq!(order.produced, 0);
    assert_eq!(order.priority, 3);
    assert_eq!(order.product_code, "P-100");
    assert_eq!(order.creator_name, "planner");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_numbers_are_sequential_and_distinct(pool: PgPool) {
    let (user_id, product_id) = seed(&pool).await;

    let creations = (0..5).map(|_| {
        let pool = pool.clone();
        async move {
            ProductionOrderRepo::create(&pool, &new_order(product_id, 10), user_id).await
        }
    });
    let mut numbers: Vec<String> = futures::future::join_all(creations)
        .await
        .into_iter()
        .map(|r| r.unwrap().order_no)
        .collect();
    numbers.sort();
    numbers.dedup();

    assert_eq!(numbers.len(), 5);
    assert!(numbers[0].ends_with("0001"));
    assert!(numbers[4].ends_with("0005"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_rejects_bad_input(pool: PgPool) {
    let (user_id, product_id) = seed(&pool).await;

    let zero = ProductionOrderRepo::create(&pool, &new_order(product_id, 0), user_id).await;
    assert_matches!(zero, Err(DbError::Core(CoreError::Validation(_))));

    let missing = ProductionOrderRepo::create(&pool, &new_order(424_242, 5), user_id).await;
    assert_matches!(
        missing,
        Err(DbError::Core(CoreError::NotFound { entity: "Product", .. }))
    );

    let mut backwards = new_order(product_id, 5);
    let now = Utc::now();
    backwards.start_date = Some(now);
    backwards.end_date = Some(now - Duration::days(1));
    let result = ProductionOrderRepo::create(&pool, &backwards, user_id).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn progress_drives_status_to_completion(pool: PgPool) {
    let (user_id, product_id) = seed(&pool).await;
    let order = ProductionOrderRepo::create(&pool, &new_order(product_id, 100), user_id)
        .await
        .unwrap();

    let partial = ProductionOrderRepo::update(&pool, order.id, &report_produced(40))
        .await
        .unwrap();
    assert_eq!(partial.status, "processing");
    assert_eq!(partial.produced, 40);

    let over = ProductionOrderRepo::update(&pool, order.id, &report_produced(101)).await;
    assert_matches!(
        over,
        Err(DbError::Core(CoreError::OverProduction {
            produced: 101,
            quantity: 100
        }))
    );

    let done = ProductionOrderRepo::update(&pool, order.id, &report_produced(100))
        .await
        .unwrap();
    assert_eq!(done.status, "completed");

    let locked = ProductionOrderRepo::update(&pool, order.id, &report_produced(10)).await;
    assert_matches!(locked, Err(DbError::Core(CoreError::OrderLocked { .. })));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn explicit_status_follows_transition_table(pool: PgPool) {
    let (user_id, product_id) = seed(&pool).await;
    let order = ProductionOrderRepo::create(&pool, &new_order(product_id, 10), user_id)
        .await
        .unwrap();

    let skip = UpdateProductionOrder {
        status: Some("completed".to_string()),
        ..Default::default()
    };
    let result = ProductionOrderRepo::update(&pool, order.id, &skip).await;
    assert_matches!(result, Err(DbError::Core(CoreError::InvalidTransition { .. })));

    let cancel = UpdateProductionOrder {
        status: Some("cancelled".to_string()),
        ..Default::default()
    };
    let cancelled = ProductionOrderRepo::update(&pool, order.id, &cancel).await.unwrap();
    assert_eq!(cancelled.status, "cancelled");

    let reopen = UpdateProductionOrder {
        status: Some("pending".to_string()),
        ..Default::default()
    };
    let result = ProductionOrderRepo::update(&pool, order.id, &reopen).await;
    assert_matches!(result, Err(DbError::Core(CoreError::OrderLocked { .. })));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn shrinking_quantity_below_produced_is_rejected(pool: PgPool) {
    let (user_id, product_id) = seed(&pool).await;
    let order = ProductionOrderRepo::create(&pool, &new_order(product_id, 50), user_id)
        .await
        .unwrap();
    ProductionOrderRepo::update(&pool, order.id, &report_produced(30))
        .await
        .unwrap();

    let shrink = UpdateProductionOrder {
        quantity: Some(20),
        ..Default::default()
    };
    let result = ProductionOrderRepo::update(&pool, order.id, &shrink).await;
    assert_matches!(result, Err(DbError::Core(CoreError::OverProduction { .. })));

    let stored = ProductionOrderRepo::find_by_id(&pool, order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.quantity, 50);
}

// ---------------------------------------------------------------------------
// Deletion and listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn processing_orders_cannot_be_deleted(pool: PgPool) {
    let (user_id, product_id) = seed(&pool).await;
    let order = ProductionOrderRepo::create(&pool, &new_order(product_id, 10), user_id)
        .await
        .unwrap();
    ProductionOrderRepo::update(&pool, order.id, &report_produced(3))
        .await
        .unwrap();

    let result = ProductionOrderRepo::delete(&pool, order.id).await;
    assert_matches!(result, Err(DbError::Core(CoreError::OrderInProgress { .. })));
    assert!(ProductionOrderRepo::find_by_id(&pool, order.id)
        .await
        .unwrap()
        .is_some());

    let pending = ProductionOrderRepo::create(&pool, &new_order(product_id, 10), user_id)
        .await
        .unwrap();
    ProductionOrderRepo::delete(&pool, pending.id).await.unwrap();
    assert!(ProductionOrderRepo::find_by_id(&pool, pending.id)
        .await
        .unwrap()
        .is_none());

    let again = ProductionOrderRepo::delete(&pool, pending.id).await;
    assert_matches!(again, Err(DbError::Core(CoreError::NotFound { .. })));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_status_and_orders_by_priority(pool: PgPool) {
    let (user_id, product_id) = seed(&pool).await;
    let mut urgent = new_order(product_id, 10);
    urgent.priority = Some(5);
    let low = ProductionOrderRepo::create(&pool, &new_order(product_id, 10), user_id)
        .await
        .unwrap();
    let high = ProductionOrderRepo::create(&pool, &urgent, user_id).await.unwrap();

    let all = ProductionOrderRepo::list(&pool, &OrderFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.iter().map(|o| o.id).collect::<Vec<_>>(), vec![high.id, low.id]);

    ProductionOrderRepo::update(&pool, low.id, &report_produced(1))
        .await
        .unwrap();
    let filter = OrderFilter {
        status: Some("processing".to_string()),
        keyword: None,
    };
    let processing = ProductionOrderRepo::list(&pool, &filter, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0].id, low.id);
    assert_eq!(ProductionOrderRepo::count(&pool, &filter).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn statistics_summarise_todays_work(pool: PgPool) {
    let (user_id, product_id) = seed(&pool).await;
    let first = ProductionOrderRepo::create(&pool, &new_order(product_id, 10), user_id)
        .await
        .unwrap();
    ProductionOrderRepo::create(&pool, &new_order(product_id, 10), user_id)
        .await
        .unwrap();
    ProductionOrderRepo::update(&pool, first.id, &report_produced(10))
        .await
        .unwrap();

    let stats = ProductionOrderRepo::statistics(&pool).await.unwrap();
    assert_eq!(stats.today_stats.total_orders, 2);
    assert_eq!(stats.today_stats.completed_orders, 1);
    assert_eq!(stats.today_stats.total_produced, 10);

    let completed = stats
        .status_stats
        .iter()
        .find(|s| s.status == "completed")
        .map(|s| s.count);
    assert_eq!(completed, Some(1));

    let produced: i64 = stats.monthly_trend.iter().map(|p| p.produced).sum();
    assert_eq!(produced, 10);
}
