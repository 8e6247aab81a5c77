//! Integration tests for soft-delete and restore.
//!
//! Verifies that soft-deleted rows disappear from lookups and listings, that
//! deletion is idempotent, and that a deleted code can be reused.

use mes_core::pagination::PageRequest;
use mes_db::models::equipment::{CreateEquipment, Equipment};
use mes_db::models::material::{CreateMaterial, Material, MaterialFilter};
use mes_db::models::product::{CreateProduct, Product, ProductFilter};
use mes_db::repositories::{EquipmentRepo, MaterialRepo, ProductRepo};
use mes_db::soft_delete::{self, restore};
use sqlx::PgPool;

fn new_product(code: &str) -> CreateProduct {
    CreateProduct {
        code: code.to_string(),
        name: format!("Product {code}"),
        description: Some("soft delete test".to_string()),
        unit: "pcs".to_string(),
        price: None,
        is_active: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleted_product_is_hidden_and_restorable(pool: PgPool) {
    let product = ProductRepo::create(&pool, &new_product("SD-1")).await.unwrap();

    assert!(soft_delete::soft_delete::<Product, _>(&pool, product.id).await.unwrap());
    assert!(ProductRepo::find_by_id(&pool, product.id).await.unwrap().is_none());
    assert!(!soft_delete::exists::<Product, _>(&pool, product.id).await.unwrap());

    let listed = ProductRepo::list(&pool, &ProductFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert!(listed.iter().all(|p| p.id != product.id));
    assert_eq!(ProductRepo::count(&pool, &ProductFilter::default()).await.unwrap(), 0);

    assert!(
        !soft_delete::soft_delete::<Product, _>(&pool, product.id).await.unwrap(),
        "second delete is a no-op"
    );

    assert!(restore::<Product, _>(&pool, product.id).await.unwrap());
    assert!(ProductRepo::find_by_id(&pool, product.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleted_code_can_be_reused(pool: PgPool) {
    let first = ProductRepo::create(&pool, &new_product("REUSE")).await.unwrap();
    assert!(ProductRepo::code_exists(&pool, "REUSE", None).await.unwrap());
    assert!(!ProductRepo::code_exists(&pool, "REUSE", Some(first.id)).await.unwrap());

    soft_delete::soft_delete::<Product, _>(&pool, first.id).await.unwrap();
    assert!(!ProductRepo::code_exists(&pool, "REUSE", None).await.unwrap());

    let second = ProductRepo::create(&pool, &new_product("REUSE")).await.unwrap();
    assert_ne!(first.id, second.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_live_code_violates_unique_index(pool: PgPool) {
    ProductRepo::create(&pool, &new_product("DUP")).await.unwrap();
    let err = ProductRepo::create(&pool, &new_product("DUP")).await.unwrap_err();

    let constraint = err
        .as_database_error()
        .and_then(|e| e.constraint())
        .map(str::to_string);
    assert_eq!(constraint.as_deref(), Some("uq_products_code"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn soft_delete_applies_across_entities(pool: PgPool) {
    let material = MaterialRepo::create(
        &pool,
        &CreateMaterial {
            code: "MAT-SD".to_string(),
            name: "Steel".to_string(),
            material_type: "raw".to_string(),
            unit: "kg".to_string(),
            price: None,
            min_stock: 0,
            max_stock: 10,
            description: None,
        },
    )
    .await
    .unwrap();
    let equipment = EquipmentRepo::create(
        &pool,
        &CreateEquipment {
            code: "EQ-SD".to_string(),
            name: "Press".to_string(),
            equipment_type: "press".to_string(),
            model: None,
            manufacturer: None,
            location: None,
            status: "stopped".to_string(),
            purchase_date: None,
            warranty_date: None,
            description: None,
        },
    )
    .await
    .unwrap();

    assert!(soft_delete::soft_delete::<Material, _>(&pool, material.id).await.unwrap());
    assert!(soft_delete::soft_delete::<Equipment, _>(&pool, equipment.id).await.unwrap());

    assert!(MaterialRepo::find_by_id(&pool, material.id).await.unwrap().is_none());
    assert!(EquipmentRepo::find_by_id(&pool, equipment.id).await.unwrap().is_none());
    assert_eq!(
        MaterialRepo::count(&pool, &MaterialFilter::default()).await.unwrap(),
        0
    );
    assert!(MaterialRepo::list_types(&pool).await.unwrap().is_empty());
}
