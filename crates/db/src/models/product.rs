//! Product catalogue model and DTOs.

use mes_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::soft_delete::SoftDeletable;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub price: f64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SoftDeletable for Product {
    const TABLE: &'static str = "products";
    const ENTITY: &'static str = "Product";
}

/// DTO for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub price: Option<f64>,
    pub is_active: Option<bool>,
}

/// DTO for updating a product. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub is_active: Option<bool>,
}

/// Filter for product listing.
#[derive(Debug, Default)]
pub struct ProductFilter {
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
}
