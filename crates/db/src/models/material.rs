//! Material master data model and DTOs.

use mes_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::soft_delete::SoftDeletable;

/// A row from the `materials` table.
///
/// `current_stock` is owned by the ledger; nothing outside
/// `MaterialTransactionRepo::record` writes it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Material {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub material_type: String,
    pub unit: String,
    pub price: f64,
    pub min_stock: i32,
    pub max_stock: i32,
    pub current_stock: i32,
    pub description: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SoftDeletable for Material {
    const TABLE: &'static str = "materials";
    const ENTITY: &'static str = "Material";
}

/// DTO for creating a material. Stock always starts at zero.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMaterial {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub material_type: String,
    pub unit: String,
    pub price: Option<f64>,
    pub min_stock: i32,
    pub max_stock: i32,
    pub description: Option<String>,
}

/// DTO for updating a material's descriptive fields and thresholds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaterial {
    pub code: Option<String>,
    pub name: Option<String>,
    pub material_type: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Filter for material listing.
#[derive(Debug, Default)]
pub struct MaterialFilter {
    pub material_type: Option<String>,
    /// Case-insensitive match against code or name.
    pub keyword: Option<String>,
}
