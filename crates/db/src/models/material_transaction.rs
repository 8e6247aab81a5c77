//! Stock ledger entry model and DTOs.

use mes_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A ledger entry joined with its material and operator for display.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaterialTransaction {
    pub id: DbId,
    pub material_id: DbId,
    pub material_code: String,
    pub material_name: String,
    pub direction: String,
    pub quantity: i32,
    pub price: f64,
    pub total_amount: f64,
    pub supplier: Option<String>,
    pub production_order_id: Option<DbId>,
    pub remark: String,
    pub operator_id: DbId,
    pub operator_name: String,
    pub created_at: Timestamp,
}

/// Request to record a stock movement.
///
/// `direction` is validated against `in` / `out` when recorded. The operator
/// is the authenticated caller and is passed separately.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMaterialTransaction {
    pub material_id: DbId,
    pub direction: String,
    pub quantity: i32,
    #[serde(default)]
    pub price: f64,
    pub supplier: Option<String>,
    pub production_order_id: Option<DbId>,
    pub remark: Option<String>,
}

/// Filter for ledger listing.
#[derive(Debug, Default)]
pub struct TransactionFilter {
    pub material_id: Option<DbId>,
    pub direction: Option<String>,
}
