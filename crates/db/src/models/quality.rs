//! Quality standard and inspection models and DTOs.

use mes_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::soft_delete::SoftDeletable;

// ---------------------------------------------------------------------------
// Standards
// ---------------------------------------------------------------------------

/// A quality standard joined with its product.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QualityStandard {
    pub id: DbId,
    pub product_id: DbId,
    pub product_code: String,
    pub product_name: String,
    pub name: String,
    pub standard_type: String,
    pub min_value: f64,
    pub max_value: f64,
    pub target_value: f64,
    pub unit: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SoftDeletable for QualityStandard {
    const TABLE: &'static str = "quality_standards";
    const ENTITY: &'static str = "QualityStandard";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQualityStandard {
    pub product_id: DbId,
    pub name: String,
    pub standard_type: String,
    pub min_value: f64,
    pub max_value: f64,
    pub target_value: f64,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQualityStandard {
    pub product_id: Option<DbId>,
    pub name: Option<String>,
    pub standard_type: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default)]
pub struct StandardFilter {
    pub product_id: Option<DbId>,
    pub standard_type: Option<String>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Inspections
// ---------------------------------------------------------------------------

/// An inspection joined with its order, standard (including its limits), and inspector.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QualityInspection {
    pub id: DbId,
    pub production_order_id: DbId,
    pub production_order_no: String,
    pub quality_standard_id: DbId,
    pub quality_standard_name: String,
    pub inspector_id: DbId,
    pub inspector_name: String,
    pub actual_value: f64,
    pub target_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub unit: String,
    pub result: String,
    pub remark: String,
    pub inspected_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SoftDeletable for QualityInspection {
    const TABLE: &'static str = "quality_inspections";
    const ENTITY: &'static str = "QualityInspection";
}

/// DTO for recording an inspection. `inspector_id` defaults to the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQualityInspection {
    pub production_order_id: DbId,
    pub quality_standard_id: DbId,
    pub inspector_id: Option<DbId>,
    pub actual_value: f64,
    pub result: String,
    pub remark: Option<String>,
    pub inspected_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQualityInspection {
    pub production_order_id: Option<DbId>,
    pub quality_standard_id: Option<DbId>,
    pub inspector_id: Option<DbId>,
    pub actual_value: Option<f64>,
    pub result: Option<String>,
    pub remark: Option<String>,
    pub inspected_at: Option<Timestamp>,
}

#[derive(Debug, Default)]
pub struct InspectionFilter {
    pub production_order_id: Option<DbId>,
    pub quality_standard_id: Option<DbId>,
    pub inspector_id: Option<DbId>,
    pub result: Option<String>,
}

/// Scope for inspection statistics.
#[derive(Debug, Default)]
pub struct InspectionStatsFilter {
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub production_order_id: Option<DbId>,
    pub quality_standard_id: Option<DbId>,
}
