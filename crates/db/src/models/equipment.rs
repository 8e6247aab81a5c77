//! Equipment and maintenance record models and DTOs.

use mes_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::soft_delete::SoftDeletable;

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// A row from the `equipment` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Equipment {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub equipment_type: String,
    pub model: String,
    pub manufacturer: String,
    pub location: String,
    pub status: String,
    pub purchase_date: Option<Timestamp>,
    pub warranty_date: Option<Timestamp>,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SoftDeletable for Equipment {
    const TABLE: &'static str = "equipment";
    const ENTITY: &'static str = "Equipment";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEquipment {
    pub code: String,
    pub name: String,
    pub equipment_type: String,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub purchase_date: Option<Timestamp>,
    pub warranty_date: Option<Timestamp>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEquipment {
    pub code: Option<String>,
    pub name: Option<String>,
    pub equipment_type: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub purchase_date: Option<Timestamp>,
    pub warranty_date: Option<Timestamp>,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub struct EquipmentFilter {
    pub equipment_type: Option<String>,
    pub status: Option<String>,
    /// Case-insensitive match against code, name, or location.
    pub keyword: Option<String>,
}

// ---------------------------------------------------------------------------
// Maintenance records
// ---------------------------------------------------------------------------

/// A maintenance record joined with its equipment and maintainer.
///
/// `duration_minutes` is not a column; it is filled from the time window after
/// the row is fetched.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaintenanceRecord {
    pub id: DbId,
    pub equipment_id: DbId,
    pub equipment_code: String,
    pub equipment_name: String,
    pub maintainer_id: DbId,
    pub maintainer_name: String,
    pub maintenance_type: String,
    pub description: String,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    #[sqlx(skip)]
    pub duration_minutes: Option<i64>,
    pub cost: f64,
    pub parts_replaced: String,
    pub result: String,
    pub next_maintenance: Option<Timestamp>,
    pub remark: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SoftDeletable for MaintenanceRecord {
    const TABLE: &'static str = "maintenance_records";
    const ENTITY: &'static str = "MaintenanceRecord";
}

impl MaintenanceRecord {
    /// Populate the derived duration from `start_time` / `end_time`.
    pub fn with_duration(mut self) -> Self {
        self.duration_minutes =
            mes_core::equipment::duration_minutes(self.start_time, self.end_time);
        self
    }
}

/// DTO for logging maintenance. `maintainer_id` defaults to the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMaintenanceRecord {
    pub equipment_id: DbId,
    pub maintainer_id: Option<DbId>,
    pub maintenance_type: String,
    pub description: String,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub cost: Option<f64>,
    pub parts_replaced: Option<String>,
    pub result: Option<String>,
    pub next_maintenance: Option<Timestamp>,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaintenanceRecord {
    pub equipment_id: Option<DbId>,
    pub maintainer_id: Option<DbId>,
    pub maintenance_type: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub cost: Option<f64>,
    pub parts_replaced: Option<String>,
    pub result: Option<String>,
    pub next_maintenance: Option<Timestamp>,
    pub remark: Option<String>,
}

#[derive(Debug, Default)]
pub struct MaintenanceFilter {
    pub equipment_id: Option<DbId>,
    pub maintainer_id: Option<DbId>,
    pub maintenance_type: Option<String>,
}
