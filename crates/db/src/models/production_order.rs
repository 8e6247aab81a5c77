//! Production order models, DTOs, and statistics rows.

use chrono::NaiveDate;
use mes_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::soft_delete::SoftDeletable;

/// A production order joined with its product and creator for display.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductionOrder {
    pub id: DbId,
    pub order_no: String,
    pub product_id: DbId,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub produced: i32,
    pub status: String,
    pub priority: i32,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub created_by: DbId,
    pub creator_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SoftDeletable for ProductionOrder {
    const TABLE: &'static str = "production_orders";
    const ENTITY: &'static str = "ProductionOrder";
}

/// DTO for creating a production order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductionOrder {
    pub product_id: DbId,
    pub quantity: i32,
    /// Unset or zero falls back to the default priority.
    pub priority: Option<i32>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

/// DTO for updating a production order. All fields are optional.
///
/// When `produced` is present the status is derived from it and `status` is
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductionOrder {
    pub quantity: Option<i32>,
    pub produced: Option<i32>,
    pub status: Option<String>,
    pub priority: Option<i32>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

/// Filter for order listing.
#[derive(Debug, Default)]
pub struct OrderFilter {
    pub status: Option<String>,
    /// Case-insensitive match against the order number.
    pub keyword: Option<String>,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Number of live orders in one status.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Activity for the current day.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TodayStats {
    /// Orders created today.
    pub total_orders: i64,
    /// Orders completed (last touched) today.
    pub completed_orders: i64,
    /// Produced quantity summed over orders touched today.
    pub total_produced: i64,
}

/// One day of the current month's production trend.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub produced: i64,
    pub completed: i64,
}

/// Aggregated production dashboard data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductionStatistics {
    pub status_stats: Vec<StatusCount>,
    pub today_stats: TodayStats,
    pub monthly_trend: Vec<TrendPoint>,
}
