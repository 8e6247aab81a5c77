//! Equipment and maintenance rules.

use chrono::Duration;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;
use crate::validation::percentage;

/// Accepted equipment statuses.
pub const EQUIPMENT_STATUSES: &[&str] = &["running", "stopped", "maintenance", "fault"];

/// Accepted maintenance types.
pub const MAINTENANCE_TYPES: &[&str] = &["preventive", "corrective", "emergency"];

/// Look-ahead window for upcoming maintenance when none is given.
pub const DEFAULT_UPCOMING_DAYS: i64 = 7;

/// Longest look-ahead window a caller may request.
pub const MAX_UPCOMING_DAYS: i64 = 365;

pub fn validate_equipment_status(status: &str) -> Result<(), CoreError> {
    if !EQUIPMENT_STATUSES.contains(&status) {
        return Err(CoreError::Validation(format!(
            "Invalid equipment status '{status}'. Must be one of: {}",
            EQUIPMENT_STATUSES.join(", ")
        )));
    }
    Ok(())
}

pub fn validate_maintenance_type(maintenance_type: &str) -> Result<(), CoreError> {
    if !MAINTENANCE_TYPES.contains(&maintenance_type) {
        return Err(CoreError::Validation(format!(
            "Invalid maintenance type '{maintenance_type}'. Must be one of: {}",
            MAINTENANCE_TYPES.join(", ")
        )));
    }
    Ok(())
}

/// A maintenance window must not end before it starts.
pub fn validate_maintenance_window(
    start_time: Timestamp,
    end_time: Option<Timestamp>,
) -> Result<(), CoreError> {
    if let Some(end) = end_time {
        if end < start_time {
            return Err(CoreError::Validation(
                "End time must not be before start time".into(),
            ));
        }
    }
    Ok(())
}

/// Duration of a finished maintenance window in whole minutes.
pub fn duration_minutes(start_time: Timestamp, end_time: Option<Timestamp>) -> Option<i64> {
    end_time.map(|end| (end - start_time).num_minutes())
}

/// Clamp the upcoming-maintenance look-ahead into `[1, MAX_UPCOMING_DAYS]`.
pub fn upcoming_window(days: Option<i64>) -> Duration {
    let days = match days {
        Some(d) if d > 0 => d.min(MAX_UPCOMING_DAYS),
        _ => DEFAULT_UPCOMING_DAYS,
    };
    Duration::days(days)
}

/// Equipment counts per status with rates in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentSummary {
    pub total_equipment: i64,
    pub running_count: i64,
    pub stopped_count: i64,
    pub maintenance_count: i64,
    pub fault_count: i64,
    pub running_rate: f64,
    pub maintenance_rate: f64,
    pub fault_rate: f64,
}

impl EquipmentSummary {
    /// Build from `(status, count)` pairs. Unknown statuses still count toward the total.
    pub fn from_status_counts<'a, I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut summary = Self {
            total_equipment: 0,
            running_count: 0,
            stopped_count: 0,
            maintenance_count: 0,
            fault_count: 0,
            running_rate: 0.0,
            maintenance_rate: 0.0,
            fault_rate: 0.0,
        };
        for (status, count) in counts {
            summary.total_equipment += count;
            match status {
                "running" => summary.running_count += count,
                "stopped" => summary.stopped_count += count,
                "maintenance" => summary.maintenance_count += count,
                "fault" => summary.fault_count += count,
                _ => {}
            }
        }
        summary.running_rate = percentage(summary.running_count, summary.total_equipment);
        summary.maintenance_rate = percentage(summary.maintenance_count, summary.total_equipment);
        summary.fault_rate = percentage(summary.fault_count, summary.total_equipment);
        summary
    }
}
