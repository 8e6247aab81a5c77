//! Quality standard and inspection rules.

use serde::Serialize;

use crate::error::CoreError;
use crate::validation::percentage;

pub const RESULT_PASS: &str = "pass";
pub const RESULT_FAIL: &str = "fail";

/// Validate a standard's measurement window.
///
/// `min_value < max_value` and the target must lie strictly inside it.
pub fn validate_value_range(
    min_value: f64,
    max_value: f64,
    target_value: f64,
) -> Result<(), CoreError> {
    if !(min_value.is_finite() && max_value.is_finite() && target_value.is_finite()) {
        return Err(CoreError::Validation(
            "Standard values must be finite numbers".into(),
        ));
    }
    if min_value >= max_value {
        return Err(CoreError::Validation(
            "Minimum value must be less than maximum value".into(),
        ));
    }
    if target_value <= min_value || target_value >= max_value {
        return Err(CoreError::Validation(
            "Target value must lie between minimum and maximum value".into(),
        ));
    }
    Ok(())
}

/// Validate an inspection result string.
pub fn validate_result(result: &str) -> Result<(), CoreError> {
    if result != RESULT_PASS && result != RESULT_FAIL {
        return Err(CoreError::Validation(format!(
            "Invalid inspection result '{result}'. Must be one of: pass, fail"
        )));
    }
    Ok(())
}

/// Aggregated inspection outcome counts and rates (rates in percent).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionSummary {
    pub total_inspections: i64,
    pub passed_count: i64,
    pub failed_count: i64,
    pub pass_rate: f64,
    pub fail_rate: f64,
}

impl InspectionSummary {
    pub fn from_counts(passed: i64, failed: i64) -> Self {
        let total = passed + failed;
        Self {
            total_inspections: total,
            passed_count: passed,
            failed_count: failed,
            pass_rate: percentage(passed, total),
            fail_rate: percentage(failed, total),
        }
    }
}
