//! Field-level validation helpers shared by the entity rule modules.

use validator::Validate;

use crate::error::CoreError;

/// Run derived `validator` rules on a request body.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input.validate().map_err(CoreError::from)
}

/// Reject an empty or whitespace-only required string field.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Reject a string longer than `max` characters.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Reject a negative monetary amount.
pub fn validate_non_negative_amount(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

/// Validate a business code (material, product, equipment): required, at most 50 chars.
pub fn validate_code(field: &str, value: &str) -> Result<(), CoreError> {
    require_non_empty(field, value)?;
    validate_max_len(field, value, 50)
}

/// Convert a percentage ratio, returning 0 when the denominator is zero.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}
