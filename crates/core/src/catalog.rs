//! Rules for catalog master data (products and materials).

use crate::error::CoreError;
use crate::validation::{
    require_non_empty, validate_code, validate_max_len, validate_non_negative_amount,
};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_UNIT_LEN: usize = 20;

/// Validate the code, name, unit, and price shared by every catalog item.
pub fn validate_item_fields(
    code: &str,
    name: &str,
    unit: &str,
    price: f64,
) -> Result<(), CoreError> {
    validate_code("code", code)?;
    require_non_empty("name", name)?;
    validate_max_len("name", name, MAX_NAME_LEN)?;
    require_non_empty("unit", unit)?;
    validate_max_len("unit", unit, MAX_UNIT_LEN)?;
    validate_non_negative_amount("price", price)
}
